//! Browser host.
//!
//! ```text
//! HTML: <script type="module">
//!   import init, { mountOrrery } from './pkg/orrery.js';
//!   await init();
//!   const view = mountOrrery('orrery-canvas', 2024, onYear, onAvailability, onSection);
//!   slider.oninput = (e) => view.set_year(+e.target.value);
//! </script>
//! ```
//!
//! The page stays the authority on the year. The host pushes slider moves
//! and timeline clicks in through [`OrreryView`]; the view calls back only
//! for wheel-driven year changes, availability and section requests.
//!
//! Callbacks run after the view is released, so they may call back into
//! it (`hud_json` from `onYear` is fine).
//!
//! Listeners go on the window (keys, resize) and on the canvas (wheel,
//! drag). [`OrreryView::unmount`] removes all of them, cancels the pending
//! animation frame and drops the `requestAnimationFrame` closure.

// WASM-bindgen exports don't need #[must_use] - values returned to JS
#![allow(clippy::must_use_candidate)]

pub mod canvas;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::animation::CancelToken;
use crate::config::OrreryConfig;
use crate::engine::epoch::clamp_year;
use crate::input::InputEvent;
use crate::orbit::elements::Planet;
use crate::orrery::Orrery;
use crate::shell::{Availability, PresentationShell, SectionRequest};

pub use canvas::CanvasSurface;

/// Message for the page, delivered once the view is no longer borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Notice {
    Year(f64),
    Availability(bool),
    Section(&'static str),
}

/// Page callbacks.
#[derive(Debug)]
struct Callbacks {
    on_year_change: Option<js_sys::Function>,
    on_availability: Option<js_sys::Function>,
    on_section_request: Option<js_sys::Function>,
}

impl Callbacks {
    fn deliver(&self, notice: Notice) {
        let (f, value) = match notice {
            Notice::Year(year) => (&self.on_year_change, JsValue::from_f64(year)),
            Notice::Availability(available) => (&self.on_availability, JsValue::from_bool(available)),
            Notice::Section(section) => (&self.on_section_request, JsValue::from_str(section)),
        };
        if let Some(f) = f {
            if let Err(e) = f.call1(&JsValue::NULL, &value) {
                tracing::warn!(error = ?e, "shell callback threw");
            }
        }
    }
}

/// Shell side of the page.
///
/// Outgoing calls are queued rather than made in place: a page callback
/// may call straight back into the view, which must not be borrowed then.
#[derive(Debug, Default)]
pub struct JsShell {
    year: f64,
    outbox: Vec<Notice>,
}

impl JsShell {
    fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.outbox)
    }
}

impl PresentationShell for JsShell {
    fn year(&self) -> f64 {
        self.year
    }

    fn on_year_change(&mut self, year: f64) {
        self.year = year;
        self.outbox.push(Notice::Year(year));
    }

    fn on_availability(&mut self, availability: Availability) {
        self.outbox.push(Notice::Availability(availability.is_available()));
    }

    fn on_section_request(&mut self, request: SectionRequest) {
        self.outbox.push(Notice::Section(request.section));
    }
}

/// Id of the animation frame still waiting to fire.
#[derive(Debug, Default)]
struct PendingFrame(Cell<Option<i32>>);

impl PendingFrame {
    fn scheduled(&self, id: Option<i32>) {
        self.0.set(id);
    }

    fn fired(&self) {
        self.0.set(None);
    }

    /// Id to hand to `cancelAnimationFrame`, at most once.
    fn cancel(&self) -> Option<i32> {
        self.0.take()
    }
}

type Shared = Rc<RefCell<Orrery<CanvasSurface, JsShell>>>;
type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Run `f` on the view, release it, then deliver what the shell queued.
///
/// A view already borrowed further up the stack drops the call.
fn dispatch<R>(
    orrery: &Shared,
    callbacks: &Callbacks,
    f: impl FnOnce(&mut Orrery<CanvasSurface, JsShell>) -> R,
) -> Option<R> {
    let (result, notices) = {
        let Ok(mut view) = orrery.try_borrow_mut() else {
            tracing::warn!("view busy, call dropped");
            return None;
        };
        let result = f(&mut view);
        (result, view.shell_mut().take_notices())
    };
    for notice in notices {
        callbacks.deliver(notice);
    }
    Some(result)
}

/// A registered event listener, kept so it can be removed.
struct Listener {
    target: web_sys::EventTarget,
    kind: &'static str,
    capture: bool,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn add(
        target: &web_sys::EventTarget,
        kind: &'static str,
        capture: bool,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
        let options = web_sys::AddEventListenerOptions::new();
        options.set_capture(capture);
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            kind,
            capture,
            closure,
        })
    }

    fn remove(self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.closure.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

/// Handle returned to the page.
#[wasm_bindgen]
pub struct OrreryView {
    orrery: Shared,
    callbacks: Rc<Callbacks>,
    listeners: Vec<Listener>,
    frame: FrameClosure,
    pending: Rc<PendingFrame>,
    token: CancelToken,
}

#[wasm_bindgen]
impl OrreryView {
    /// Move the year from the page (slider). Not echoed back.
    pub fn set_year(&self, year: f64) {
        dispatch(&self.orrery, &self.callbacks, |o| {
            o.shell_mut().year = clamp_year(year);
            o.handle(InputEvent::Slider(year));
        });
    }

    /// Jump to a timeline event and request its page section.
    pub fn marker_click(&self, year: f64) {
        dispatch(&self.orrery, &self.callbacks, |o| {
            o.shell_mut().year = clamp_year(year);
            o.handle(InputEvent::MarkerClick(year));
        });
    }

    /// Pick a wheel step preset by index.
    pub fn select_step(&self, index: usize) {
        self.send(InputEvent::SelectStep(index));
    }

    pub fn set_z_scale(&self, value: f64) {
        self.send(InputEvent::ZScale(value));
    }

    pub fn set_trail_opacity(&self, value: f64) {
        self.send(InputEvent::TrailOpacity(value));
    }

    /// Toggle a planet's trail by name. Returns `false` for unknown names.
    pub fn toggle_trail(&self, name: &str) -> bool {
        match Planet::ALL.into_iter().find(|p| p.name().eq_ignore_ascii_case(name)) {
            Some(planet) => {
                self.send(InputEvent::ToggleTrail(planet));
                true
            }
            None => false,
        }
    }

    /// HUD snapshot as JSON.
    pub fn hud_json(&self) -> String {
        self.orrery
            .try_borrow()
            .ok()
            .and_then(|o| serde_json::to_string(&o.hud()).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    /// Stop the loop, remove listeners and release the canvas. Idempotent.
    pub fn unmount(&mut self) {
        self.token.cancel();
        if let Some(id) = self.pending.cancel() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        for listener in self.listeners.drain(..) {
            listener.remove();
        }
        self.frame.borrow_mut().take();
        dispatch(&self.orrery, &self.callbacks, |o| {
            o.unmount();
        });
    }
}

impl OrreryView {
    fn send(&self, event: InputEvent) {
        dispatch(&self.orrery, &self.callbacks, |o| {
            o.handle(event);
        });
    }
}

fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    let window = web_sys::window()?;
    match window.request_animation_frame(f.as_ref().unchecked_ref()) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(error = ?e, "requestAnimationFrame failed");
            None
        }
    }
}

fn canvas_by_id(id: &str) -> Result<web_sys::HtmlCanvasElement, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .ok_or_else(|| JsValue::from_str(&format!("no element #{id}")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
}

fn fit_to_container(canvas: &web_sys::HtmlCanvasElement) -> (u32, u32) {
    if let Some(container) = canvas.parent_element() {
        canvas.set_width(container.client_width().max(1) as u32);
        canvas.set_height(container.client_height().max(1) as u32);
    }
    (canvas.width(), canvas.height())
}

/// Mount the view on a canvas and start its frame loop.
///
/// # Errors
///
/// Fails only if the canvas element is missing or a listener cannot be
/// registered. A missing 2D context is reported through
/// `on_availability(false)` instead.
#[wasm_bindgen(js_name = mountOrrery)]
pub fn mount_orrery(
    canvas_id: &str,
    year: f64,
    on_year_change: Option<js_sys::Function>,
    on_availability: Option<js_sys::Function>,
    on_section_request: Option<js_sys::Function>,
) -> Result<OrreryView, JsValue> {
    console_error_panic_hook::set_once();

    let canvas = canvas_by_id(canvas_id)?;
    fit_to_container(&canvas);
    let callbacks = Rc::new(Callbacks {
        on_year_change,
        on_availability,
        on_section_request,
    });
    let shell = JsShell {
        year: clamp_year(year),
        outbox: Vec::new(),
    };
    let orrery = Orrery::mount(OrreryConfig::embedded(), CanvasSurface::new(canvas.clone()), shell);
    let token = orrery.cancel_token();
    let orrery: Shared = Rc::new(RefCell::new(orrery));
    // Availability queued during mount.
    dispatch(&orrery, &callbacks, |_| ());
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let mut listeners = Vec::new();

    listeners.push(Listener::add(&canvas, "wheel", true, {
        let orrery = Rc::clone(&orrery);
        let callbacks = Rc::clone(&callbacks);
        move |e: web_sys::Event| {
            if let Some(wheel) = e.dyn_ref::<web_sys::WheelEvent>() {
                let modifier = wheel.ctrl_key() || wheel.meta_key();
                if modifier {
                    e.prevent_default();
                    e.stop_propagation();
                }
                let event = InputEvent::Wheel {
                    delta_y: wheel.delta_y(),
                    modifier,
                };
                dispatch(&orrery, &callbacks, |o| o.handle(event));
            }
        }
    })?);

    for (kind, down) in [("keydown", true), ("keyup", false)] {
        listeners.push(Listener::add(&window, kind, false, {
            let orrery = Rc::clone(&orrery);
            let callbacks = Rc::clone(&callbacks);
            move |e: web_sys::Event| {
                let is_modifier = e
                    .dyn_ref::<web_sys::KeyboardEvent>()
                    .is_some_and(|k| matches!(k.key().as_str(), "Control" | "Meta"));
                if is_modifier {
                    let event = if down { InputEvent::ModifierDown } else { InputEvent::ModifierUp };
                    dispatch(&orrery, &callbacks, |o| o.handle(event));
                }
            }
        })?);
    }

    listeners.push(Listener::add(&window, "resize", false, {
        let orrery = Rc::clone(&orrery);
        let callbacks = Rc::clone(&callbacks);
        let canvas = canvas.clone();
        move |_: web_sys::Event| {
            let (width, height) = fit_to_container(&canvas);
            dispatch(&orrery, &callbacks, |o| o.handle(InputEvent::Resize { width, height }));
        }
    })?);

    let last_pointer: Rc<Cell<Option<(f64, f64)>>> = Rc::new(Cell::new(None));
    listeners.push(Listener::add(&canvas, "mousedown", false, {
        let last = Rc::clone(&last_pointer);
        move |e: web_sys::Event| {
            if let Some(m) = e.dyn_ref::<web_sys::MouseEvent>() {
                last.set(Some((f64::from(m.client_x()), f64::from(m.client_y()))));
            }
        }
    })?);
    listeners.push(Listener::add(&window, "mousemove", false, {
        let last = Rc::clone(&last_pointer);
        let orrery = Rc::clone(&orrery);
        let callbacks = Rc::clone(&callbacks);
        move |e: web_sys::Event| {
            let (Some((x0, y0)), Some(m)) = (last.get(), e.dyn_ref::<web_sys::MouseEvent>()) else {
                return;
            };
            let (x, y) = (f64::from(m.client_x()), f64::from(m.client_y()));
            last.set(Some((x, y)));
            dispatch(&orrery, &callbacks, |o| o.handle(InputEvent::Drag { dx: x - x0, dy: y - y0 }));
        }
    })?);
    listeners.push(Listener::add(&window, "mouseup", false, {
        let last = Rc::clone(&last_pointer);
        move |_: web_sys::Event| last.set(None)
    })?);

    // Animation loop using requestAnimationFrame. The closure drops itself
    // once the loop stops; unmount also cancels the frame still pending.
    let frame: FrameClosure = Rc::new(RefCell::new(None));
    let pending = Rc::new(PendingFrame::default());
    {
        let f = Rc::clone(&frame);
        let pending = Rc::clone(&pending);
        let orrery = Rc::clone(&orrery);
        let callbacks = Rc::clone(&callbacks);
        let token = token.clone();
        let mut last_ms: Option<f64> = None;
        *frame.borrow_mut() = Some(Closure::new(move |now_ms: f64| {
            pending.fired();
            if token.is_cancelled() {
                f.borrow_mut().take();
                return;
            }
            let dt = last_ms.map_or(1.0 / 60.0, |t| ((now_ms - t) / 1000.0).max(0.0));
            last_ms = Some(now_ms);
            if let Some(None) = dispatch(&orrery, &callbacks, |o| o.frame(dt)) {
                f.borrow_mut().take();
                return;
            }
            if let Some(next) = f.borrow().as_ref() {
                pending.scheduled(request_animation_frame(next));
            }
        }));
    }
    if let Some(start) = frame.borrow().as_ref() {
        pending.scheduled(request_animation_frame(start));
    }

    Ok(OrreryView {
        orrery,
        callbacks,
        listeners,
        frame,
        pending,
        token,
    })
}
