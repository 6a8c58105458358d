//! Input controller.
//!
//! Turns host gestures into either time navigation or camera commands.
//! Interaction has two modes with an explicit transition table:
//!
//! ```text
//!            Wheel{modifier} / ModifierDown
//!   View  ------------------------------------>  Time
//!         <------------------------------------
//!            Wheel{no modifier} / ModifierUp
//! ```
//!
//! Every other event leaves the mode alone. Only modified wheel notches
//! step the year; the slider and marker clicks set it directly. A target
//! produced by the wheel is reported back to the shell, one set by the
//! shell itself is not.

use serde::{Deserialize, Serialize};

use crate::config::TimeConfig;
use crate::engine::epoch::clamp_year;
use crate::orbit::elements::Planet;
use crate::orbit::epochs::{epoch_at, snap_year, NotableEpoch, SnapResult};
use crate::shell::{section_for_year, SectionRequest};

/// A wheel-notch size preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeStep {
    pub label: &'static str,
    pub short: &'static str,
    /// Years per notch.
    pub years: f64,
}

/// Step presets, smallest first.
pub static TIME_STEPS: [TimeStep; 6] = [
    TimeStep {
        label: "12 Hours",
        short: "12h",
        years: 0.001_369,
    },
    TimeStep {
        label: "24 Hours",
        short: "24h",
        years: 0.002_738,
    },
    TimeStep {
        label: "7 Days",
        short: "7d",
        years: 0.019_165,
    },
    TimeStep {
        label: "Lunar Cycle",
        short: "29.5d",
        years: 0.0808,
    },
    TimeStep {
        label: "1 Year",
        short: "1y",
        years: 1.0,
    },
    TimeStep {
        label: "Solar Cycle",
        short: "11y",
        years: 11.07,
    },
];

/// Index of the "1 Year" preset.
pub const DEFAULT_STEP_INDEX: usize = 4;

/// Interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Wheel steps the year.
    Time,
    /// Wheel and drag move the camera.
    #[default]
    View,
}

impl Mode {
    /// Mode after `event`.
    #[must_use]
    pub const fn on(self, event: &InputEvent) -> Self {
        match event {
            InputEvent::Wheel { modifier: true, .. } | InputEvent::ModifierDown => Self::Time,
            InputEvent::Wheel { modifier: false, .. } | InputEvent::ModifierUp => Self::View,
            _ => self,
        }
    }

    /// HUD indicator text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Time => "TIME",
            Self::View => "VIEW",
        }
    }
}

/// A host gesture or control change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Wheel notch; `modifier` is ctrl or meta held.
    Wheel { delta_y: f64, modifier: bool },
    /// Pointer drag in pixels.
    Drag { dx: f64, dy: f64 },
    ModifierDown,
    ModifierUp,
    /// Year slider moved. The shell already holds this year.
    Slider(f64),
    /// Timeline marker clicked. The shell already holds this year.
    MarkerClick(f64),
    /// Step preset chosen.
    SelectStep(usize),
    /// Time-axis stretch slider moved.
    ZScale(f64),
    /// Trail opacity slider moved.
    TrailOpacity(f64),
    ToggleTrail(Planet),
    Resize { width: u32, height: u32 },
}

/// What the engine should do for one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputOutcome {
    pub mode: Mode,
    /// New target year.
    pub target: Option<f64>,
    /// Whether the new target must be reported to the shell.
    pub report: bool,
    /// Snap decision of a wheel step.
    pub snap: Option<SnapResult>,
    /// Wheel delta to dolly the camera by.
    pub camera_zoom: Option<f64>,
    /// Drag to orbit the camera by.
    pub camera_orbit: Option<(f64, f64)>,
    pub section_request: Option<SectionRequest>,
    pub z_scale: Option<f64>,
    pub trail_opacity: Option<f64>,
    pub toggle_trail: Option<Planet>,
    pub resize: Option<(u32, u32)>,
}

/// Input state machine.
#[derive(Debug, Clone)]
pub struct InputController {
    mode: Mode,
    step_index: usize,
    target_year: f64,
    highlighted: Option<&'static NotableEpoch>,
    snap_window: f64,
    snap_exact: f64,
}

impl InputController {
    /// Controller starting at `year` with the configured step preset.
    #[must_use]
    pub fn new(time: &TimeConfig, year: f64) -> Self {
        Self {
            mode: Mode::View,
            step_index: time.default_step_index.min(TIME_STEPS.len() - 1),
            target_year: clamp_year(year),
            highlighted: None,
            snap_window: time.snap_window,
            snap_exact: time.snap_exact,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn target_year(&self) -> f64 {
        self.target_year
    }

    #[must_use]
    pub fn step(&self) -> &'static TimeStep {
        &TIME_STEPS[self.step_index]
    }

    #[must_use]
    pub const fn step_index(&self) -> usize {
        self.step_index
    }

    /// Epoch surfaced by the most recent wheel step.
    #[must_use]
    pub const fn highlighted(&self) -> Option<&'static NotableEpoch> {
        self.highlighted
    }

    /// Adopt a year set by the shell. Last write wins.
    pub fn sync_year(&mut self, year: f64) {
        self.target_year = clamp_year(year);
    }

    /// Apply one event.
    pub fn handle(&mut self, event: InputEvent) -> InputOutcome {
        self.mode = self.mode.on(&event);
        let mut outcome = InputOutcome {
            mode: self.mode,
            ..InputOutcome::default()
        };

        match event {
            InputEvent::Wheel { delta_y, modifier: true } => {
                let direction = sign(delta_y);
                let candidate = clamp_year(self.target_year + direction * self.step().years);
                let snap = snap_year(candidate, self.snap_window, self.snap_exact);
                self.highlighted = snap.epoch;
                self.target_year = snap.year;
                outcome.target = Some(snap.year);
                outcome.report = true;
                outcome.snap = Some(snap);
            }
            InputEvent::Wheel { delta_y, modifier: false } => {
                outcome.camera_zoom = Some(delta_y);
            }
            InputEvent::Drag { dx, dy } => {
                if self.mode == Mode::View {
                    outcome.camera_orbit = Some((dx, dy));
                }
            }
            InputEvent::ModifierDown | InputEvent::ModifierUp => {}
            InputEvent::Slider(year) => {
                self.target_year = clamp_year(year);
                outcome.target = Some(self.target_year);
            }
            InputEvent::MarkerClick(year) => {
                self.target_year = clamp_year(year);
                self.highlighted = epoch_at(self.target_year);
                outcome.target = Some(self.target_year);
                outcome.section_request = Some(section_for_year(self.target_year));
            }
            InputEvent::SelectStep(index) => {
                if index < TIME_STEPS.len() {
                    self.step_index = index;
                }
            }
            InputEvent::ZScale(value) => outcome.z_scale = Some(value),
            InputEvent::TrailOpacity(value) => outcome.trail_opacity = Some(value),
            InputEvent::ToggleTrail(planet) => outcome.toggle_trail = Some(planet),
            InputEvent::Resize { width, height } => outcome.resize = Some((width, height)),
        }

        outcome
    }
}

/// `Math.sign`-style sign; zero and NaN step nowhere.
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(year: f64) -> InputController {
        InputController::new(&TimeConfig::default(), year)
    }

    fn notch(delta_y: f64) -> InputEvent {
        InputEvent::Wheel { delta_y, modifier: true }
    }

    #[test]
    fn test_mode_transition_table() {
        let wheel_mod = notch(1.0);
        let wheel = InputEvent::Wheel {
            delta_y: 1.0,
            modifier: false,
        };
        for mode in [Mode::Time, Mode::View] {
            assert_eq!(mode.on(&wheel_mod), Mode::Time);
            assert_eq!(mode.on(&InputEvent::ModifierDown), Mode::Time);
            assert_eq!(mode.on(&wheel), Mode::View);
            assert_eq!(mode.on(&InputEvent::ModifierUp), Mode::View);
            assert_eq!(mode.on(&InputEvent::Slider(1900.0)), mode);
            assert_eq!(mode.on(&InputEvent::Drag { dx: 1.0, dy: 0.0 }), mode);
            assert_eq!(mode.on(&InputEvent::SelectStep(0)), mode);
        }
    }

    #[test]
    fn test_default_step_is_one_year() {
        let c = controller(2024.0);
        assert_eq!(c.step().label, "1 Year");
        assert_eq!(c.step_index(), DEFAULT_STEP_INDEX);
        assert_eq!(c.mode(), Mode::View);
    }

    #[test]
    fn test_five_notches_back() {
        let mut c = controller(2024.0);
        let mut last = InputOutcome::default();
        for _ in 0..5 {
            last = c.handle(notch(-100.0));
        }
        assert!((c.target_year() - 2019.0).abs() < 1e-9);
        assert_eq!(last.target, Some(c.target_year()));
        assert!(last.report);
        assert_eq!(last.mode, Mode::Time);
    }

    #[test]
    fn test_notch_magnitude_ignored() {
        let mut c = controller(2000.0);
        c.handle(notch(3.0));
        c.handle(notch(480.0));
        assert!((c.target_year() - 2002.0).abs() < 1e-9);
        c.handle(notch(0.0));
        assert!((c.target_year() - 2002.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_clamps_at_bounds() {
        let mut c = controller(2054.5);
        let out = c.handle(notch(1.0));
        assert_eq!(out.target, Some(2055.0));
        let mut c = controller(1555.3);
        c.handle(notch(-1.0));
        assert!((c.target_year() - 1555.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wheel_snaps_onto_epoch() {
        let mut c = controller(1858.03);
        let out = c.handle(notch(1.0));
        assert_eq!(out.target, Some(1859.0));
        let snap = out.snap.unwrap_or_else(|| unreachable!("wheel always snaps"));
        assert!(snap.snapped);
        assert_eq!(c.highlighted().map(|e| e.label), Some("Carrington Event"));
    }

    #[test]
    fn test_wheel_surfaces_metadata_without_snap() {
        let mut c = controller(1857.9);
        let out = c.handle(notch(1.0));
        assert!(out.target.is_some_and(|y| (y - 1858.9).abs() < 1e-9));
        assert!(out.snap.is_some_and(|s| !s.snapped && s.epoch.is_some()));
        assert!(c.highlighted().is_some());

        // Stepping away clears the highlight.
        c.handle(notch(-1.0));
        assert!(c.highlighted().is_none());
    }

    #[test]
    fn test_plain_wheel_zooms() {
        let mut c = controller(2024.0);
        let out = c.handle(InputEvent::Wheel {
            delta_y: -120.0,
            modifier: false,
        });
        assert_eq!(out.camera_zoom, Some(-120.0));
        assert!(out.target.is_none());
        assert_eq!(out.mode, Mode::View);
        assert!((c.target_year() - 2024.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_only_orbits_in_view_mode() {
        let mut c = controller(2024.0);
        assert_eq!(c.handle(InputEvent::Drag { dx: 4.0, dy: 2.0 }).camera_orbit, Some((4.0, 2.0)));
        c.handle(InputEvent::ModifierDown);
        assert!(c.handle(InputEvent::Drag { dx: 4.0, dy: 2.0 }).camera_orbit.is_none());
    }

    #[test]
    fn test_modifier_keys_only_toggle_mode() {
        let mut c = controller(2024.0);
        let down = c.handle(InputEvent::ModifierDown);
        assert_eq!(down.mode, Mode::Time);
        assert!(down.target.is_none());
        let up = c.handle(InputEvent::ModifierUp);
        assert_eq!(up.mode, Mode::View);
    }

    #[test]
    fn test_slider_clamps_and_is_not_reported() {
        let mut c = controller(2024.0);
        let out = c.handle(InputEvent::Slider(1000.0));
        assert_eq!(out.target, Some(1555.0));
        assert!(!out.report);
        assert!(out.snap.is_none());
        let out = c.handle(InputEvent::Slider(3000.0));
        assert_eq!(out.target, Some(2055.0));
    }

    #[test]
    fn test_marker_click_requests_section() {
        let mut c = controller(2024.0);
        let out = c.handle(InputEvent::MarkerClick(1934.0));
        assert_eq!(out.target, Some(1934.0));
        assert_eq!(out.section_request.map(|s| s.section), Some("event-1934"));
        assert_eq!(c.highlighted().map(|e| e.label), Some("Dust Bowl"));

        c.handle(InputEvent::MarkerClick(1950.0));
        assert!(c.highlighted().is_none());
    }

    #[test]
    fn test_select_step_ignores_out_of_range() {
        let mut c = controller(2024.0);
        c.handle(InputEvent::SelectStep(5));
        assert_eq!(c.step().short, "11y");
        c.handle(InputEvent::SelectStep(99));
        assert_eq!(c.step().short, "11y");
        c.handle(notch(-1.0));
        assert!((c.target_year() - (2024.0 - 11.07)).abs() < 1e-9);
    }

    #[test]
    fn test_controls_pass_through() {
        let mut c = controller(2024.0);
        assert_eq!(c.handle(InputEvent::ZScale(9.0)).z_scale, Some(9.0));
        assert_eq!(c.handle(InputEvent::TrailOpacity(0.4)).trail_opacity, Some(0.4));
        assert_eq!(
            c.handle(InputEvent::ToggleTrail(Planet::Venus)).toggle_trail,
            Some(Planet::Venus)
        );
        assert_eq!(
            c.handle(InputEvent::Resize {
                width: 1024,
                height: 768
            })
            .resize,
            Some((1024, 768))
        );
    }

    #[test]
    fn test_sync_year_is_last_write() {
        let mut c = controller(2024.0);
        c.sync_year(1700.0);
        c.sync_year(1800.0);
        c.handle(notch(1.0));
        assert!((c.target_year() - 1801.0).abs() < 1e-9);
    }
}
