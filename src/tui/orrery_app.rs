//! Orrery TUI application state and logic.
//!
//! The view renders into a headless surface; the binary paints the last
//! frame's commands on a braille canvas. Everything here is terminal-free
//! so it can be tested.

use crossterm::event::KeyCode;

use crate::config::OrreryConfig;
use crate::input::{InputEvent, Mode, TIME_STEPS};
use crate::orbit::elements::Planet;
use crate::orrery::Orrery;
use crate::render::{HeadlessSurface, RenderCommand};
use crate::shell::{Hud, LocalShell, PresentationShell};

/// Logical resolution of the terminal view.
pub const VIEW_SIZE: (u32, u32) = (800, 600);
/// Frame time at the 30 Hz terminal tick.
const TICK_SECONDS: f64 = 1.0 / 30.0;
/// Pixels per arrow-key drag.
const DRAG_STEP: f64 = 20.0;
/// Time-axis stretch change per key press.
const Z_SCALE_STEP: f64 = 1.0;

/// Application state for the orrery TUI.
#[derive(Debug)]
pub struct OrreryApp {
    /// The mounted view.
    pub orrery: Orrery<HeadlessSurface, LocalShell>,
    /// Whether frames are paused.
    pub paused: bool,
    /// Frames run by this app.
    pub frame_count: u64,
    /// Planet whose trail the `t` key toggles.
    pub selected: Planet,
    should_quit: bool,
}

impl OrreryApp {
    /// App with the embedded configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(OrreryConfig::embedded())
    }

    /// App with an explicit configuration.
    #[must_use]
    pub fn from_config(config: OrreryConfig) -> Self {
        let shell = LocalShell::new(config.time.initial_year);
        let surface = HeadlessSurface::new(VIEW_SIZE.0, VIEW_SIZE.1);
        Self {
            orrery: Orrery::mount(config, surface, shell),
            paused: false,
            frame_count: 0,
            selected: Planet::Earth,
            should_quit: false,
        }
    }

    /// Run one frame unless paused.
    pub fn update(&mut self) {
        if self.paused {
            return;
        }
        if self.orrery.frame(TICK_SECONDS).is_some() {
            self.frame_count += 1;
        }
    }

    /// Handle a key press.
    ///
    /// | Key | Action |
    /// |-----|--------|
    /// | `q`, `Esc` | quit |
    /// | `Space` | pause |
    /// | `Tab` | toggle time/view mode |
    /// | `Up`/`Down` | one notch later/earlier in time mode, zoom in view mode |
    /// | `Left`/`Right` | orbit the camera |
    /// | `1`-`6` | step preset |
    /// | `[`/`]` | time-axis stretch |
    /// | `n`/`p` | next/previous notable epoch |
    /// | `t` | toggle the selected trail |
    /// | `Enter` | cycle the selected planet |
    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                self.orrery.unmount();
            }
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Tab => {
                let event = match self.orrery.controller().mode() {
                    Mode::View => InputEvent::ModifierDown,
                    Mode::Time => InputEvent::ModifierUp,
                };
                self.orrery.handle(event);
            }
            KeyCode::Up => self.wheel(1.0),
            KeyCode::Down => self.wheel(-1.0),
            KeyCode::Left => self.drag(-DRAG_STEP),
            KeyCode::Right => self.drag(DRAG_STEP),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                self.orrery.handle(InputEvent::SelectStep(index));
            }
            KeyCode::Char('[') => self.nudge_z_scale(-Z_SCALE_STEP),
            KeyCode::Char(']') => self.nudge_z_scale(Z_SCALE_STEP),
            KeyCode::Char('n') => self.jump_epoch(true),
            KeyCode::Char('p') => self.jump_epoch(false),
            KeyCode::Char('t') => {
                self.orrery.handle(InputEvent::ToggleTrail(self.selected));
            }
            KeyCode::Enter => {
                let next = (self.selected.index() + 1) % Planet::ALL.len();
                self.selected = Planet::ALL[next];
            }
            _ => {}
        }
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// HUD snapshot.
    #[must_use]
    pub fn hud(&self) -> Hud {
        self.orrery.hud()
    }

    /// Commands of the last presented frame.
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        self.orrery.surface().last_frame()
    }

    /// Label of the active step preset.
    #[must_use]
    pub fn step_label(&self) -> &'static str {
        TIME_STEPS[self.orrery.controller().step_index()].label
    }

    fn wheel(&mut self, delta_y: f64) {
        let modifier = self.orrery.controller().mode() == Mode::Time;
        // Wheel-up dollies in, so view-mode zoom takes the opposite sign.
        let delta_y = if modifier { delta_y } else { -delta_y };
        self.orrery.handle(InputEvent::Wheel { delta_y, modifier });
    }

    fn drag(&mut self, dx: f64) {
        self.orrery.handle(InputEvent::Drag { dx, dy: 0.0 });
    }

    fn nudge_z_scale(&mut self, delta: f64) {
        if let Some(current) = self.orrery.state().map(crate::animation::SceneState::z_scale) {
            self.orrery.handle(InputEvent::ZScale(current + delta));
        }
    }

    /// Jump to the neighbouring notable epoch, as a timeline click would.
    fn jump_epoch(&mut self, forward: bool) {
        let year = self.orrery.shell().year();
        let next = if forward {
            crate::orbit::epochs::NOTABLE_EPOCHS.iter().find(|e| e.year > year + 0.5)
        } else {
            crate::orbit::epochs::NOTABLE_EPOCHS.iter().rev().find(|e| e.year < year - 0.5)
        };
        if let Some(epoch) = next {
            self.orrery.shell_mut().set_year(epoch.year);
            self.orrery.handle(InputEvent::MarkerClick(epoch.year));
        }
    }
}

impl Default for OrreryApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> OrreryApp {
        OrreryApp::from_config(
            OrreryConfig::builder()
                .seed(5)
                .trail_steps(120)
                .spine_samples(40)
                .star_count(20)
                .texture_divisor(16)
                .build(),
        )
    }

    #[test]
    fn test_new_app() {
        let app = app();
        assert!(!app.paused);
        assert!(!app.should_quit());
        assert_eq!(app.frame_count, 0);
        assert_eq!(app.step_label(), "1 Year");
    }

    #[test]
    fn test_update_and_pause() {
        let mut app = app();
        app.update();
        app.update();
        assert_eq!(app.frame_count, 2);
        assert!(!app.commands().is_empty());

        app.handle_key(KeyCode::Char(' '));
        app.update();
        assert_eq!(app.frame_count, 2);
    }

    #[test]
    fn test_time_mode_arrows_step_years() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.orrery.controller().mode(), Mode::Time);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        assert!((app.hud().year - 2022.0).abs() < 1e-9);
        assert_eq!(app.orrery.shell().year_changes().len(), 2);

        app.handle_key(KeyCode::Tab);
        assert_eq!(app.orrery.controller().mode(), Mode::View);
        app.handle_key(KeyCode::Up);
        assert!((app.hud().year - 2022.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_selection() {
        let mut app = app();
        app.handle_key(KeyCode::Char('6'));
        assert_eq!(app.step_label(), "Solar Cycle");
        app.handle_key(KeyCode::Char('9'));
        assert_eq!(app.step_label(), "Solar Cycle");
    }

    #[test]
    fn test_epoch_jump_requests_section() {
        let mut app = app();
        app.handle_key(KeyCode::Char('p'));
        let requests = app.orrery.shell().section_requests();
        assert_eq!(requests.len(), 1);
        assert!(app.hud().year < 2024.0);
    }

    #[test]
    fn test_toggle_selected_trail() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.selected, Planet::Mars);
        app.handle_key(KeyCode::Char('t'));
        let visible = app.orrery.state().map(|s| s.trail_visible(Planet::Mars));
        assert_eq!(visible, Some(false));
    }

    #[test]
    fn test_quit_unmounts() {
        let mut app = app();
        app.update();
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit());
        assert!(app.orrery.state().is_none());
        assert!(app.orrery.surface().is_released());
    }
}
