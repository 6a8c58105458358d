//! The mounted view.
//!
//! [`Orrery`] ties the pieces together for one host: it builds the scene
//! on mount, turns input events into target-year and camera changes,
//! advances and renders one frame per scheduler tick, and tears everything
//! down on unmount.
//!
//! A failure to acquire the surface never escapes: [`Orrery::mount`] hands
//! back a degraded instance that tells the shell it is unavailable and
//! renders nothing.

use crate::animation::{FrameReport, FrameScheduler, LoopState, SceneState};
use crate::config::OrreryConfig;
use crate::engine::epoch::clamp_year;
use crate::error::{OrreryError, OrreryResult};
use crate::input::{InputController, InputEvent, InputOutcome};
use crate::orbit::solver::torque_index;
use crate::render::{CommandRenderer, Renderer, Surface, View};
use crate::scene::builder::SceneBuilder;
use crate::scene::resources::ResourceCounts;
use crate::shell::{active_datasets, prediction_mode, Availability, Hud, PresentationShell};

/// Live part of a mounted view.
#[derive(Debug)]
struct Live {
    state: SceneState,
    renderer: CommandRenderer,
}

/// A view mounted on a surface, talking to a shell.
#[derive(Debug)]
pub struct Orrery<S: Surface, H: PresentationShell> {
    surface: S,
    shell: H,
    controller: InputController,
    scheduler: FrameScheduler,
    live: Option<Live>,
    availability: Availability,
    /// Shell year seen last; a change means the shell moved the year.
    shell_year: f64,
    warnings: usize,
    released: Option<ResourceCounts>,
}

impl<S: Surface, H: PresentationShell> Orrery<S, H> {
    /// Mount the view.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::Unavailable`] if the surface cannot be
    /// acquired, or the scene build error. The surface is released on
    /// failure.
    pub fn try_mount(config: OrreryConfig, mut surface: S, shell: H) -> OrreryResult<Self> {
        let span = tracing::info_span!("mount", seed = config.reproducibility.seed);
        let _guard = span.enter();

        let year = clamp_year(shell.year());
        match Self::start(&config, &mut surface, year) {
            Ok(live) => Ok(Self::assemble(&config, surface, shell, Some(live))),
            Err(e) => {
                surface.release();
                Err(e)
            }
        }
    }

    /// Mount the view, degrading instead of failing.
    ///
    /// The shell receives [`Availability::Unavailable`] and every later
    /// frame is skipped.
    #[must_use]
    pub fn mount(config: OrreryConfig, mut surface: S, shell: H) -> Self {
        let span = tracing::info_span!("mount", seed = config.reproducibility.seed);
        let _guard = span.enter();

        let year = clamp_year(shell.year());
        match Self::start(&config, &mut surface, year) {
            Ok(live) => Self::assemble(&config, surface, shell, Some(live)),
            Err(e) => {
                surface.release();
                let reason = match e {
                    OrreryError::Unavailable { reason } => reason,
                    other => other.to_string(),
                };
                tracing::warn!(%reason, "orrery unavailable");
                let mut orrery = Self::assemble(&config, surface, shell, None);
                orrery.availability = Availability::Unavailable { reason };
                orrery.scheduler.stop();
                orrery.shell.on_availability(orrery.availability.clone());
                orrery
            }
        }
    }

    fn start(config: &OrreryConfig, surface: &mut S, year: f64) -> OrreryResult<Live> {
        surface.acquire()?;
        let mut config = config.clone();
        config.time.initial_year = year;
        let scene = SceneBuilder::new(&config).build()?;
        let (width, height) = surface.size();
        tracing::info!(year, width, height, "orrery mounted");
        Ok(Live {
            state: SceneState::new(scene, &config, width, height),
            renderer: CommandRenderer::default(),
        })
    }

    fn assemble(config: &OrreryConfig, surface: S, mut shell: H, live: Option<Live>) -> Self {
        let year = clamp_year(shell.year());
        let mut scheduler = FrameScheduler::new();
        if live.is_some() {
            scheduler.start();
            shell.on_availability(Availability::Available);
        }
        Self {
            surface,
            shell,
            controller: InputController::new(&config.time, year),
            scheduler,
            live,
            availability: Availability::Available,
            shell_year: year,
            warnings: 0,
            released: None,
        }
    }

    // ===== Accessors =====

    #[must_use]
    pub const fn availability(&self) -> &Availability {
        &self.availability
    }

    #[must_use]
    pub const fn shell(&self) -> &H {
        &self.shell
    }

    /// Shell access for host-driven changes such as slider moves.
    pub fn shell_mut(&mut self) -> &mut H {
        &mut self.shell
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub const fn controller(&self) -> &InputController {
        &self.controller
    }

    /// Scene state, `None` when degraded or unmounted.
    #[must_use]
    pub fn state(&self) -> Option<&SceneState> {
        self.live.as_ref().map(|l| &l.state)
    }

    #[must_use]
    pub fn loop_state(&self) -> LoopState {
        self.scheduler.state()
    }

    /// A token that stops the frame loop from host code.
    #[must_use]
    pub fn cancel_token(&self) -> crate::animation::CancelToken {
        self.scheduler.token()
    }

    /// Resources released by unmount.
    #[must_use]
    pub const fn released(&self) -> Option<ResourceCounts> {
        self.released
    }

    // ===== Input =====

    /// Apply one input event. Takes effect on the next frame.
    ///
    /// Slider and marker events carry a year the host already holds: the
    /// host sets its own year first, then forwards the event. A shell that
    /// still holds a different year on the next frame wins.
    pub fn handle(&mut self, event: InputEvent) -> InputOutcome {
        let outcome = self.controller.handle(event);

        if let Some(target) = outcome.target {
            if outcome.report {
                self.shell.on_year_change(target);
            }
            self.shell_year = target;
            if let Some(epoch) = outcome.snap.as_ref().and_then(|s| s.epoch) {
                tracing::debug!(year = epoch.year, label = epoch.label, "epoch surfaced");
            }
        }
        if let Some(request) = outcome.section_request {
            self.shell.on_section_request(request);
        }
        if let Some((width, height)) = outcome.resize {
            self.resize(width, height);
        }

        if let Some(live) = self.live.as_mut() {
            let state = &mut live.state;
            if let Some(dy) = outcome.camera_zoom {
                state.zoom(dy);
            }
            if let Some((dx, dy)) = outcome.camera_orbit {
                let height = f64::from(self.surface.size().1);
                state.orbit(dx, dy, height);
            }
            let tuned = [
                outcome.z_scale.map(|v| state.set_z_scale(v)),
                outcome.trail_opacity.map(|v| state.set_trail_opacity(v)),
                outcome.toggle_trail.map(|p| state.toggle_trail(p).map(|_| ())),
            ];
            for result in tuned.into_iter().flatten() {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "live tuning rejected");
                }
            }
        }

        outcome
    }

    // ===== Frame loop =====

    /// Run one frame, `None` if the loop is stopped or the view is degraded.
    pub fn frame(&mut self, dt: f64) -> Option<FrameReport> {
        if self.live.is_none() || !self.scheduler.tick() {
            return None;
        }

        let year = self.shell.year();
        if (year - self.shell_year).abs() > f64::EPSILON {
            self.controller.sync_year(year);
            self.shell_year = year;
        }
        let target = self.controller.target_year();
        let (width, height) = self.surface.size();

        let live = self.live.as_mut()?;
        let report = live.state.advance(dt, target);
        self.warnings += report.warnings.len();

        let view = View {
            camera: live.state.camera(),
            target: live.state.controls().target,
            width,
            height,
        };
        let commands = live.renderer.render(live.state.scene(), &view);
        if let Err(e) = self.surface.present(&commands) {
            tracing::warn!(error = %e, frame = report.frame, "present failed");
            if e.is_fatal_to_view() {
                self.degrade(e.to_string());
            }
        }
        Some(report)
    }

    /// Change the output resolution. Only the camera aspect and the surface
    /// size change; the scene is untouched.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        if let Some(live) = self.live.as_mut() {
            live.state.resize(width, height);
        }
    }

    /// HUD snapshot.
    #[must_use]
    pub fn hud(&self) -> Hud {
        let year = self.controller.target_year();
        let render_year = self.live.as_ref().map_or(year, |l| l.state.render_year());
        let z_scale = self.live.as_ref().map_or(0.0, |l| l.state.z_scale());
        Hud {
            year,
            render_year,
            torque: torque_index(render_year),
            highlighted: self.controller.highlighted(),
            mode: self.controller.mode(),
            step_label: self.controller.step().label,
            z_scale,
            availability: self.availability.clone(),
            datasets: active_datasets(year),
            prediction: prediction_mode(year),
            warnings: self.warnings,
        }
    }

    /// Stop the loop and release everything. Idempotent.
    pub fn unmount(&mut self) -> Option<ResourceCounts> {
        let span = tracing::info_span!("unmount");
        let _guard = span.enter();

        self.scheduler.stop();
        if let Some(mut live) = self.live.take() {
            let counts = live.state.dispose();
            self.surface.release();
            tracing::info!(
                geometries = counts.geometries,
                materials = counts.materials,
                textures = counts.textures,
                "orrery unmounted"
            );
            self.released = Some(counts);
        } else {
            self.surface.release();
        }
        self.released
    }

    fn degrade(&mut self, reason: String) {
        self.scheduler.stop();
        if let Some(mut live) = self.live.take() {
            self.released = Some(live.state.dispose());
        }
        self.surface.release();
        self.availability = Availability::Unavailable { reason };
        self.shell.on_availability(self.availability.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessSurface, RenderCommand};
    use crate::shell::LocalShell;

    fn config() -> OrreryConfig {
        OrreryConfig::builder()
            .seed(3)
            .trail_steps(200)
            .spine_samples(60)
            .star_count(50)
            .texture_divisor(16)
            .build()
    }

    fn mounted(year: f64) -> Orrery<HeadlessSurface, LocalShell> {
        Orrery::mount(config(), HeadlessSurface::new(800, 600), LocalShell::new(year))
    }

    #[test]
    fn test_mount_reports_available() {
        let orrery = mounted(2024.0);
        assert!(orrery.availability().is_available());
        assert_eq!(orrery.shell().availability(), Some(&Availability::Available));
        assert_eq!(orrery.loop_state(), LoopState::Running);
    }

    #[test]
    fn test_frame_presents_commands() {
        let mut orrery = mounted(2024.0);
        let report = orrery.frame(1.0 / 60.0);
        assert!(report.is_some());
        assert_eq!(orrery.surface().frames(), 1);
        assert!(matches!(orrery.surface().last_frame().first(), Some(RenderCommand::Clear { .. })));
    }

    #[test]
    fn test_unavailable_surface_degrades() {
        let mut orrery = Orrery::mount(
            config(),
            HeadlessSurface::unavailable(800, 600, "no context"),
            LocalShell::new(2024.0),
        );
        assert!(!orrery.availability().is_available());
        assert!(orrery.shell().availability().is_some_and(|a| !a.is_available()));
        assert!(orrery.frame(0.016).is_none());
        assert!(orrery.state().is_none());
    }

    #[test]
    fn test_try_mount_propagates() {
        let result = Orrery::try_mount(
            config(),
            HeadlessSurface::unavailable(800, 600, "no context"),
            LocalShell::new(2024.0),
        );
        assert!(matches!(result, Err(OrreryError::Unavailable { .. })));
    }

    #[test]
    fn test_wheel_reports_to_shell() {
        let mut orrery = mounted(2024.0);
        orrery.handle(InputEvent::Wheel {
            delta_y: -1.0,
            modifier: true,
        });
        assert_eq!(orrery.shell().year_changes(), &[2023.0]);
        let report = orrery.frame(0.016);
        assert!(report.is_some_and(|r| (r.target_year - 2023.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_slider_not_echoed() {
        let mut orrery = mounted(2024.0);
        orrery.shell_mut().set_year(1900.0);
        orrery.handle(InputEvent::Slider(1900.0));
        let report = orrery.frame(0.016);
        assert!(orrery.shell().year_changes().is_empty());
        assert!(report.is_some_and(|r| (r.target_year - 1900.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_shell_year_wins_when_changed() {
        let mut orrery = mounted(2024.0);
        orrery.frame(0.016);
        orrery.shell_mut().set_year(1700.0);
        let report = orrery.frame(0.016);
        assert!(report.is_some_and(|r| (r.target_year - 1700.0).abs() < f64::EPSILON));
        assert!((orrery.controller().target_year() - 1700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marker_click_requests_section() {
        let mut orrery = mounted(2024.0);
        orrery.handle(InputEvent::MarkerClick(1934.0));
        let requests = orrery.shell().section_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].section, "event-1934");
        assert!(orrery.shell().year_changes().is_empty());
        assert!((orrery.controller().target_year() - 1934.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marker_click_follows_shell_year() {
        let mut orrery = mounted(2024.0);
        orrery.shell_mut().set_year(1859.0);
        orrery.handle(InputEvent::MarkerClick(1859.0));
        let report = orrery.frame(0.016);
        assert!(report.is_some_and(|r| (r.target_year - 1859.0).abs() < f64::EPSILON));

        // The host moves back to the year it held before the click.
        orrery.shell_mut().set_year(2024.0);
        let report = orrery.frame(0.016);
        assert!(report.is_some_and(|r| (r.target_year - 2024.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_marker_click_unknown_to_shell_yields() {
        let mut orrery = mounted(2024.0);
        orrery.frame(0.016);
        orrery.handle(InputEvent::MarkerClick(1934.0));
        let report = orrery.frame(0.016);
        assert!(report.is_some_and(|r| (r.target_year - 2024.0).abs() < f64::EPSILON));
        assert!((orrery.shell().year() - 2024.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hud_snapshot() {
        let mut orrery = mounted(2024.0);
        orrery.frame(0.016);
        let hud = orrery.hud();
        assert_eq!(hud.epoch_label(), "2024.00 CE");
        assert_eq!(hud.prediction.label, "Future Forecast");
        assert!(hud.datasets.len() == 3);
        assert_eq!(hud.step_label, "1 Year");
        assert!((hud.torque - torque_index(2024.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let mut orrery = mounted(2024.0);
        orrery.frame(0.016);
        let first = orrery.unmount();
        assert!(first.is_some_and(|c| c.total() > 0));
        assert!(orrery.surface().is_released());
        assert_eq!(orrery.loop_state(), LoopState::Stopped);
        assert!(orrery.frame(0.016).is_none());
        assert_eq!(orrery.unmount(), first);
    }

    #[test]
    fn test_cancel_token_stops_loop() {
        let mut orrery = mounted(2024.0);
        orrery.cancel_token().cancel();
        assert!(orrery.frame(0.016).is_none());
        assert_eq!(orrery.loop_state(), LoopState::Stopped);
    }
}
