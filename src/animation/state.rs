//! Per-frame scene state.
//!
//! [`SceneState`] owns the built scene, the camera rig and everything that
//! persists between frames (render year, frame counter, last Sun position).
//! [`SceneState::advance`] is the whole animation step; it never fails and
//! never panics. A body whose position cannot be computed keeps last
//! frame's transform, and the frame report says so.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::config::{OrreryConfig, MAX_Z_SCALE, MIN_Z_SCALE};
use crate::engine::epoch::{clamp_year, Epoch};
use crate::error::OrreryResult;
use crate::orbit::elements::Planet;
use crate::orbit::jidoka::FrameGuard;
use crate::orbit::solver::{heliocentric_position, moon_angle, spin_angle, torque_index};
use crate::scene::builder::{Scene, GLOW_BASE_SCALE, MOON_ORBIT_RADIUS, ORBIT_RING_RADIUS};
use crate::scene::camera::{OrbitControls, PerspectiveCamera};

/// Skybox rotation per frame (radians).
pub const BACKGROUND_SPIN: f64 = 0.00008;
/// Field shell rotation per frame (radians).
const FIELD_SPIN: f64 = 0.001;

/// What one frame did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Seconds since mount, summed from the host's frame deltas.
    pub elapsed: f64,
    pub target_year: f64,
    pub render_year: f64,
    pub torque: f64,
    /// Sun position in scene space.
    pub sun: DVec3,
    /// Render year has reached the target.
    pub settled: bool,
    /// Bodies that kept last frame's transform.
    pub held: Vec<String>,
    /// Guard warnings raised this frame.
    pub warnings: Vec<String>,
    /// Orbit controls moved the camera.
    pub camera_moved: bool,
}

impl FrameReport {
    /// Whether every body was updated.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.held.is_empty() && self.warnings.is_empty()
    }
}

/// Mutable animation state.
#[derive(Debug)]
pub struct SceneState {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    guard: FrameGuard,
    initial_offset: DVec3,
    easing_factor: f64,
    easing_epsilon: f64,
    render_year: f64,
    frame: u64,
    elapsed: f64,
    last_sun: Option<DVec3>,
    trail_opacity: f64,
}

impl SceneState {
    /// Wrap a built scene. The render year starts at the configured initial
    /// year, so the first frame does not ease in from anywhere.
    #[must_use]
    pub fn new(scene: Scene, config: &OrreryConfig, width: u32, height: u32) -> Self {
        let [ox, oy, oz] = config.camera.initial_offset;
        Self {
            guard: FrameGuard::new(scene.projection.exaggeration),
            scene,
            camera: PerspectiveCamera::from_config(&config.camera, width, height),
            controls: OrbitControls::from_config(&config.camera),
            initial_offset: DVec3::new(ox, oy, oz),
            easing_factor: config.time.easing_factor,
            easing_epsilon: config.time.easing_epsilon,
            render_year: clamp_year(config.time.initial_year),
            frame: 0,
            elapsed: 0.0,
            last_sun: None,
            trail_opacity: config.scene.trail_opacity,
        }
    }

    // ===== Accessors =====

    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub const fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    #[must_use]
    pub const fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Year currently drawn.
    #[must_use]
    pub const fn render_year(&self) -> f64 {
        self.render_year
    }

    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn z_scale(&self) -> f64 {
        self.scene.projection.z_scale
    }

    #[must_use]
    pub const fn trail_opacity(&self) -> f64 {
        self.trail_opacity
    }

    #[must_use]
    pub const fn guard(&self) -> &FrameGuard {
        &self.guard
    }

    // ===== Live tuning =====

    /// Queue a dolly of the orbit controls.
    pub fn zoom(&mut self, delta_y: f64) {
        self.controls.zoom(delta_y);
    }

    /// Queue a rotation of the orbit controls.
    pub fn orbit(&mut self, dx: f64, dy: f64, viewport_height: f64) {
        self.controls.rotate(dx, dy, viewport_height);
    }

    /// Set the time-axis stretch, clamped to the slider range.
    ///
    /// # Errors
    ///
    /// Fails only if the scene was disposed.
    pub fn set_z_scale(&mut self, z_scale: f64) -> OrreryResult<()> {
        let z_scale = if z_scale.is_finite() {
            z_scale.clamp(MIN_Z_SCALE, MAX_Z_SCALE)
        } else {
            self.scene.projection.z_scale
        };
        self.scene.projection.z_scale = z_scale;
        self.scene.graph.transform_mut(self.scene.handles.time_axis)?.scale.z = z_scale;
        Ok(())
    }

    /// Set the opacity of every trail.
    ///
    /// # Errors
    ///
    /// Fails only if the scene was disposed.
    pub fn set_trail_opacity(&mut self, opacity: f64) -> OrreryResult<()> {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            self.trail_opacity
        };
        self.trail_opacity = opacity;
        for nodes in &self.scene.handles.planets {
            self.scene.resources.material_mut(nodes.trail_material)?.opacity = opacity;
        }
        Ok(())
    }

    /// Show or hide one planet's trail.
    ///
    /// # Errors
    ///
    /// Fails only if the scene was disposed.
    pub fn set_trail_visible(&mut self, planet: Planet, visible: bool) -> OrreryResult<()> {
        if let Some(nodes) = self.scene.handles.planet(planet) {
            self.scene.graph.node_mut(nodes.trail)?.visible = visible;
        }
        Ok(())
    }

    /// Flip one planet's trail visibility. Returns the new state.
    ///
    /// # Errors
    ///
    /// Fails only if the scene was disposed.
    pub fn toggle_trail(&mut self, planet: Planet) -> OrreryResult<bool> {
        let visible = match self.scene.handles.planet(planet) {
            Some(nodes) => !self.scene.graph.node(nodes.trail)?.visible,
            None => return Ok(false),
        };
        self.set_trail_visible(planet, visible)?;
        Ok(visible)
    }

    /// Whether a planet's trail is shown.
    #[must_use]
    pub fn trail_visible(&self, planet: Planet) -> bool {
        self.scene
            .handles
            .planet(planet)
            .and_then(|nodes| self.scene.graph.node(nodes.trail).ok())
            .is_some_and(|n| n.visible)
    }

    /// Update the camera aspect for a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    /// Release the scene's resources. Further frames are no-ops.
    pub fn dispose(&mut self) -> crate::scene::resources::ResourceCounts {
        self.scene.dispose()
    }

    // ===== Frame step =====

    /// Advance one frame toward `target_year`.
    pub fn advance(&mut self, dt: f64, target_year: f64) -> FrameReport {
        self.frame += 1;
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        self.guard.begin_frame();
        let warnings_before = self.guard.status().warning_count;

        let target = clamp_year(target_year);
        let diff = target - self.render_year;
        if diff.abs() > self.easing_epsilon {
            self.render_year += diff * self.easing_factor;
        } else {
            self.render_year = target;
        }

        let torque = torque_index(self.render_year);
        let mut warnings = Vec::new();
        let (sun, camera_moved) = match self.apply(torque) {
            Ok(step) => step,
            Err(e) => {
                tracing::warn!(error = %e, frame = self.frame, "frame skipped");
                warnings.push(e.to_string());
                (self.last_sun.unwrap_or(DVec3::ZERO), false)
            }
        };

        let status = self.guard.status();
        if status.warning_count > warnings_before {
            warnings.extend(status.last_warning.clone());
        }

        FrameReport {
            frame: self.frame,
            elapsed: self.elapsed,
            target_year: target,
            render_year: self.render_year,
            torque,
            sun,
            settled: (self.render_year - target).abs() < f64::EPSILON,
            held: status.held.clone(),
            warnings,
            camera_moved,
        }
    }

    fn apply(&mut self, torque: f64) -> OrreryResult<(DVec3, bool)> {
        let epoch = Epoch::new(self.render_year);
        let projection = self.scene.projection;
        let frame = self.frame as f64;
        let z = projection.z(epoch);

        self.scene.graph.transform_mut(self.scene.handles.background)?.rotation.y += BACKGROUND_SPIN;

        let offset = projection.sun_offset(epoch);
        let sun = if self.guard.check_offset(offset).can_apply() {
            DVec3::new(offset.x, offset.y, z)
        } else {
            self.last_sun.unwrap_or(DVec3::new(0.0, 0.0, z))
        };

        self.animate_sun(sun, torque, frame)?;
        for i in 0..self.scene.handles.planets.len() {
            self.animate_planet(i, sun, z, torque, frame)?;
        }
        let moved = self.ride_camera(sun)?;
        Ok((sun, moved))
    }

    fn animate_sun(&mut self, sun: DVec3, torque: f64, frame: f64) -> OrreryResult<()> {
        let h = &self.scene.handles;
        let graph = &mut self.scene.graph;
        let resources = &mut self.scene.resources;

        graph.transform_mut(h.sun)?.position = sun;
        graph.transform_mut(h.sun_light)?.position = sun;

        let sun_material = resources.material_mut(h.sun_material)?;
        sun_material.set_uniform("time", frame * 0.05);
        sun_material.set_uniform("torque", torque);
        let corona = resources.material_mut(h.corona_material)?;
        corona.set_uniform("time", frame * 0.05);
        corona.set_uniform("torque", torque);
        let magnetic = resources.material_mut(h.magnetic_material)?;
        magnetic.set_uniform("time", frame * 0.02);
        magnetic.set_uniform("torque", torque);

        let glow_scale = GLOW_BASE_SCALE + torque * 20.0 + (frame * 0.05).sin() * 0.1;
        graph.transform_mut(h.glow)?.scale = DVec3::new(glow_scale, glow_scale, 1.0);
        let glow = resources.material_mut(h.glow_material)?;
        glow.opacity = 0.6 + torque * 0.3;
        glow.color = Color::from_hsl(0.05 + torque * 0.05, 1.0, 0.5);

        graph.transform_mut(h.plasma)?.position = sun;
        for (i, shell) in h.plasma_shells.iter().enumerate() {
            let t = graph.transform_mut(shell.node)?;
            t.rotation.y += shell.rot_speed;
            t.rotation.z += shell.rot_speed * 0.5;
            let s = shell.base_scale + (frame * shell.pulse_speed).sin() * 0.02 + torque * 0.05 * (i + 1) as f64;
            t.scale = DVec3::splat(s);
        }
        Ok(())
    }

    fn animate_planet(&mut self, index: usize, sun: DVec3, z: f64, torque: f64, frame: f64) -> OrreryResult<()> {
        let nodes = &self.scene.handles.planets[index];
        let planet = nodes.planet;
        let projection = self.scene.projection;

        let helio = heliocentric_position(planet, self.render_year);
        if !self.guard.check_position(planet.name(), helio).can_apply() {
            return Ok(());
        }
        let offset: DVec2 = projection.offset(helio);
        let radius = projection.radius(helio);

        let graph = &mut self.scene.graph;
        graph.transform_mut(nodes.group)?.position = DVec3::new(sun.x + offset.x, sun.y + offset.y, z);
        graph.transform_mut(nodes.body)?.rotation.y =
            spin_angle(self.render_year, planet.elements().rotation_period_hours);

        let time = frame * 0.015;
        for shell in &nodes.fields {
            let sine = (time * shell.freq + shell.phase as f64).sin();
            let t = graph.transform_mut(shell.node)?;
            t.scale = DVec3::splat(shell.base_scale + sine * 0.15 + torque * 0.02);
            t.rotation.z += if shell.phase % 2 == 0 { FIELD_SPIN } else { -FIELD_SPIN };
            t.rotation.y += FIELD_SPIN;
            self.scene.resources.material_mut(shell.material)?.opacity = (0.01 + sine * 0.005).max(0.005);
        }

        if let Some(moon) = nodes.moon {
            let a = moon_angle(self.render_year);
            graph.transform_mut(moon)?.position = DVec3::new(a.cos() * MOON_ORBIT_RADIUS, a.sin() * MOON_ORBIT_RADIUS, 0.0);
        }

        let ring = graph.transform_mut(nodes.orbit_ring)?;
        ring.position = DVec3::new(sun.x, sun.y, z);
        ring.scale = DVec3::new(radius / ORBIT_RING_RADIUS, radius / ORBIT_RING_RADIUS, 1.0);
        Ok(())
    }

    fn ride_camera(&mut self, sun: DVec3) -> OrreryResult<bool> {
        match self.last_sun {
            None => self.controls.reset(&mut self.camera, sun, self.initial_offset),
            Some(prev) => self.controls.translate(&mut self.camera, sun - prev),
        }
        self.last_sun = Some(sun);

        let eye = self.camera.position;
        for marker in &self.scene.handles.markers {
            self.scene.graph.look_at(marker.label, eye)?;
        }
        Ok(self.controls.update(&mut self.camera))
    }
}
