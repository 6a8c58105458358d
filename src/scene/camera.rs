//! Perspective camera and orbit controls.
//!
//! The controls keep the camera on a sphere around a look target:
//! - wheel input dollies the radius, clamped to `[min, max]` distance
//! - drag input rotates azimuth and polar angle, with inertial damping
//! - panning is disabled; the target only moves when the scene rides the Sun

use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::config::CameraConfig;

/// Per-notch dolly factor.
const ZOOM_STEP: f64 = 0.95;
/// Keeps the camera off the poles of its orbit sphere.
const POLAR_EPSILON: f64 = 1e-6;

/// Pinhole camera with a symmetric frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub fov_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub position: DVec3,
    pub up: DVec3,
}

impl PerspectiveCamera {
    /// Camera from configuration and a viewport size.
    #[must_use]
    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        Self {
            fov_deg: config.fov_deg,
            aspect: aspect_ratio(width, height),
            near: config.near,
            far: config.far,
            position: DVec3::ZERO,
            up: DVec3::Y,
        }
    }

    /// Update the aspect ratio for a new viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// OpenGL-convention projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    /// View matrix looking at `target`.
    #[must_use]
    pub fn view_matrix(&self, target: DVec3) -> DMat4 {
        DMat4::look_at_rh(self.position, target, self.up)
    }

    /// Project a scene point to normalised device coordinates.
    ///
    /// Returns `None` for points behind the camera or outside the depth
    /// range.
    #[must_use]
    pub fn project(&self, target: DVec3, point: DVec3) -> Option<DVec3> {
        let clip = self.projection_matrix() * self.view_matrix(target) * DVec4::from((point, 1.0));
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }
        Some(ndc)
    }

    /// Height in pixels of one scene unit at `distance` for a viewport of
    /// `viewport_height` pixels.
    #[must_use]
    pub fn pixels_per_unit(&self, distance: f64, viewport_height: f64) -> f64 {
        let half = (self.fov_deg.to_radians() / 2.0).tan() * distance.max(self.near);
        viewport_height / (2.0 * half)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f64 {
    f64::from(width.max(1)) / f64::from(height.max(1))
}

/// Spherical coordinates about the `y` axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f64,
    /// Polar angle from `+y`.
    phi: f64,
    /// Azimuth about `+y`, measured from `+z`.
    theta: f64,
}

impl Spherical {
    fn from_offset(v: DVec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> DVec3 {
        let s = self.phi.sin() * self.radius;
        DVec3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }
}

/// Orbit controls around a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitControls {
    pub target: DVec3,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Fraction of pending rotation applied per update.
    pub damping: f64,
    pub enable_pan: bool,
    pending_theta: f64,
    pending_phi: f64,
    pending_scale: f64,
}

impl OrbitControls {
    #[must_use]
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            target: DVec3::ZERO,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            damping: config.damping,
            enable_pan: false,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
        }
    }

    /// Queue a dolly for a wheel delta. Positive `delta_y` moves away.
    pub fn zoom(&mut self, delta_y: f64) {
        if delta_y > 0.0 {
            self.pending_scale /= ZOOM_STEP;
        } else if delta_y < 0.0 {
            self.pending_scale *= ZOOM_STEP;
        }
    }

    /// Queue a rotation for a drag of `(dx, dy)` pixels on a viewport of
    /// `viewport_height` pixels.
    pub fn rotate(&mut self, dx: f64, dy: f64, viewport_height: f64) {
        let h = viewport_height.max(1.0);
        self.pending_theta -= TAU * dx / h;
        self.pending_phi -= TAU * dy / h;
    }

    /// Move the target and camera together.
    pub fn translate(&mut self, camera: &mut PerspectiveCamera, delta: DVec3) {
        self.target += delta;
        camera.position += delta;
    }

    /// Place the camera at `target + offset`, looking at `target`.
    pub fn reset(&mut self, camera: &mut PerspectiveCamera, target: DVec3, offset: DVec3) {
        self.target = target;
        camera.position = target + offset;
        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
        self.pending_scale = 1.0;
    }

    /// Current camera distance from the target.
    #[must_use]
    pub fn distance(&self, camera: &PerspectiveCamera) -> f64 {
        camera.position.distance(self.target)
    }

    /// Apply pending input to the camera. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        spherical.theta = (spherical.theta + self.pending_theta * self.damping).rem_euclid(TAU);
        spherical.phi = (spherical.phi + self.pending_phi * self.damping).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + spherical.to_offset();

        let decay = 1.0 - self.damping;
        self.pending_theta *= decay;
        self.pending_phi *= decay;
        self.pending_scale = 1.0;

        before.distance_squared(camera.position) > 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (PerspectiveCamera, OrbitControls) {
        let config = CameraConfig::default();
        let mut camera = PerspectiveCamera::from_config(&config, 800, 600);
        let mut controls = OrbitControls::from_config(&config);
        controls.reset(&mut camera, DVec3::new(0.0, 0.0, 469.0), DVec3::new(60.0, 40.0, -100.0));
        (camera, controls)
    }

    #[test]
    fn test_aspect_from_viewport() {
        let (mut camera, _) = rig();
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-12);
        camera.set_viewport(1920, 0);
        assert!((camera.aspect - 1920.0).abs() < 1e-12);
    }

    #[test]
    fn test_spherical_roundtrip() {
        let v = DVec3::new(60.0, 40.0, -100.0);
        let back = Spherical::from_offset(v).to_offset();
        assert!((back - v).length() < 1e-9);
    }

    #[test]
    fn test_update_without_input_keeps_pose() {
        let (mut camera, mut controls) = rig();
        let before = camera.position;
        assert!(!controls.update(&mut camera));
        assert!((camera.position - before).length() < 1e-9);
    }

    #[test]
    fn test_zoom_out_and_in() {
        let (mut camera, mut controls) = rig();
        let d0 = controls.distance(&camera);
        controls.zoom(100.0);
        assert!(controls.update(&mut camera));
        let d1 = controls.distance(&camera);
        assert!((d1 - d0 / ZOOM_STEP).abs() < 1e-9);
        controls.zoom(-100.0);
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - d0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (mut camera, mut controls) = rig();
        for _ in 0..500 {
            controls.zoom(-1.0);
            controls.update(&mut camera);
        }
        assert!((controls.distance(&camera) - 20.0).abs() < 1e-9);
        for _ in 0..500 {
            controls.zoom(1.0);
            controls.update(&mut camera);
        }
        assert!((controls.distance(&camera) - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_is_damped() {
        let (mut camera, mut controls) = rig();
        let d = controls.distance(&camera);
        controls.rotate(100.0, 0.0, 600.0);
        let p0 = camera.position;
        controls.update(&mut camera);
        let step1 = camera.position.distance(p0);
        let p1 = camera.position;
        controls.update(&mut camera);
        let step2 = camera.position.distance(p1);
        assert!(step1 > 0.0);
        assert!(step2 < step1);
        // Rotation never changes the distance.
        assert!((controls.distance(&camera) - d).abs() < 1e-9);
    }

    #[test]
    fn test_translate_moves_both() {
        let (mut camera, mut controls) = rig();
        let offset = camera.position - controls.target;
        controls.translate(&mut camera, DVec3::new(0.5, -0.25, 6.0));
        assert!((camera.position - controls.target - offset).length() < 1e-12);
    }

    #[test]
    fn test_project_target_to_centre() {
        let (camera, controls) = rig();
        let ndc = camera.project(controls.target, controls.target);
        assert!(ndc.is_some_and(|p| p.x.abs() < 1e-9 && p.y.abs() < 1e-9));
        // Behind the camera.
        let behind = camera.position * 2.0 - controls.target;
        assert!(camera.project(controls.target, behind).is_none());
    }
}
