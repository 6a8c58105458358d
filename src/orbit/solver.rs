//! Kepler solve, heliocentric positions and the Sun's barycentric wobble.
//!
//! All functions are pure and cheap enough to call for every body on every
//! frame, and tens of thousands of times while the trails are sampled.
//!
//! # Model
//!
//! For a body with elements `(a, e, L0, ϖ, n)` at year `y`:
//!
//! ```text
//! d = (y − 2000)·365.25
//! L = (L0 + n·d) mod 360
//! M = L − ϖ
//! E − e·sin E = M                      (Newton–Raphson)
//! x' = a(cos E − e),  y' = a·√(1−e²)·sin E
//! (x, y) = R(ϖ)·(x', y')
//! ```
//!
//! Inclination and the node are ignored: positions are flat.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::config::ProjectionConfig;
use crate::engine::epoch::{Epoch, MIN_YEAR};
use crate::orbit::elements::{Planet, ELEMENTS};

/// Iteration cap of the Kepler solve.
pub const KEPLER_MAX_ITERATIONS: usize = 20;
/// Convergence tolerance of the Kepler solve (radians).
pub const KEPLER_TOLERANCE: f64 = 1e-6;
/// Default amplification of the barycentric offset.
pub const EXAGGERATION: f64 = 200.0;
/// Default multiplier applied after radius compression.
pub const ORBIT_SCALE: f64 = 22.0;
/// Default exponent of the radius compression.
pub const DISTANCE_EXPONENT: f64 = 0.45;
/// Default scene units per year along the time axis.
pub const BASE_VISUAL_SCALE: f64 = 1.0;
/// Solar cycle period (years) in the torque index.
pub const SOLAR_CYCLE_YEARS: f64 = 11.07;
/// Jupiter–Saturn synodic period (years) in the torque index.
pub const SYNODIC_CYCLE_YEARS: f64 = 19.86;
/// Lunar orbital period used for the moon marker (years).
pub const MOON_PERIOD_YEARS: f64 = 0.0748;

/// Solve Kepler's equation `E − e·sin E = M` for the eccentric anomaly.
///
/// Starts from `E = M` and takes at most [`KEPLER_MAX_ITERATIONS`] Newton
/// steps. The loop ends after the first step taken from a residual within
/// [`KEPLER_TOLERANCE`]; at the cap the last iterate is returned as is.
#[must_use]
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut e_anom = mean_anomaly;
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let residual = e_anom - eccentricity * e_anom.sin() - mean_anomaly;
        e_anom -= residual / (1.0 - eccentricity * e_anom.cos());
        if residual.abs() <= KEPLER_TOLERANCE {
            break;
        }
    }
    e_anom
}

/// Heliocentric ecliptic position of a planet (AU).
#[must_use]
pub fn heliocentric_position(planet: Planet, year: f64) -> DVec2 {
    let el = planet.elements();
    let days = (year - crate::engine::epoch::J2000_YEAR) * crate::engine::epoch::DAYS_PER_YEAR;

    let mean_longitude = (el.mean_longitude_deg + el.mean_motion_deg_per_day * days).rem_euclid(360.0);
    let mean_anomaly = (mean_longitude - el.perihelion_deg).to_radians();
    let e_anom = solve_kepler(mean_anomaly, el.eccentricity);

    let e = el.eccentricity;
    let orbital = DVec2::new(
        el.semi_major_axis * (e_anom.cos() - e),
        el.semi_major_axis * (1.0 - e * e).sqrt() * e_anom.sin(),
    );

    DVec2::from_angle(el.perihelion_deg.to_radians()).rotate(orbital)
}

/// `Σ mass·position` over all planets, before negation and scaling.
#[must_use]
pub fn mass_weighted_sum(year: f64) -> DVec2 {
    Planet::ALL
        .into_iter()
        .map(|p| heliocentric_position(p, year) * ELEMENTS[p.index()].mass)
        .sum()
}

/// The Sun's displacement from the barycentre, scaled by [`EXAGGERATION`].
#[must_use]
pub fn barycentric_offset(year: f64) -> DVec2 {
    barycentric_offset_scaled(year, EXAGGERATION)
}

/// The Sun's displacement from the barycentre with an explicit
/// exaggeration factor.
#[must_use]
pub fn barycentric_offset_scaled(year: f64, exaggeration: f64) -> DVec2 {
    -mass_weighted_sum(year) * exaggeration
}

/// Heuristic resonance forcing in `[0, 1]`.
#[must_use]
pub fn torque_index(year: f64) -> f64 {
    let solar = (TAU * year / SOLAR_CYCLE_YEARS).sin();
    let synodic = (TAU * year / SYNODIC_CYCLE_YEARS).sin();
    ((solar + synodic) / 2.0 + 1.0) / 2.0
}

/// Compressed on-screen orbital radius: `|pos|^exponent · scale`.
#[must_use]
pub fn display_radius(position: DVec2, scale: f64, exponent: f64) -> f64 {
    position.length().powf(exponent) * scale
}

/// Display offset from the Sun: the heliocentric direction kept, the
/// radius compressed.
#[must_use]
pub fn display_position(position: DVec2, scale: f64, exponent: f64) -> DVec2 {
    let angle = position.y.atan2(position.x);
    DVec2::from_angle(angle) * display_radius(position, scale, exponent)
}

/// Scene depth of a year on the time axis.
#[must_use]
pub fn time_axis_z(year: f64, base_visual_scale: f64, z_scale: f64) -> f64 {
    (year - MIN_YEAR) * base_visual_scale * z_scale
}

/// Spin angle (radians) from hours elapsed since J2000.
///
/// A negative rotation period turns the body the other way.
#[must_use]
pub fn spin_angle(year: f64, rotation_period_hours: f64) -> f64 {
    Epoch::new(year).hours_since_j2000() / rotation_period_hours * TAU
}

/// Angle of the moon on its display orbit.
#[must_use]
pub fn moon_angle(year: f64) -> f64 {
    year / MOON_PERIOD_YEARS * TAU
}

/// The tunable display constants, bundled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Multiplier applied after radius compression.
    pub orbit_scale: f64,
    /// Exponent of the radius compression.
    pub distance_exponent: f64,
    /// Amplification of the barycentric offset.
    pub exaggeration: f64,
    /// Scene units per year before stretching.
    pub base_visual_scale: f64,
    /// Time-axis stretch.
    pub z_scale: f64,
}

impl Projection {
    /// Build from configuration.
    #[must_use]
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self {
            orbit_scale: config.orbit_scale,
            distance_exponent: config.distance_exponent,
            exaggeration: config.exaggeration,
            base_visual_scale: config.base_visual_scale,
            z_scale: config.z_scale,
        }
    }

    /// Barycentric offset of the Sun at an epoch.
    #[must_use]
    pub fn sun_offset(&self, epoch: Epoch) -> DVec2 {
        barycentric_offset_scaled(epoch.year(), self.exaggeration)
    }

    /// Compressed display radius of a heliocentric position.
    #[must_use]
    pub fn radius(&self, heliocentric: DVec2) -> f64 {
        display_radius(heliocentric, self.orbit_scale, self.distance_exponent)
    }

    /// Display offset of a heliocentric position from the Sun.
    #[must_use]
    pub fn offset(&self, heliocentric: DVec2) -> DVec2 {
        display_position(heliocentric, self.orbit_scale, self.distance_exponent)
    }

    /// Stretched scene depth of an epoch.
    #[must_use]
    pub fn z(&self, epoch: Epoch) -> f64 {
        time_axis_z(epoch.year(), self.base_visual_scale, self.z_scale)
    }

    /// Unstretched depth, for geometry living under the time-axis group.
    #[must_use]
    pub fn axis_z(&self, year: f64) -> f64 {
        time_axis_z(year, self.base_visual_scale, 1.0)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            orbit_scale: ORBIT_SCALE,
            distance_exponent: DISTANCE_EXPONENT,
            exaggeration: EXAGGERATION,
            base_visual_scale: BASE_VISUAL_SCALE,
            z_scale: 6.0,
        }
    }
}
