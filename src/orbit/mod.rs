//! Orbit solving for the eight planets.
//!
//! Implements the ephemeris side of the orrery with:
//! - Immutable orbital elements per planet
//! - Newton–Raphson Kepler solve and flat ecliptic positions
//! - Barycentric wobble of the Sun and the torque index
//! - Notable epochs with two-window snapping
//! - A per-frame finite-value guard that degrades instead of halting
//! - Metamorphic relations for checking the solver without an oracle
//!
//! The model is a two-body approximation per planet. Inclination and the
//! ascending node are carried in the element table but never applied, so
//! every position lies in the ecliptic plane.
//!
//! # Example
//!
//! ```rust
//! use orrery::orbit::prelude::*;
//!
//! let earth = heliocentric_position(Planet::Earth, 2024.0);
//! assert!((earth.length() - 1.0).abs() < 0.02);
//!
//! let wobble = barycentric_offset(2024.0);
//! assert!(wobble.length() > 0.0);
//!
//! let t = torque_index(1859.0);
//! assert!((0.0..=1.0).contains(&t));
//! ```

pub mod elements;
pub mod epochs;
pub mod jidoka;
pub mod metamorphic;
pub mod solver;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::elements::{OrbitalElements, Planet, ELEMENTS};
    pub use super::epochs::{snap_year, NotableEpoch, SnapResult, NOTABLE_EPOCHS};
    pub use super::jidoka::{FrameGuard, GuardStatus, GuardViolation, JidokaResponse};
    pub use super::solver::{
        barycentric_offset, barycentric_offset_scaled, display_position, display_radius,
        heliocentric_position, moon_angle, solve_kepler, spin_angle, time_axis_z,
        torque_index, Projection, EXAGGERATION,
    };
}
