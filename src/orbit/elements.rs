//! Orbital elements of the eight planets.
//!
//! Mean elements at J2000 with a linear mean-motion term, plus the display
//! attributes the scene needs per body. Loaded once, never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight planets, in order from the Sun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Planet {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Planet {
    /// All planets in table order.
    pub const ALL: [Self; 8] = [
        Self::Mercury,
        Self::Venus,
        Self::Earth,
        Self::Mars,
        Self::Jupiter,
        Self::Saturn,
        Self::Uranus,
        Self::Neptune,
    ];

    /// Position in [`ELEMENTS`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Earth => "Earth",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
        }
    }

    /// Parse a display name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Orbital elements and display attributes.
    #[must_use]
    pub fn elements(self) -> &'static OrbitalElements {
        &ELEMENTS[self.index()]
    }

    /// Bodies drawn with a ring mesh instead of an equator line.
    #[must_use]
    pub const fn has_rings(self) -> bool {
        matches!(self, Self::Saturn)
    }

    /// Bodies carrying a moon sub-object.
    #[must_use]
    pub const fn has_moon(self) -> bool {
        matches!(self, Self::Earth)
    }

    /// Gas and ice giants share the banded surface recipe.
    #[must_use]
    pub const fn is_giant(self) -> bool {
        matches!(self, Self::Jupiter | Self::Saturn | Self::Uranus | Self::Neptune)
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-planet orbital elements and display attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitalElements {
    /// Semi-major axis (AU).
    pub semi_major_axis: f64,
    /// Eccentricity.
    pub eccentricity: f64,
    /// Inclination (deg). Not applied by the flat projection.
    pub inclination_deg: f64,
    /// Mean longitude at J2000 (deg).
    pub mean_longitude_deg: f64,
    /// Longitude of perihelion (deg).
    pub perihelion_deg: f64,
    /// Longitude of the ascending node (deg). Not applied by the flat projection.
    pub ascending_node_deg: f64,
    /// Mean motion (deg/day).
    pub mean_motion_deg_per_day: f64,
    /// Mass relative to the Sun.
    pub mass: f64,
    /// Display colour as `0xRRGGBB`.
    pub color: u32,
    /// Display radius of the body sphere (scene units).
    pub size: f64,
    /// Sidereal rotation period (hours). Negative means retrograde.
    pub rotation_period_hours: f64,
    /// Axial tilt (deg).
    pub axial_tilt_deg: f64,
}

impl OrbitalElements {
    /// Days for one full revolution of the mean longitude.
    #[must_use]
    pub fn orbital_period_days(&self) -> f64 {
        360.0 / self.mean_motion_deg_per_day
    }

    /// Orbital period in Julian years.
    #[must_use]
    pub fn orbital_period_years(&self) -> f64 {
        self.orbital_period_days() / crate::engine::epoch::DAYS_PER_YEAR
    }

    /// Whether the body spins against its orbital direction.
    #[must_use]
    pub fn is_retrograde(&self) -> bool {
        self.rotation_period_hours < 0.0
    }
}

/// Element table, indexed by [`Planet::index`].
pub static ELEMENTS: [OrbitalElements; 8] = [
    OrbitalElements {
        semi_major_axis: 0.387,
        eccentricity: 0.2056,
        inclination_deg: 7.00,
        mean_longitude_deg: 252.25,
        perihelion_deg: 77.46,
        ascending_node_deg: 48.33,
        mean_motion_deg_per_day: 4.0923,
        mass: 1.66e-7,
        color: 0x9c_a3af,
        size: 0.8,
        rotation_period_hours: 1407.6,
        axial_tilt_deg: 0.03,
    },
    OrbitalElements {
        semi_major_axis: 0.723,
        eccentricity: 0.0068,
        inclination_deg: 3.39,
        mean_longitude_deg: 181.98,
        perihelion_deg: 131.57,
        ascending_node_deg: 76.68,
        mean_motion_deg_per_day: 1.6021,
        mass: 2.45e-6,
        color: 0xd4_af37,
        size: 1.1,
        rotation_period_hours: -5832.5,
        axial_tilt_deg: 177.4,
    },
    OrbitalElements {
        semi_major_axis: 1.000,
        eccentricity: 0.0167,
        inclination_deg: 0.00,
        mean_longitude_deg: 100.46,
        perihelion_deg: 102.94,
        ascending_node_deg: 0.00,
        mean_motion_deg_per_day: 0.9856,
        mass: 3.00e-6,
        color: 0x3b_82f6,
        size: 1.2,
        rotation_period_hours: 23.9,
        axial_tilt_deg: 23.4,
    },
    OrbitalElements {
        semi_major_axis: 1.524,
        eccentricity: 0.0934,
        inclination_deg: 1.85,
        mean_longitude_deg: 355.45,
        perihelion_deg: 336.04,
        ascending_node_deg: 49.58,
        mean_motion_deg_per_day: 0.5240,
        mass: 3.21e-7,
        color: 0xef_4444,
        size: 0.9,
        rotation_period_hours: 24.6,
        axial_tilt_deg: 25.2,
    },
    OrbitalElements {
        semi_major_axis: 5.203,
        eccentricity: 0.0484,
        inclination_deg: 1.30,
        mean_longitude_deg: 34.40,
        perihelion_deg: 14.75,
        ascending_node_deg: 100.55,
        mean_motion_deg_per_day: 0.0831,
        mass: 9.54e-4,
        color: 0xd9_7706,
        size: 4.5,
        rotation_period_hours: 9.9,
        axial_tilt_deg: 3.1,
    },
    OrbitalElements {
        semi_major_axis: 9.537,
        eccentricity: 0.0542,
        inclination_deg: 2.49,
        mean_longitude_deg: 49.94,
        perihelion_deg: 92.43,
        ascending_node_deg: 113.72,
        mean_motion_deg_per_day: 0.0335,
        mass: 2.85e-4,
        color: 0xfc_d34d,
        size: 3.8,
        rotation_period_hours: 10.7,
        axial_tilt_deg: 26.7,
    },
    OrbitalElements {
        semi_major_axis: 19.19,
        eccentricity: 0.0472,
        inclination_deg: 0.77,
        mean_longitude_deg: 313.23,
        perihelion_deg: 170.96,
        ascending_node_deg: 74.23,
        mean_motion_deg_per_day: 0.0117,
        mass: 4.36e-5,
        color: 0x22_d3ee,
        size: 2.5,
        rotation_period_hours: -17.2,
        axial_tilt_deg: 97.8,
    },
    OrbitalElements {
        semi_major_axis: 30.07,
        eccentricity: 0.0086,
        inclination_deg: 1.77,
        mean_longitude_deg: 304.88,
        perihelion_deg: 44.97,
        ascending_node_deg: 131.72,
        mean_motion_deg_per_day: 0.0060,
        mass: 5.15e-5,
        color: 0x3b_82f6,
        size: 2.5,
        rotation_period_hours: 16.1,
        axial_tilt_deg: 28.3,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_enum() {
        for (i, planet) in Planet::ALL.iter().enumerate() {
            assert_eq!(planet.index(), i);
        }
        assert!(ELEMENTS
            .windows(2)
            .all(|w| w[0].semi_major_axis < w[1].semi_major_axis));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Planet::from_name("saturn"), Some(Planet::Saturn));
        assert_eq!(Planet::from_name(" Earth "), Some(Planet::Earth));
        assert_eq!(Planet::from_name("Pluto"), None);
    }

    #[test]
    fn test_special_bodies() {
        let ringed: Vec<Planet> = Planet::ALL.into_iter().filter(|p| p.has_rings()).collect();
        let mooned: Vec<Planet> = Planet::ALL.into_iter().filter(|p| p.has_moon()).collect();
        assert_eq!(ringed, vec![Planet::Saturn]);
        assert_eq!(mooned, vec![Planet::Earth]);
        assert_eq!(Planet::ALL.into_iter().filter(|p| p.is_giant()).count(), 4);
    }

    #[test]
    fn test_retrograde_rotators() {
        let retro: Vec<Planet> = Planet::ALL
            .into_iter()
            .filter(|p| p.elements().is_retrograde())
            .collect();
        assert_eq!(retro, vec![Planet::Venus, Planet::Uranus]);
    }

    #[test]
    fn test_earth_period_is_one_year() {
        let years = Planet::Earth.elements().orbital_period_years();
        assert!((years - 1.0).abs() < 0.001, "Earth period {years} years");
    }

    #[test]
    fn test_eccentricities_are_elliptic() {
        for p in Planet::ALL {
            let e = p.elements().eccentricity;
            assert!((0.0..1.0).contains(&e), "{p} eccentricity {e}");
        }
    }
}
