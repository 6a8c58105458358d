//! Data coverage and model-regime labels for the HUD.

use serde::Serialize;

use crate::color::Color;

/// An observational dataset and the years it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dataset {
    pub id: &'static str,
    pub name: &'static str,
    /// First covered year, inclusive.
    pub start: f64,
    /// Last covered year, inclusive.
    pub end: f64,
    pub color: Color,
    pub description: &'static str,
}

impl Dataset {
    #[must_use]
    pub fn covers(&self, year: f64) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

pub static DATASETS: [Dataset; 3] = [
    Dataset {
        id: "jpl",
        name: "NASA JPL Horizons",
        start: 1900.0,
        end: 2025.0,
        color: Color::from_hex(0x3b_82f6),
        description: "Planetary ephemeris",
    },
    Dataset {
        id: "era5",
        name: "ERA5 Reanalysis",
        start: 1950.0,
        end: 2025.0,
        color: Color::from_hex(0x22_c55e),
        description: "Atmospheric dynamics",
    },
    Dataset {
        id: "sdo",
        name: "SDO Archives",
        start: 2010.0,
        end: 2025.0,
        color: Color::from_hex(0xd4_af37),
        description: "Magnetograms",
    },
];

/// Datasets covering `year`, in table order.
#[must_use]
pub fn active_datasets(year: f64) -> Vec<&'static Dataset> {
    DATASETS.iter().filter(|d| d.covers(year)).collect()
}

/// Model regime shown for a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionMode {
    pub label: &'static str,
    pub description: &'static str,
}

const fn mode(label: &'static str, description: &'static str) -> PredictionMode {
    PredictionMode { label, description }
}

fn is_year(year: f64, exact: f64) -> bool {
    (year - exact).abs() < f64::EPSILON
}

/// Regime label for a year. Ranges are tested newest first; the point
/// years only match exactly.
#[must_use]
pub fn prediction_mode(year: f64) -> PredictionMode {
    if year >= 2020.0 {
        mode("Future Forecast", "Predictive mode active.")
    } else if year >= 2010.0 {
        mode("High-Fidelity Training", "Full multi-modal integration (SDO + gravity).")
    } else if year >= 1950.0 {
        mode("Atmospheric Reconstruction", "Coupled gravity and atmosphere mode.")
    } else if year >= 1900.0 {
        mode("Gravitational Determinism", "Gravity-only mode for long-term cycles.")
    } else if is_year(year, 1859.0) {
        mode("Carrington Event (Hindcast)", "Historical validation: extreme space weather.")
    } else if (1645.0..=1715.0).contains(&year) {
        mode("Maunder Minimum", "Low tidal forcing and solar activity.")
    } else if is_year(year, 1619.0) {
        mode("Keplerian Resonance", "Harmonices Mundi: foundation of orbital resonance.")
    } else if is_year(year, 1687.0) {
        mode("Newtonian Physics", "Principia: universal gravitation established.")
    } else {
        mode("Historical Reconstruction", "Pre-instrumental era. Ephemeris data only.")
    }
}

/// A clickable marker on the shell's timeline bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineMarker {
    pub year: f64,
    pub label: &'static str,
}

/// Markers on the timeline bar. Not the same list as the notable epochs.
pub static TIMELINE_MARKERS: [TimelineMarker; 7] = [
    TimelineMarker {
        year: 1609.0,
        label: "Kepler's Laws",
    },
    TimelineMarker {
        year: 1645.0,
        label: "Maunder Min.",
    },
    TimelineMarker {
        year: 1687.0,
        label: "Principia",
    },
    TimelineMarker {
        year: 1859.0,
        label: "Carrington",
    },
    TimelineMarker {
        year: 1908.0,
        label: "Hale Cycle",
    },
    TimelineMarker {
        year: 1934.0,
        label: "Dust Bowl",
    },
    TimelineMarker {
        year: 2025.0,
        label: "Cycle 25 Peak",
    },
];
