//! Notable epochs and year snapping.
//!
//! Six hand-picked years anchor the time axis. Stepping the year near one
//! of them surfaces its metadata, and stepping very near snaps onto it.

use serde::Serialize;

/// A marked year on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NotableEpoch {
    /// Year (integral).
    pub year: f64,
    /// Short title.
    pub label: &'static str,
    /// One-line justification shown with the title.
    pub rationale: &'static str,
}

/// Notable epochs, sorted by year.
pub static NOTABLE_EPOCHS: [NotableEpoch; 6] = [
    NotableEpoch {
        year: 1619.0,
        label: "Keplerian Resonance",
        rationale: "Harmonic Ratio Discovery",
    },
    NotableEpoch {
        year: 1687.0,
        label: "Principia",
        rationale: "Gravity Laws Established",
    },
    NotableEpoch {
        year: 1859.0,
        label: "Carrington Event",
        rationale: "V-E-J Torque Peak: 0.98 η",
    },
    NotableEpoch {
        year: 1908.0,
        label: "Hale Cycle",
        rationale: "Magnetic Polarity Flip",
    },
    NotableEpoch {
        year: 1934.0,
        label: "Dust Bowl",
        rationale: "Atmospheric Jet Stream Lock",
    },
    NotableEpoch {
        year: 2026.0,
        label: "Cycle 25 Peak",
        rationale: "Constructive Interference",
    },
];

/// Outcome of [`snap_year`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapResult {
    /// Year after snapping.
    pub year: f64,
    /// Epoch whose metadata should be surfaced, if any.
    pub epoch: Option<&'static NotableEpoch>,
    /// Whether `year` was moved onto the epoch.
    pub snapped: bool,
}

/// Look up a notable epoch by exact year.
#[must_use]
pub fn epoch_at(year: f64) -> Option<&'static NotableEpoch> {
    NOTABLE_EPOCHS
        .iter()
        .find(|ev| (ev.year - year).abs() < f64::EPSILON)
}

/// Apply two-window snapping to a candidate year.
///
/// Epochs are scanned in order. The first one strictly closer than
/// `window` is surfaced; if it is also strictly closer than `exact`, the
/// year becomes the epoch's year. No epoch in range yields `None`.
#[must_use]
pub fn snap_year(candidate: f64, window: f64, exact: f64) -> SnapResult {
    for ev in &NOTABLE_EPOCHS {
        let distance = (candidate - ev.year).abs();
        if distance < window {
            let snapped = distance < exact;
            if snapped {
                tracing::debug!(year = ev.year, label = ev.label, "snapped to notable epoch");
            }
            return SnapResult {
                year: if snapped { ev.year } else { candidate },
                epoch: Some(ev),
                snapped,
            };
        }
    }

    SnapResult {
        year: candidate,
        epoch: None,
        snapped: false,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A snapped year always lands exactly on an epoch.
        #[test]
        fn prop_snapped_lands_on_epoch(year in 1555.0f64..2055.0) {
            let r = snap_year(year, 0.2, 0.05);
            if r.snapped {
                prop_assert!(NOTABLE_EPOCHS.iter().any(|e| e.year == r.year));
            } else {
                prop_assert!((r.year - year).abs() < f64::EPSILON);
            }
        }

        /// Snapping moves the year by less than the exact window.
        #[test]
        fn prop_snap_displacement_bounded(year in 1555.0f64..2055.0) {
            let r = snap_year(year, 0.2, 0.05);
            prop_assert!((r.year - year).abs() < 0.05);
        }
    }
}
