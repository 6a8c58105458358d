//! Metamorphic relations for the orbit solver.
//!
//! There is no oracle for "the correct display position of Saturn in 1733"
//! under this model, but several relations between outputs must hold
//! regardless of the exact values.
//!
//! # Metamorphic Relations
//!
//! 1. **Periodicity**: shifting the year by one orbital period returns the body to the same place
//! 2. **Kepler Inversion**: solving `M = E − e·sin E` recovers `E`
//! 3. **Exaggeration Linearity**: the Sun offset scales linearly with the exaggeration
//! 4. **Torque Antisymmetry**: `η(y) + η(−y) = 1`
//! 5. **Radial Monotonicity**: display compression keeps direction and order
//! 6. **Deterministic Replay**: identical inputs give bit-identical outputs

use glam::DVec2;
use std::f64::consts::TAU;

use crate::orbit::elements::Planet;
use crate::orbit::solver::{
    barycentric_offset_scaled, display_position, display_radius, heliocentric_position,
    solve_kepler, torque_index,
};

/// Metamorphic check result.
#[derive(Debug, Clone)]
pub struct MetamorphicResult {
    /// Name of the relation checked.
    pub relation: String,
    /// Whether the relation holds within tolerance.
    pub passed: bool,
    /// Worst deviation observed.
    pub error: f64,
    /// Tolerance used.
    pub tolerance: f64,
    /// Additional details.
    pub details: String,
}

impl MetamorphicResult {
    /// Create a passing result.
    #[must_use]
    pub fn pass(relation: &str, error: f64, tolerance: f64) -> Self {
        Self {
            relation: relation.to_string(),
            passed: true,
            error,
            tolerance,
            details: String::new(),
        }
    }

    /// Create a failing result.
    #[must_use]
    pub fn fail(relation: &str, error: f64, tolerance: f64, details: &str) -> Self {
        Self {
            relation: relation.to_string(),
            passed: false,
            error,
            tolerance,
            details: details.to_string(),
        }
    }

    fn judge(relation: &str, error: f64, tolerance: f64, details: impl FnOnce() -> String) -> Self {
        if error <= tolerance {
            Self::pass(relation, error, tolerance)
        } else {
            Self::fail(relation, error, tolerance, &details())
        }
    }
}

/// Evenly spaced sample years over `[from, to]`.
fn sample_years(from: f64, to: f64, count: usize) -> impl Iterator<Item = f64> {
    let span = to - from;
    let denom = count.saturating_sub(1).max(1) as f64;
    (0..count).map(move |i| from + span * i as f64 / denom)
}

/// MR-1: positions repeat after one revolution of the mean longitude.
#[must_use]
pub fn mr_periodicity(samples: usize, tolerance: f64) -> MetamorphicResult {
    let mut worst = 0.0f64;
    let mut worst_body = Planet::Mercury;

    for planet in Planet::ALL {
        let period = planet.elements().orbital_period_years();
        for year in sample_years(1555.0, 1900.0, samples) {
            let a = heliocentric_position(planet, year);
            let b = heliocentric_position(planet, year + period);
            let err = (a - b).length() / planet.elements().semi_major_axis;
            if err > worst {
                worst = err;
                worst_body = planet;
            }
        }
    }

    MetamorphicResult::judge("Periodicity", worst, tolerance, || {
        format!("Worst relative drift {worst:.2e} for {worst_body}")
    })
}

/// MR-2: the Kepler solve inverts the forward equation.
#[must_use]
pub fn mr_kepler_inversion(samples: usize, tolerance: f64) -> MetamorphicResult {
    let mut worst = 0.0f64;
    let denom = samples.max(1) as f64;

    for e_step in 0..=6 {
        let e = f64::from(e_step) * 0.05;
        for i in 0..samples {
            let e_anom = TAU * i as f64 / denom;
            let mean = e_anom - e * e_anom.sin();
            let recovered = solve_kepler(mean, e);
            worst = worst.max((recovered - e_anom).abs());
        }
    }

    MetamorphicResult::judge("Kepler Inversion", worst, tolerance, || {
        format!("Max anomaly error {worst:.2e}")
    })
}

/// MR-3: doubling the exaggeration doubles the Sun offset.
#[must_use]
pub fn mr_exaggeration_linearity(samples: usize, tolerance: f64) -> MetamorphicResult {
    let mut worst = 0.0f64;
    for year in sample_years(1555.0, 2055.0, samples) {
        let base = barycentric_offset_scaled(year, 100.0);
        let doubled = barycentric_offset_scaled(year, 200.0);
        worst = worst.max((doubled - base * 2.0).length());
    }

    MetamorphicResult::judge("Exaggeration Linearity", worst, tolerance, || {
        format!("Max deviation {worst:.2e}")
    })
}

/// MR-4: the torque index is antisymmetric about one half.
#[must_use]
pub fn mr_torque_antisymmetry(samples: usize, tolerance: f64) -> MetamorphicResult {
    let mut worst = 0.0f64;
    for year in sample_years(1555.0, 2055.0, samples) {
        let sum = torque_index(year) + torque_index(-year);
        worst = worst.max((sum - 1.0).abs());
    }

    MetamorphicResult::judge("Torque Antisymmetry", worst, tolerance, || {
        format!("Max |η(y) + η(−y) − 1| = {worst:.2e}")
    })
}

/// MR-5: scaling a heliocentric vector outward never shrinks or turns its
/// display image.
#[must_use]
pub fn mr_radial_monotonicity(scale: f64, exponent: f64) -> MetamorphicResult {
    let mut worst = 0.0f64;
    for planet in Planet::ALL {
        let pos = heliocentric_position(planet, 2000.0);
        let farther = pos * 1.5;

        let shrink = display_radius(pos, scale, exponent) - display_radius(farther, scale, exponent);
        worst = worst.max(shrink);

        let turned = display_position(pos, scale, exponent)
            .normalize_or_zero()
            .perp_dot(display_position(farther, scale, exponent).normalize_or_zero())
            .abs();
        worst = worst.max(turned);
    }

    MetamorphicResult::judge("Radial Monotonicity", worst, 1e-12, || {
        format!("Max shrink or turn {worst:.2e}")
    })
}

/// MR-6: two evaluations of the whole system agree bit for bit.
#[must_use]
pub fn mr_deterministic_replay(year: f64) -> MetamorphicResult {
    let run = || -> Vec<DVec2> {
        Planet::ALL
            .into_iter()
            .map(|p| heliocentric_position(p, year))
            .chain(std::iter::once(barycentric_offset_scaled(year, 200.0)))
            .collect()
    };

    if run() == run() {
        MetamorphicResult::pass("Deterministic Replay", 0.0, 0.0)
    } else {
        MetamorphicResult::fail("Deterministic Replay", 1.0, 0.0, "Results not bit-identical")
    }
}

/// Run every relation with default tolerances.
#[must_use]
pub fn run_all_metamorphic_tests() -> Vec<MetamorphicResult> {
    vec![
        mr_periodicity(32, 1e-5),
        mr_kepler_inversion(64, 1e-5),
        mr_exaggeration_linearity(64, 1e-12),
        mr_torque_antisymmetry(128, 1e-12),
        mr_radial_monotonicity(22.0, 0.45),
        mr_deterministic_replay(1859.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metamorphic_result_pass() {
        let r = MetamorphicResult::pass("X", 1e-9, 1e-6);
        assert!(r.passed);
        assert!(r.details.is_empty());
    }

    #[test]
    fn test_metamorphic_result_fail() {
        let r = MetamorphicResult::fail("X", 1.0, 1e-6, "too big");
        assert!(!r.passed);
        assert_eq!(r.details, "too big");
    }

    #[test]
    fn test_sample_years_inclusive() {
        let years: Vec<f64> = sample_years(0.0, 10.0, 3).collect();
        assert_eq!(years, vec![0.0, 5.0, 10.0]);
        assert_eq!(sample_years(1.0, 2.0, 1).count(), 1);
    }

    #[test]
    fn test_mr_periodicity() {
        let r = mr_periodicity(16, 1e-5);
        assert!(r.passed, "{}", r.details);
    }

    #[test]
    fn test_mr_kepler_inversion() {
        let r = mr_kepler_inversion(64, 1e-5);
        assert!(r.passed, "{}", r.details);
    }

    #[test]
    fn test_mr_exaggeration_linearity() {
        assert!(mr_exaggeration_linearity(32, 1e-12).passed);
    }

    #[test]
    fn test_mr_torque_antisymmetry() {
        assert!(mr_torque_antisymmetry(64, 1e-12).passed);
    }

    #[test]
    fn test_mr_radial_monotonicity() {
        assert!(mr_radial_monotonicity(22.0, 0.45).passed);
    }

    #[test]
    fn test_mr_deterministic_replay() {
        assert!(mr_deterministic_replay(2026.0).passed);
    }

    #[test]
    fn test_run_all_metamorphic_tests() {
        let results = run_all_metamorphic_tests();
        assert_eq!(results.len(), 6);
        for r in &results {
            assert!(r.passed, "{} failed: {}", r.relation, r.details);
        }
    }

    #[test]
    fn test_failing_relation_reports_details() {
        // A zero tolerance on a relation with rounding error must fail.
        let r = mr_periodicity(8, 0.0);
        if !r.passed {
            assert!(r.details.contains("drift"));
        }
    }
}
