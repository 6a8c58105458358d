//! Jidoka (自働化) - per-frame guard with graceful degradation.
//!
//! The solver is total for finite inputs, but a frame must never push a
//! NaN into the scene graph. The guard inspects every computed position
//! before it is applied:
//! - Non-finite values hold the affected node at its previous transform
//! - A Sun offset beyond the physical envelope is flagged but still drawn
//!
//! Nothing here halts the loop. The worst outcome is one frozen body and a
//! warning in the frame report.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::orbit::elements::ELEMENTS;

/// Guard response for a single checked value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JidokaResponse {
    /// Value is usable.
    Continue,

    /// Value is usable but suspicious.
    Warning {
        message: String,
        metric: String,
        current: f64,
        threshold: f64,
    },

    /// Value must not be applied; keep the previous transform.
    Hold { violation: GuardViolation },
}

impl JidokaResponse {
    /// Whether the checked value may be applied.
    #[must_use]
    pub const fn can_apply(&self) -> bool {
        matches!(self, Self::Continue | Self::Warning { .. })
    }

    /// Check if this is a warning.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }

    /// Check if the node must be held.
    #[must_use]
    pub const fn should_hold(&self) -> bool {
        matches!(self, Self::Hold { .. })
    }
}

/// Guard violation types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardViolation {
    /// Non-finite value (NaN or Inf) detected.
    NonFinite {
        body: String,
        field: String,
        value: f64,
    },

    /// Sun offset larger than any planetary configuration can produce.
    WobbleEnvelope { magnitude: f64, limit: f64 },
}

impl fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { body, field, value } => {
                write!(f, "Non-finite {field} for {body}: {value}")
            }
            Self::WobbleEnvelope { magnitude, limit } => {
                write!(f, "Sun offset {magnitude:.3} exceeds envelope {limit:.3}")
            }
        }
    }
}

/// Guard status for display in the HUD.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardStatus {
    /// All values of the last frame were finite.
    pub finite_ok: bool,
    /// Bodies held this frame.
    pub held: Vec<String>,
    /// Warnings since the last reset.
    pub warning_count: usize,
    /// Most recent warning or violation, rendered.
    pub last_warning: Option<String>,
}

/// Upper bound of `|Σ mass·position|` over every planetary configuration.
///
/// Each body contributes at most `mass · a(1 + e)` when it sits at aphelion
/// and all bodies line up.
#[must_use]
pub fn wobble_envelope() -> f64 {
    ELEMENTS
        .iter()
        .map(|el| el.mass * el.semi_major_axis * (1.0 + el.eccentricity))
        .sum()
}

/// Per-frame guard.
#[derive(Debug, Clone)]
pub struct FrameGuard {
    offset_limit: f64,
    status: GuardStatus,
}

impl FrameGuard {
    /// Create a guard for a given barycentric exaggeration.
    #[must_use]
    pub fn new(exaggeration: f64) -> Self {
        // Small margin over the analytic bound for rounding.
        let offset_limit = wobble_envelope() * exaggeration.abs() * 1.001;
        Self {
            offset_limit,
            status: GuardStatus {
                finite_ok: true,
                ..GuardStatus::default()
            },
        }
    }

    /// Clear per-frame state. Warning count is kept.
    pub fn begin_frame(&mut self) {
        self.status.finite_ok = true;
        self.status.held.clear();
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &GuardStatus {
        &self.status
    }

    /// Limit applied to the Sun offset magnitude.
    #[must_use]
    pub const fn offset_limit(&self) -> f64 {
        self.offset_limit
    }

    /// Check a scalar.
    pub fn check_scalar(&mut self, body: &str, field: &str, value: f64) -> JidokaResponse {
        if value.is_finite() {
            return JidokaResponse::Continue;
        }
        self.hold(GuardViolation::NonFinite {
            body: body.to_string(),
            field: field.to_string(),
            value,
        })
    }

    /// Check a computed position.
    pub fn check_position(&mut self, body: &str, position: DVec2) -> JidokaResponse {
        if !position.x.is_finite() {
            return self.check_scalar(body, "position.x", position.x);
        }
        if !position.y.is_finite() {
            return self.check_scalar(body, "position.y", position.y);
        }
        JidokaResponse::Continue
    }

    /// Check the Sun's barycentric offset.
    pub fn check_offset(&mut self, offset: DVec2) -> JidokaResponse {
        let finite = self.check_position("Sun", offset);
        if finite.should_hold() {
            return finite;
        }

        let magnitude = offset.length();
        if magnitude > self.offset_limit {
            let violation = GuardViolation::WobbleEnvelope {
                magnitude,
                limit: self.offset_limit,
            };
            let message = violation.to_string();
            tracing::warn!(%message, "frame guard warning");
            self.status.warning_count += 1;
            self.status.last_warning = Some(message.clone());
            return JidokaResponse::Warning {
                message,
                metric: "sun_offset".to_string(),
                current: magnitude,
                threshold: self.offset_limit,
            };
        }

        JidokaResponse::Continue
    }

    fn hold(&mut self, violation: GuardViolation) -> JidokaResponse {
        let message = violation.to_string();
        tracing::warn!(%message, "frame guard holding node");
        self.status.finite_ok = false;
        self.status.warning_count += 1;
        if let GuardViolation::NonFinite { body, .. } = &violation {
            if !self.status.held.contains(body) {
                self.status.held.push(body.clone());
            }
        }
        self.status.last_warning = Some(message);
        JidokaResponse::Hold { violation }
    }
}

impl Default for FrameGuard {
    fn default() -> Self {
        Self::new(crate::orbit::solver::EXAGGERATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::solver::{barycentric_offset, EXAGGERATION};

    #[test]
    fn test_response_predicates() {
        assert!(JidokaResponse::Continue.can_apply());
        let warning = JidokaResponse::Warning {
            message: "w".to_string(),
            metric: "sun_offset".to_string(),
            current: 3.0,
            threshold: 2.0,
        };
        assert!(warning.can_apply());
        assert!(warning.is_warning());

        let hold = JidokaResponse::Hold {
            violation: GuardViolation::NonFinite {
                body: "Mars".to_string(),
                field: "position.x".to_string(),
                value: f64::NAN,
            },
        };
        assert!(!hold.can_apply());
        assert!(hold.should_hold());
    }

    #[test]
    fn test_guard_passes_finite_position() {
        let mut guard = FrameGuard::default();
        let r = guard.check_position("Earth", DVec2::new(0.5, -0.8));
        assert_eq!(r, JidokaResponse::Continue);
        assert!(guard.status().finite_ok);
        assert_eq!(guard.status().warning_count, 0);
    }

    #[test]
    fn test_guard_holds_nan() {
        let mut guard = FrameGuard::default();
        let r = guard.check_position("Venus", DVec2::new(f64::NAN, 0.0));
        assert!(r.should_hold());
        assert!(!guard.status().finite_ok);
        assert_eq!(guard.status().held, vec!["Venus".to_string()]);
        assert!(guard
            .status()
            .last_warning
            .as_deref()
            .is_some_and(|m| m.contains("Venus")));
    }

    #[test]
    fn test_begin_frame_clears_holds_keeps_count() {
        let mut guard = FrameGuard::default();
        let _ = guard.check_scalar("Mars", "spin", f64::INFINITY);
        guard.begin_frame();
        assert!(guard.status().finite_ok);
        assert!(guard.status().held.is_empty());
        assert_eq!(guard.status().warning_count, 1);
    }

    #[test]
    fn test_real_offsets_within_envelope() {
        let mut guard = FrameGuard::new(EXAGGERATION);
        for year in (1555..=2055).step_by(7) {
            let r = guard.check_offset(barycentric_offset(f64::from(year)));
            assert_eq!(r, JidokaResponse::Continue, "year {year}");
        }
    }

    #[test]
    fn test_offset_outside_envelope_warns() {
        let mut guard = FrameGuard::new(EXAGGERATION);
        let limit = guard.offset_limit();
        let r = guard.check_offset(DVec2::new(limit * 2.0, 0.0));
        assert!(r.is_warning());
        assert_eq!(guard.status().warning_count, 1);
    }

    #[test]
    fn test_violation_display() {
        let v = GuardViolation::WobbleEnvelope {
            magnitude: 5.0,
            limit: 2.0,
        };
        assert!(v.to_string().contains("exceeds envelope"));
    }

    #[test]
    fn test_wobble_envelope_dominated_by_giants() {
        let env = wobble_envelope();
        assert!(env > 0.005 && env < 0.02, "envelope {env}");
    }
}
