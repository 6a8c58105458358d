//! Presentation shell interface.
//!
//! The shell is the page (or terminal) around the view. It owns the
//! authoritative year and draws the HUD; the engine only talks to it
//! through [`PresentationShell`]:
//! - it reads the year each frame
//! - it reports wheel-driven year changes
//! - it signals whether the view is available at all
//! - it asks for a page section to be scrolled into view and highlighted
//!
//! [`LocalShell`] is an in-memory implementation used by the terminal
//! front-end and the tests.

pub mod coverage;

use serde::Serialize;
use std::fmt;

use crate::engine::epoch::clamp_year;
use crate::input::Mode;
use crate::orbit::epochs::NotableEpoch;

pub use coverage::{
    active_datasets, prediction_mode, Dataset, PredictionMode, TimelineMarker, DATASETS, TIMELINE_MARKERS,
};

/// How long a requested section stays highlighted.
pub const HIGHLIGHT_MS: u64 = 1_500;
/// Section shown for years with no dedicated section.
pub const DEFAULT_SECTION: &str = "methodology";

/// Whether the view can render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Availability {
    #[default]
    Available,
    /// The view could not start; the rest of the page is unaffected.
    Unavailable { reason: String },
}

impl Availability {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

/// Ask the shell to scroll a section into view and flash it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionRequest {
    pub section: &'static str,
    pub highlight_ms: u64,
}

/// Page section describing a year.
#[must_use]
pub fn section_for_year(year: f64) -> SectionRequest {
    let section = match year.round() as i64 {
        y if (year - y as f64).abs() > f64::EPSILON => DEFAULT_SECTION,
        1619 | 1687 => "hypothesis",
        1859 => "event-1859",
        1908 => "introduction",
        1934 => "event-1934",
        2026 => "event-2026",
        _ => DEFAULT_SECTION,
    };
    SectionRequest {
        section,
        highlight_ms: HIGHLIGHT_MS,
    }
}

/// Host side of the engine.
pub trait PresentationShell {
    /// Authoritative year.
    fn year(&self) -> f64;

    /// The engine moved the year (wheel stepping only).
    fn on_year_change(&mut self, year: f64);

    /// The view became available or unavailable.
    fn on_availability(&mut self, availability: Availability);

    /// The engine asks for a section to be shown.
    fn on_section_request(&mut self, request: SectionRequest);
}

/// In-memory shell that records everything it is told.
#[derive(Debug, Clone, Default)]
pub struct LocalShell {
    year: f64,
    availability: Option<Availability>,
    year_changes: Vec<f64>,
    section_requests: Vec<SectionRequest>,
}

impl LocalShell {
    #[must_use]
    pub fn new(year: f64) -> Self {
        Self {
            year: clamp_year(year),
            ..Self::default()
        }
    }

    /// Set the year from the shell side, as a slider would.
    pub fn set_year(&mut self, year: f64) {
        self.year = clamp_year(year);
    }

    /// Last availability signal, if any arrived.
    #[must_use]
    pub const fn availability(&self) -> Option<&Availability> {
        self.availability.as_ref()
    }

    /// Years reported by the engine, oldest first.
    #[must_use]
    pub fn year_changes(&self) -> &[f64] {
        &self.year_changes
    }

    #[must_use]
    pub fn section_requests(&self) -> &[SectionRequest] {
        &self.section_requests
    }
}

impl PresentationShell for LocalShell {
    fn year(&self) -> f64 {
        self.year
    }

    fn on_year_change(&mut self, year: f64) {
        self.year = year;
        self.year_changes.push(year);
    }

    fn on_availability(&mut self, availability: Availability) {
        self.availability = Some(availability);
    }

    fn on_section_request(&mut self, request: SectionRequest) {
        self.section_requests.push(request);
    }
}

/// Read-only snapshot for HUD overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    /// Target year.
    pub year: f64,
    /// Year currently drawn.
    pub render_year: f64,
    pub torque: f64,
    /// Notable epoch surfaced by the last wheel step.
    pub highlighted: Option<&'static NotableEpoch>,
    pub mode: Mode,
    pub step_label: &'static str,
    pub z_scale: f64,
    pub availability: Availability,
    pub datasets: Vec<&'static Dataset>,
    pub prediction: PredictionMode,
    /// Frame guard warnings since mount.
    pub warnings: usize,
}

impl Hud {
    /// Year as shown on the epoch readout.
    #[must_use]
    pub fn epoch_label(&self) -> String {
        format!("{:.2} CE", self.year)
    }

    /// Torque index as shown on the gauge.
    #[must_use]
    pub fn torque_label(&self) -> String {
        format!("{:.2}", self.torque)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_mapping() {
        assert_eq!(section_for_year(1619.0).section, "hypothesis");
        assert_eq!(section_for_year(1687.0).section, "hypothesis");
        assert_eq!(section_for_year(1859.0).section, "event-1859");
        assert_eq!(section_for_year(1908.0).section, "introduction");
        assert_eq!(section_for_year(1934.0).section, "event-1934");
        assert_eq!(section_for_year(2026.0).section, "event-2026");
        assert_eq!(section_for_year(1645.0).section, DEFAULT_SECTION);
        assert_eq!(section_for_year(1859.4).section, DEFAULT_SECTION);
        assert_eq!(section_for_year(1859.0).highlight_ms, 1_500);
    }

    #[test]
    fn test_local_shell_records() {
        let mut shell = LocalShell::new(3000.0);
        assert!((shell.year() - 2055.0).abs() < f64::EPSILON);
        shell.on_year_change(2019.0);
        shell.on_section_request(section_for_year(1934.0));
        shell.on_availability(Availability::Unavailable {
            reason: "no surface".to_string(),
        });
        assert_eq!(shell.year_changes(), &[2019.0]);
        assert!((shell.year() - 2019.0).abs() < f64::EPSILON);
        assert_eq!(shell.section_requests().len(), 1);
        assert!(shell.availability().is_some_and(|a| !a.is_available()));
    }

    #[test]
    fn test_availability_display() {
        assert_eq!(Availability::Available.to_string(), "available");
        let down = Availability::Unavailable {
            reason: "context lost".to_string(),
        };
        assert_eq!(down.to_string(), "unavailable: context lost");
    }
}
