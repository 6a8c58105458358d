//! # orrery
//!
//! Keplerian orrery engine for a time-scrollable solar system view.
//!
//! The crate computes heliocentric and barycentric planetary positions from
//! per-planet orbital elements and drives a long-lived scene graph along a
//! time axis spanning 1555–2055:
//! - Orbit solving: Newton–Raphson Kepler solve, flat ecliptic projection
//! - Procedural textures: seeded raster synthesis per body type
//! - Scene construction: built once on mount, disposed once on unmount
//! - Animation: eased render year, sun wobble, camera ride, billboards
//! - Input: two-state time/view mode machine with epoch snapping
//!
//! ## Example
//!
//! ```rust
//! use orrery::prelude::*;
//!
//! let config = OrreryConfig::builder()
//!     .seed(7)
//!     .trail_steps(600)
//!     .build();
//! let shell = LocalShell::new(2024.0);
//! let mut orrery = Orrery::mount(config, HeadlessSurface::new(800, 600), shell);
//! let report = orrery.frame(1.0 / 60.0);
//! assert!(report.is_some());
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::suboptimal_flops,  // Formulas are kept in their textbook shape
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::needless_range_loop,
    clippy::many_single_char_names,
)]

pub mod animation;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod orbit;
pub mod orrery;
pub mod render;
pub mod scene;
pub mod shell;
pub mod texture;
pub mod tui;
#[cfg(feature = "wasm")]
pub mod web;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::animation::{FrameReport, SceneState};
    pub use crate::config::{OrreryConfig, OrreryConfigBuilder};
    pub use crate::engine::epoch::{Epoch, MAX_YEAR, MIN_YEAR};
    pub use crate::engine::rng::SeededRng;
    pub use crate::engine::scheduler::{FrameScheduler, LoopState};
    pub use crate::error::{OrreryError, OrreryResult};
    pub use crate::input::{InputController, InputEvent, InputOutcome, Mode, TimeStep, TIME_STEPS};
    pub use crate::orbit::elements::{OrbitalElements, Planet};
    pub use crate::orbit::epochs::{NotableEpoch, SnapResult, NOTABLE_EPOCHS};
    pub use crate::orbit::solver::{
        barycentric_offset, heliocentric_position, solve_kepler, torque_index,
    };
    pub use crate::orrery::Orrery;
    pub use crate::render::{CommandRenderer, HeadlessSurface, RenderCommand, Surface};
    pub use crate::shell::{Availability, Hud, LocalShell, PresentationShell, SectionRequest};
}

/// Re-export for public API
pub use error::{OrreryError, OrreryResult};

/// Crate version embedded at build time.
pub const VERSION: &str = env!("ORRERY_VERSION");

/// Git revision the crate was built from, or `unknown`.
pub const GIT_HASH: &str = env!("GIT_HASH");
