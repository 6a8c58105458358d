//! Frame-driven animation.
//!
//! The loop is split in two:
//! - [`state::SceneState`] performs one animation step against the scene
//! - [`FrameScheduler`] decides whether the host may schedule another step
//!
//! Each step eases the render year toward the target, then derives every
//! transform and uniform from it. Nothing animates from wall-clock time, so
//! a given sequence of targets always produces the same scene.

pub mod state;

pub use crate::engine::scheduler::{CancelToken, FrameScheduler, LoopState};
pub use state::{FrameReport, SceneState, BACKGROUND_SPIN};
