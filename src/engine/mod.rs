//! Core engine primitives.
//!
//! The pieces every other module leans on:
//! - [`epoch::Epoch`]: the single clamped time parameter driving the scene
//! - [`rng::SeededRng`]: named PCG streams for procedural content
//! - [`scheduler::FrameScheduler`]: the run/stop state of the frame loop

pub mod epoch;
pub mod rng;
pub mod scheduler;

pub use epoch::{Epoch, MAX_YEAR, MIN_YEAR};
pub use rng::SeededRng;
pub use scheduler::{CancelToken, FrameScheduler, LoopState};
