//! Frame loop scheduling.
//!
//! The host schedules one callback per display refresh; this module owns
//! the decision whether that callback may still run. The loop has three
//! states and one terminal edge:
//!
//! ```text
//! Idle --start--> Running --stop/cancel--> Stopped
//! ```
//!
//! A [`CancelToken`] can be handed to host code (listeners, the
//! `requestAnimationFrame` closure) so teardown observed anywhere stops the
//! loop before the next frame is drawn.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Frame loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// Constructed, no frame scheduled yet.
    Idle,
    /// Frames are being scheduled.
    Running,
    /// Terminal; no further frames.
    Stopped,
}

/// Shared cancellation flag.
///
/// Single-threaded by construction: the loop and its listeners all run on
/// the host's event thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Frame loop run/stop state machine.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: LoopState,
    frames: u64,
    token: CancelToken,
}

impl FrameScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
            token: CancelToken::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.observe_cancel()
    }

    /// Frames granted so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// A handle that stops this loop when cancelled.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Begin scheduling frames. Returns `false` once stopped.
    pub fn start(&mut self) -> bool {
        match self.observe_cancel() {
            LoopState::Idle | LoopState::Running => {
                self.state = LoopState::Running;
                true
            }
            LoopState::Stopped => {
                self.state = LoopState::Stopped;
                false
            }
        }
    }

    /// Ask for permission to run one frame.
    ///
    /// An idle scheduler starts implicitly. A cancelled or stopped one
    /// refuses, and stays stopped.
    pub fn tick(&mut self) -> bool {
        if !self.start() {
            return false;
        }
        self.frames += 1;
        true
    }

    /// Stop the loop for good.
    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            tracing::debug!(frames = self.frames, "frame loop stopped");
        }
        self.token.cancel();
        self.state = LoopState::Stopped;
    }

    fn observe_cancel(&self) -> LoopState {
        if self.token.is_cancelled() {
            LoopState::Stopped
        } else {
            self.state
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}
