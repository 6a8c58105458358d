//! Terminal front-end.
//!
//! App state and key handling live here so they can be tested; terminal
//! I/O stays in `src/bin/orrery_tui.rs`.

#[cfg(feature = "tui")]
pub mod orrery_app;

#[cfg(test)]
#[cfg(feature = "tui")]
mod tests;
