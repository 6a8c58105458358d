//! Deterministic random number generation.
//!
//! Procedural textures, the starfield and the initial plasma-shell
//! orientation all draw from PCG streams derived from one master seed.
//! Streams are keyed by name, so a generator's output does not depend on
//! the order in which the scene is assembled.

use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// Deterministic, reproducible random number generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeededRng {
    /// Internal PCG state.
    rng: Pcg64,
}

impl SeededRng {
    /// Create a stream keyed by a label.
    ///
    /// The seed is derived from the master seed and a BLAKE3 digest of the
    /// label, so `named(s, "texture/Earth")` yields the same sequence no
    /// matter what was generated before it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use orrery::engine::rng::SeededRng;
    ///
    /// let mut a = SeededRng::named(42, "texture/Mars");
    /// let mut b = SeededRng::named(42, "texture/Mars");
    /// assert_eq!(a.gen_f64().to_bits(), b.gen_f64().to_bits());
    /// ```
    #[must_use]
    pub fn named(master_seed: u64, label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        let stream = u64::from_le_bytes(bytes);

        Self {
            rng: Pcg64::seed_from_u64(master_seed ^ stream),
        }
    }

    /// Generate a random f64 in [0, 1).
    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Generate a random f64 in `[min, max)`.
    ///
    /// A degenerate range returns `min`.
    pub fn gen_range_f64(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.gen_f64()
    }
}
