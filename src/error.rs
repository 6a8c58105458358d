//! Error types for orrery.
//!
//! Every fallible operation returns `Result<T, OrreryError>` instead of
//! panicking. Numerical non-convergence in the Kepler solve is not an
//! error at all; out-of-range epochs are clamped. What remains is
//! configuration, resource acquisition and teardown misuse.

use thiserror::Error;

/// Result type alias for orrery operations.
pub type OrreryResult<T> = Result<T, OrreryError>;

/// Unified error type for all orrery operations.
#[derive(Debug, Error)]
pub enum OrreryError {
    // ===== Numerical guards =====
    /// A computed quantity was NaN or infinite.
    #[error("Guard: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Resource Errors =====
    /// The rendering surface or context could not be acquired.
    #[error("Rendering unavailable: {reason}")]
    Unavailable {
        /// Why the surface could not be acquired.
        reason: String,
    },

    /// Texture synthesis failed.
    #[error("Texture error: {0}")]
    Texture(String),

    /// A resource was used after the scene was disposed.
    #[error("Scene already disposed: {0}")]
    Disposed(String),

    /// Unknown resource handle.
    #[error("Unknown {kind} handle {index}")]
    UnknownHandle {
        /// Resource kind (geometry, material, texture, node).
        kind: &'static str,
        /// Handle index.
        index: usize,
    },

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OrreryError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a rendering-unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a texture error.
    #[must_use]
    pub fn texture(message: impl Into<String>) -> Self {
        Self::Texture(message.into())
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a non-finite guard error.
    #[must_use]
    pub fn non_finite(location: impl Into<String>) -> Self {
        Self::NonFiniteValue {
            location: location.into(),
        }
    }

    /// Whether this error means the visualisation must degrade to an
    /// unavailable state rather than keep running.
    #[must_use]
    pub const fn is_fatal_to_view(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Texture(_) | Self::Disposed(_)
        )
    }
}
