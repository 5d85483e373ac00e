//! Error types for the Percept response generator.
//!
//! Expected degraded outcomes (no usable images, empty model output) are
//! first-class `BackendError` variants so the dispatcher can flatten each one
//! to its sentinel text instead of pattern-matching on message strings.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures produced inside a backend adapter.
///
/// The first two variants are *expected* degraded outcomes with fixed
/// sentinel texts; the rest are genuine faults that the dispatcher logs and
/// converts to a generic failure string.
#[derive(Error, Debug)]
pub enum BackendError {
    /// None of the requested images could be resolved or decoded
    #[error("no usable images in request")]
    NoUsableImages,

    /// The backend executed but produced no text
    #[error("{backend} produced no text")]
    EmptyResponse { backend: &'static str },

    /// Remote API call failed (transport, HTTP status, or malformed body)
    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
        status_code: Option<u16>,
    },

    /// Local generation failed (template render, tensor shape, decode)
    #[error("inference error: {message}")]
    Inference { message: String },

    /// Image bytes could not be used by the adapter
    #[error("image error for {path}: {message}")]
    Image { path: PathBuf, message: String },

    /// The model provider could not supply a handle for the backend
    #[error("handle load failed for {backend}: {message}")]
    Handle {
        backend: &'static str,
        message: String,
    },
}

/// Convenience type alias for adapter results.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
