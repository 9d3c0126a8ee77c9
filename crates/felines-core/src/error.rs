//! Core error types for felines-core.
//!
//! Every component reports failures through these enums. None of them is
//! fatal: callers log them, surface them as status and keep going.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for felines-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote content could not be fetched
    #[error("Content error: {0}")]
    Content(#[from] ContentFetchError),

    /// Audio playback problems
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Failure to obtain a content item.
///
/// Cloneable because a single outcome is handed to every caller that joined
/// the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentFetchError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("request for '{key}' failed: {message}")]
    Request { key: String, message: String },

    /// Server answered with a non-success status
    #[error("request for '{key}' returned HTTP {status}")]
    Status { key: String, status: u16 },

    /// Body was not the JSON document we expected
    #[error("invalid payload for '{key}': {message}")]
    InvalidPayload { key: String, message: String },

    /// Payload lacks the configured text field
    #[error("payload for '{key}' has no string field '{field}'")]
    MissingField { key: String, field: String },

    /// A newer key was requested before this response arrived
    #[error("response for '{key}' was superseded by a newer request")]
    Superseded { key: String },

    /// The request driving this fetch was dropped before completing
    #[error("request for '{key}' was abandoned before completing")]
    Abandoned { key: String },
}

impl ContentFetchError {
    pub fn key(&self) -> &str {
        match self {
            ContentFetchError::Request { key, .. }
            | ContentFetchError::Status { key, .. }
            | ContentFetchError::InvalidPayload { key, .. }
            | ContentFetchError::MissingField { key, .. }
            | ContentFetchError::Superseded { key }
            | ContentFetchError::Abandoned { key } => key,
        }
    }
}

/// Audio playback errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// No playback resource exists in this environment
    #[error("audio playback unavailable: {0}")]
    Unavailable(String),

    /// Cue id not part of the fixed cue set
    #[error("unknown cue '{0}' (expected one of: meow, purr, trill)")]
    UnknownCue(String),

    /// The backend accepted the resource but failed to play it
    #[error("audio device error: {0}")]
    Device(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Volume outside `[0, 1]`; the value is clamped, not rejected
    #[error("volume {requested} is outside 0.0..=1.0")]
    InvalidVolume { requested: f32 },

    /// Milestone interval must be at least one
    #[error("milestone interval must be >= 1, got {0}")]
    InvalidInterval(u64),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
