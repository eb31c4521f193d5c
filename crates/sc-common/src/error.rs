//! Error types for the sharded findings engine.
//!
//! Every crate in the workspace has its own narrow error enum; this module
//! provides the unified type they convert into at crate boundaries, with:
//! - Stable error codes for machine parsing
//! - Category classification for grouping
//! - A retry hint for the embedding runtime (the engine itself never retries)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ValidationError;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration loading and validation.
    Config,
    /// Object storage access.
    Storage,
    /// Blob compression and decompression.
    Codec,
    /// Persisted data that cannot be interpreted.
    Data,
    /// Local file I/O and serialization.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Codec => write!(f, "codec"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    // Storage errors (20-29)
    #[error("object store error for '{key}': {message}")]
    Storage { key: String, message: String },

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    // Codec errors (30-39)
    #[error("blob codec error: {0}")]
    Codec(String),

    // Data errors (40-49)
    #[error("corrupted blob '{key}': {message}")]
    CorruptedBlob { key: String, message: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors (validation failures keep their own code)
    /// - 20-29: Storage errors
    /// - 30-39: Codec errors
    /// - 40-49: Data errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Validation(e) => e.code(),
            Error::Storage { .. } => 20,
            Error::InvalidKey(_) => 21,
            Error::Codec(_) => 30,
            Error::CorruptedBlob { .. } => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::Validation(_) => ErrorCategory::Config,
            Error::Storage { .. } | Error::InvalidKey(_) => ErrorCategory::Storage,
            Error::Codec(_) => ErrorCategory::Codec,
            Error::CorruptedBlob { .. } => ErrorCategory::Data,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Only transient storage failures qualify; retry policy belongs to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Storage { .. } | Error::Io(_))
    }
}
