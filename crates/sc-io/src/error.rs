//! Error types for shard persistence.

use thiserror::Error;

/// Errors that can occur while reading or writing shard blobs.
#[derive(Error, Debug)]
pub enum IoError {
    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compression or decompression failed
    #[error("codec error: {0}")]
    Codec(String),

    /// A blob decoded but its content is not what the key promises
    #[error("corrupted blob '{key}': {message}")]
    Corrupted { key: String, message: String },

    /// The object store rejected or failed the operation
    #[error("object store error for '{key}': {message}")]
    Store { key: String, message: String },

    /// Key cannot be mapped onto the store
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// Requested a shard the distributor never produces
    #[error("shard {index} is out of range for {shard_count} shards")]
    ShardOutOfRange { index: usize, shard_count: usize },
}

/// Result type alias for shard persistence.
pub type Result<T> = std::result::Result<T, IoError>;

impl From<IoError> for sc_common::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(e) => sc_common::Error::Io(e),
            IoError::Json(e) => sc_common::Error::Json(e),
            IoError::Codec(message) => sc_common::Error::Codec(message),
            IoError::Corrupted { key, message } => sc_common::Error::CorruptedBlob { key, message },
            IoError::Store { key, message } => sc_common::Error::Storage { key, message },
            IoError::InvalidKey(key) => sc_common::Error::InvalidKey(key),
            e @ IoError::ShardOutOfRange { .. } => sc_common::Error::Config(e.to_string()),
        }
    }
}
