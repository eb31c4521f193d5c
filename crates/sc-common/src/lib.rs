//! Shared plumbing for the sharded findings engine.
//!
//! This crate provides:
//! - A unified error type with stable codes and categories
//! - Engine configuration (shard count, storage layout, region table)
//! - Config resolution (explicit path → env → XDG → defaults) and validation
//! - Structured logging initialisation on top of `tracing-subscriber`

pub mod config;
pub mod error;
pub mod logging;

pub use config::{resolve_config_path, ConfigSource, EngineConfig, ValidationError};
pub use error::{Error, ErrorCategory, Result};
pub use logging::{init_logging, log_subscriber, LogConfig, LogFormat};

/// Schema version of engine configuration files.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Location sentinel for findings that are not bound to a region.
pub const GLOBAL_LOCATION: &str = "global";
