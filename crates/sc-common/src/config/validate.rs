//! Configuration validation errors and semantic checks.

use std::collections::HashSet;

use thiserror::Error;

use super::EngineConfig;
use crate::SCHEMA_VERSION;

/// Validation result type.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Duplicate region in region table: {0}")]
    DuplicateRegion(String),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::ParseError(_) => 11,
            ValidationError::InvalidValue { .. } => 12,
            ValidationError::VersionMismatch { .. } => 13,
            ValidationError::DuplicateRegion(_) => 14,
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Maximum gzip compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Validate an engine configuration semantically.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.shard_count == 0 {
        return Err(ValidationError::invalid("shard_count", "must be at least 1"));
    }

    if config.compression_level > MAX_COMPRESSION_LEVEL {
        return Err(ValidationError::invalid(
            "compression_level",
            format!(
                "{} is out of range 0..={}",
                config.compression_level, MAX_COMPRESSION_LEVEL
            ),
        ));
    }

    validate_base_key(&config.base_key)?;

    if let Some(regions) = &config.regions {
        if regions.is_empty() {
            return Err(ValidationError::invalid("regions", "must not be empty"));
        }
        let mut seen = HashSet::with_capacity(regions.len());
        for region in regions {
            if region.trim().is_empty() {
                return Err(ValidationError::invalid("regions", "contains an empty region"));
            }
            if !seen.insert(region.as_str()) {
                return Err(ValidationError::DuplicateRegion(region.clone()));
            }
        }
    }

    Ok(())
}

/// Base keys are joined with `/`, so they must not start or end with one.
fn validate_base_key(base_key: &str) -> ValidationResult<()> {
    if base_key.is_empty() {
        return Err(ValidationError::invalid("base_key", "must not be empty"));
    }
    if base_key.starts_with('/') || base_key.ends_with('/') {
        return Err(ValidationError::invalid(
            "base_key",
            format!("'{}' must not start or end with '/'", base_key),
        ));
    }
    if base_key.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(ValidationError::invalid(
            "base_key",
            format!("'{}' contains an empty or parent segment", base_key),
        ));
    }
    Ok(())
}
