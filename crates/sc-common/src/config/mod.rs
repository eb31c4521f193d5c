//! Engine configuration loading and validation.
//!
//! This module provides:
//! - The typed `EngineConfig` read from `engine.json`
//! - Deterministic path resolution (explicit > env > XDG > defaults)
//! - Environment overrides for the values operators tune most often
//! - Semantic validation

pub mod resolve;
pub mod validate;

pub use resolve::{resolve_config_path, xdg_config_dir, ConfigSource, CONFIG_FILENAME};
pub use validate::{validate_engine_config, ValidationError, ValidationResult};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::SCHEMA_VERSION;

/// Default number of shards for region-aware collections.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// Default object-store prefix for shard blobs.
pub const DEFAULT_BASE_KEY: &str = "findings";

/// Default gzip level for shard blobs.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Number of shards a region-aware collection is split into.
    ///
    /// Fixed for the lifetime of one scan; changing it re-partitions every location.
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,

    /// Object-store prefix under which shard and meta blobs are written.
    #[serde(default = "default_base_key")]
    pub base_key: String,

    /// Gzip level (0-9) used by the blob codec.
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Root directory for the filesystem object store.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Region ordering override for the region-aware distributor.
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_shard_count() -> usize {
    DEFAULT_SHARD_COUNT
}

fn default_base_key() -> String {
    DEFAULT_BASE_KEY.to_string()
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            schema_version: default_schema_version(),
            shard_count: DEFAULT_SHARD_COUNT,
            base_key: default_base_key(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            storage_dir: None,
            regions: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(e.to_string()).into())
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration using the standard resolution order, apply
    /// environment overrides, and validate the result.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let (path, source) = resolve_config_path(explicit);

        let mut config = match &path {
            Some(path) => {
                debug!(path = %path.display(), source = %source, "Loading engine config");
                Self::from_file(path)?
            }
            None => {
                debug!("No engine config found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok((config, source))
    }

    /// Apply `SC_SHARD_COUNT` and `SC_BASE_KEY` on top of the loaded values.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(resolve::ENV_SHARD_COUNT) {
            match val.trim().parse::<usize>() {
                Ok(count) => self.shard_count = count,
                Err(_) => warn!(value = %val, "Ignoring unparseable SC_SHARD_COUNT"),
            }
        }
        if let Ok(val) = std::env::var(resolve::ENV_BASE_KEY) {
            if !val.trim().is_empty() {
                self.base_key = val.trim().to_string();
            }
        }
    }

    /// Validate configuration semantically.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_engine_config(self)
    }

    /// Set the shard count.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Set the base key.
    pub fn with_base_key(mut self, base_key: impl Into<String>) -> Self {
        self.base_key = base_key.into();
        self
    }

    /// Set the filesystem storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.shard_count, DEFAULT_SHARD_COUNT);
        assert_eq!(config.base_key, "findings");
        assert_eq!(config.compression_level, 6);
        assert!(config.regions.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{"shard_count": 10}"#).unwrap();
        assert_eq!(config.shard_count, 10);
        assert_eq!(config.base_key, DEFAULT_BASE_KEY);
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::default()
            .with_shard_count(4)
            .with_base_key("tenants/acme")
            .with_storage_dir("/tmp/shards");
        assert_eq!(config.shard_count, 4);
        assert_eq!(config.base_key, "tenants/acme");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/shards")));
        assert!(config.validate().is_ok());
    }
}
