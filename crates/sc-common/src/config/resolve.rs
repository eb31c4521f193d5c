//! Configuration path discovery.
//!
//! Resolution order: explicit path → environment variables → XDG config dir → defaults.

use std::path::{Path, PathBuf};

/// Where the engine configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path handed in by the embedding runtime.
    Explicit,

    /// Set via `SC_CONFIG` or `SC_CONFIG_DIR`.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit path"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub(crate) const ENV_CONFIG_PATH: &str = "SC_CONFIG";
pub(crate) const ENV_CONFIG_DIR: &str = "SC_CONFIG_DIR";
pub(crate) const ENV_SHARD_COUNT: &str = "SC_SHARD_COUNT";
pub(crate) const ENV_BASE_KEY: &str = "SC_BASE_KEY";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "engine.json";

/// Application name for XDG directories.
const APP_NAME: &str = "sharded-findings";

/// Resolve the engine config file path.
///
/// 1. Explicit path (if it exists)
/// 2. `SC_CONFIG` (direct path)
/// 3. `SC_CONFIG_DIR` + `engine.json`
/// 4. XDG config directory (`~/.config/sharded-findings/engine.json`)
/// 5. Built-in defaults (None)
pub fn resolve_config_path(explicit: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = explicit {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::Explicit);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for the engine.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Explicit.to_string(), "explicit path");
        assert_eq!(ConfigSource::Environment.to_string(), "environment variable");
        assert_eq!(ConfigSource::XdgConfig.to_string(), "XDG config");
        assert_eq!(ConfigSource::BuiltinDefault.to_string(), "builtin default");
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "{}").unwrap();

        let (resolved, source) = resolve_config_path(Some(&path));
        assert_eq!(resolved.as_deref(), Some(path.as_path()));
        assert_eq!(source, ConfigSource::Explicit);
    }

    #[test]
    fn test_xdg_config_dir() {
        if let Some(path) = xdg_config_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }
}
