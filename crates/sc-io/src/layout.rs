//! Mapping shard indices and meta onto object keys.

use std::fmt;

/// Object-key naming for one persisted collection.
pub trait KeyLayout: fmt::Debug + Send + Sync {
    fn shard_key(&self, index: usize) -> String;

    fn meta_key(&self) -> String;

    /// Common prefix of every key of this collection, ending in `/`.
    fn prefix(&self) -> String;

    /// Inverse of [`KeyLayout::shard_key`]; `None` for meta and foreign keys.
    fn parse_shard_index(&self, key: &str) -> Option<usize>;
}

/// `{base_key}/{index}{suffix}` and `{base_key}/meta{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardsKeyLayout {
    base_key: String,
    suffix: String,
}

/// Name of the meta blob before the suffix.
pub const META_NAME: &str = "meta";

impl ShardsKeyLayout {
    /// Leading and trailing `/` are stripped from `base_key`.
    pub fn new(base_key: impl AsRef<str>, suffix: impl Into<String>) -> Self {
        ShardsKeyLayout {
            base_key: base_key.as_ref().trim_matches('/').to_string(),
            suffix: suffix.into(),
        }
    }

    /// JSON blobs with the codec's extension, e.g. `.json.gz`.
    pub fn for_codec(base_key: impl AsRef<str>, codec_extension: &str) -> Self {
        Self::new(base_key, format!(".json{}", codec_extension))
    }

    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl KeyLayout for ShardsKeyLayout {
    fn shard_key(&self, index: usize) -> String {
        format!("{}/{}{}", self.base_key, index, self.suffix)
    }

    fn meta_key(&self) -> String {
        format!("{}/{}{}", self.base_key, META_NAME, self.suffix)
    }

    fn prefix(&self) -> String {
        format!("{}/", self.base_key)
    }

    fn parse_shard_index(&self, key: &str) -> Option<usize> {
        let name = key
            .strip_prefix(self.base_key.as_str())?
            .strip_prefix('/')?
            .strip_suffix(self.suffix.as_str())?;
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok()
    }
}
