//! Reading and writing collections shard by shard.

use std::sync::Arc;

use sc_common::EngineConfig;
use sc_shards::{Distributor, PolicyMeta, Shard, ShardPart, ShardsCollection};
use tracing::{debug, info, warn};

use crate::codec::{BlobCodec, GzipCodec};
use crate::layout::{KeyLayout, ShardsKeyLayout};
use crate::store::ObjectStore;
use crate::{IoError, Result};

/// Shard persistence over an [`ObjectStore`].
///
/// Every shard is an independent blob. Writing a shard overwrites only that
/// shard's blob, so workers that own disjoint regions can persist in parallel.
#[derive(Debug)]
pub struct ShardsIO<S: ObjectStore> {
    store: S,
    codec: Box<dyn BlobCodec>,
    layout: Box<dyn KeyLayout>,
}

impl<S: ObjectStore> ShardsIO<S> {
    pub fn new(store: S, codec: Box<dyn BlobCodec>, layout: Box<dyn KeyLayout>) -> Self {
        ShardsIO {
            store,
            codec,
            layout,
        }
    }

    /// Gzip-compressed JSON blobs under `base_key` (`{base_key}/{i}.json.gz`).
    pub fn gzip(store: S, base_key: impl AsRef<str>) -> Self {
        let codec = GzipCodec::default();
        let layout = ShardsKeyLayout::for_codec(base_key, codec.extension());
        Self::new(store, Box::new(codec), Box::new(layout))
    }

    /// Gzip codec at the configured level, keys under the configured base key.
    pub fn from_config(store: S, config: &EngineConfig) -> Self {
        let codec = GzipCodec::new(config.compression_level);
        let layout = ShardsKeyLayout::for_codec(&config.base_key, codec.extension());
        Self::new(store, Box::new(codec), Box::new(layout))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &dyn KeyLayout {
        self.layout.as_ref()
    }

    /// Persist one shard as a JSON array of part records.
    pub fn write(&self, index: usize, shard: &Shard) -> Result<()> {
        let key = self.layout.shard_key(index);
        let parts: Vec<&ShardPart> = shard.iter().collect();
        let json = serde_json::to_vec(&parts)?;
        let blob = self.codec.encode(&json)?;
        self.store.put(&key, &blob)?;
        debug!(
            key = %key,
            parts = parts.len(),
            bytes = blob.len(),
            "Wrote shard"
        );
        Ok(())
    }

    pub fn write_meta(&self, meta: &PolicyMeta) -> Result<()> {
        let key = self.layout.meta_key();
        let json = serde_json::to_vec(meta)?;
        let blob = self.codec.encode(&json)?;
        self.store.put(&key, &blob)?;
        debug!(key = %key, policies = meta.len(), "Wrote policy meta");
        Ok(())
    }

    /// Policy meta, or an empty map when none was written.
    pub fn read_meta(&self) -> Result<PolicyMeta> {
        let key = self.layout.meta_key();
        match self.load_json(&key)? {
            Some(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
            Some(other) => Err(IoError::Corrupted {
                key,
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            None => Ok(PolicyMeta::new()),
        }
    }

    /// Part records stored for a shard, in stored order; empty when missing.
    pub fn read_raw(&self, index: usize) -> Result<Vec<ShardPart>> {
        let key = self.layout.shard_key(index);
        let Some(value) = self.load_json(&key)? else {
            debug!(key = %key, "Shard blob missing, reading as empty");
            return Ok(Vec::new());
        };
        serde_json::from_value(value).map_err(|e| IoError::Corrupted {
            key,
            message: e.to_string(),
        })
    }

    pub fn read_shard(&self, index: usize) -> Result<Shard> {
        Ok(self.read_raw(index)?.into_iter().collect())
    }

    /// Persist every non-empty shard and the policy meta.
    ///
    /// Blobs of shards that are empty in `collection` are left untouched.
    pub fn write_collection(&self, collection: &ShardsCollection) -> Result<()> {
        let mut written = 0;
        for (index, shard) in collection.shards() {
            if shard.is_empty() {
                continue;
            }
            self.write(index, shard)?;
            written += 1;
        }
        self.write_meta(collection.meta())?;
        info!(
            shards = written,
            parts = collection.len(),
            base = %self.layout.prefix(),
            "Wrote collection"
        );
        Ok(())
    }

    /// Load every shard blob under the prefix plus the policy meta.
    ///
    /// Parts are routed through `distributor` again, so blobs written under a
    /// different shard count still land in the right shard and none are
    /// skipped.
    pub fn read_collection(&self, distributor: Arc<dyn Distributor>) -> Result<ShardsCollection> {
        let shard_count = distributor.shard_count();
        let indices = self.written_indices()?;
        if let Some(&highest) = indices.last().filter(|&&i| i >= shard_count) {
            warn!(
                highest,
                shard_count,
                base = %self.layout.prefix(),
                "Blobs written with more shards than the reader uses, re-routing"
            );
        }

        let mut collection = ShardsCollection::new(distributor);
        for index in indices {
            collection.put_parts(self.read_raw(index)?);
        }
        collection.set_meta(self.read_meta()?);
        info!(
            shards = collection.shards().count(),
            parts = collection.len(),
            base = %self.layout.prefix(),
            "Read collection"
        );
        Ok(collection)
    }

    /// Load only the given shards, e.g. the ones covering a single region.
    pub fn read_shards(
        &self,
        distributor: Arc<dyn Distributor>,
        indices: &[usize],
    ) -> Result<ShardsCollection> {
        let shard_count = distributor.shard_count();
        if let Some(&index) = indices.iter().find(|&&i| i >= shard_count) {
            return Err(IoError::ShardOutOfRange { index, shard_count });
        }
        let mut collection = ShardsCollection::new(distributor);
        for &index in indices {
            collection.put_parts(self.read_raw(index)?);
        }
        collection.set_meta(self.read_meta()?);
        Ok(collection)
    }

    /// Indices of shard blobs present in the store, ascending.
    pub fn written_indices(&self) -> Result<Vec<usize>> {
        let mut indices: Vec<usize> = self
            .store
            .list(&self.layout.prefix())?
            .iter()
            .filter_map(|key| self.layout.parse_shard_index(key))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }

    fn load_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let Some(blob) = self.store.get(key)? else {
            return Ok(None);
        };
        let json = self.codec.decode(&blob).map_err(|e| IoError::Corrupted {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let value = serde_json::from_slice(&json).map_err(|e| IoError::Corrupted {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::IdentityCodec;
    use crate::store::MemoryObjectStore;
    use sc_shards::{AwsRegionDistributor, ErrorType};
    use serde_json::json;

    fn sample_shard() -> Shard {
        vec![
            ShardPart::new("s3-public-read", "eu-west-1")
                .with_timestamp(10.0)
                .with_resources(vec![json!({"bucket": "logs"})]),
            ShardPart::failed("iam-root-mfa", "eu-west-1", ErrorType::Access, "no iam:Get*")
                .with_timestamp(11.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_write_then_read_shard() {
        let io = ShardsIO::gzip(MemoryObjectStore::new(), "findings");
        let shard = sample_shard();
        io.write(3, &shard).unwrap();

        assert!(io.store().get("findings/3.json.gz").unwrap().is_some());
        assert_eq!(io.read_shard(3).unwrap(), shard);
    }

    #[test]
    fn test_full_precision_timestamps_survive() {
        let io = ShardsIO::gzip(MemoryObjectStore::new(), "findings");
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next_timestamp = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            1.0e9 + (state >> 11) as f64 / (1u64 << 53) as f64 * 1.0e9
        };

        let mut originals = vec![ShardPart::new("p", "l0")
            .with_timestamp(1864004560.6157393)
            .with_previous_timestamp(1864004559.1234567)];
        for i in 1..2000 {
            let ts = next_timestamp();
            originals.push(
                ShardPart::new("p", format!("l{}", i))
                    .with_timestamp(ts)
                    .with_previous_timestamp(next_timestamp().min(ts)),
            );
        }
        let shard: Shard = originals.iter().cloned().collect();
        io.write(0, &shard).unwrap();

        let loaded = io.read_raw(0).unwrap();
        assert_eq!(loaded.len(), originals.len());
        for part in &loaded {
            let original = shard.get_key(&part.key()).unwrap();
            assert_eq!(part.timestamp().to_bits(), original.timestamp().to_bits());
            assert_eq!(
                part.previous_timestamp().map(f64::to_bits),
                original.previous_timestamp().map(f64::to_bits)
            );
        }
    }

    #[test]
    fn test_missing_shard_is_empty() {
        let io = ShardsIO::gzip(MemoryObjectStore::new(), "findings");
        assert!(io.read_raw(7).unwrap().is_empty());
        assert!(io.read_shard(7).unwrap().is_empty());
        assert!(io.read_meta().unwrap().is_empty());
    }

    #[test]
    fn test_identity_layout_writes_plain_json() {
        let io = ShardsIO::new(
            MemoryObjectStore::new(),
            Box::new(IdentityCodec),
            Box::new(ShardsKeyLayout::for_codec("plain", "")),
        );
        io.write(0, &sample_shard()).unwrap();

        let blob = io.store().get("plain/0.json").unwrap().unwrap();
        let records: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        assert_eq!(records.as_array().unwrap().len(), 2);
        assert_eq!(records[1]["p"], "s3-public-read");
    }

    #[test]
    fn test_meta_roundtrip() {
        let io = ShardsIO::gzip(MemoryObjectStore::new(), "findings");
        let mut meta = PolicyMeta::new();
        meta.insert("s3-public-read".to_string(), json!({"severity": "high"}));
        io.write_meta(&meta).unwrap();
        assert_eq!(io.read_meta().unwrap(), meta);
    }

    #[test]
    fn test_corrupted_blob_reports_key() {
        let store = MemoryObjectStore::new();
        store.put("findings/0.json.gz", b"not gzip").unwrap();
        let io = ShardsIO::gzip(store, "findings");
        match io.read_raw(0) {
            Err(IoError::Corrupted { key, .. }) => assert_eq!(key, "findings/0.json.gz"),
            other => panic!("expected corrupted blob, got {:?}", other),
        }
    }

    #[test]
    fn test_meta_must_be_object() {
        let io = ShardsIO::new(
            MemoryObjectStore::new(),
            Box::new(IdentityCodec),
            Box::new(ShardsKeyLayout::new("findings", ".json")),
        );
        io.store().put("findings/meta.json", b"[1, 2]").unwrap();
        let err = io.read_meta().unwrap_err();
        assert!(err.to_string().contains("an array"), "{}", err);
    }

    #[test]
    fn test_shard_records_must_be_parts() {
        let io = ShardsIO::new(
            MemoryObjectStore::new(),
            Box::new(IdentityCodec),
            Box::new(ShardsKeyLayout::new("findings", ".json")),
        );
        io.store().put("findings/0.json", br#"{"p": "x"}"#).unwrap();
        assert!(matches!(io.read_raw(0), Err(IoError::Corrupted { .. })));
    }

    #[test]
    fn test_write_collection_skips_empty_shards() {
        let io = ShardsIO::gzip(MemoryObjectStore::new(), "findings");
        let mut collection = ShardsCollection::new(Arc::new(AwsRegionDistributor::new(10)));
        collection.put_part(ShardPart::new("p", "global"));
        collection.put_part(ShardPart::new("p", "eu-west-2"));
        io.write_collection(&collection).unwrap();

        assert_eq!(io.written_indices().unwrap(), vec![0, 4]);
        assert!(io.store().get("findings/meta.json.gz").unwrap().is_some());
    }

    #[test]
    fn test_read_shards_rejects_out_of_range() {
        let io = ShardsIO::gzip(MemoryObjectStore::new(), "findings");
        let err = io
            .read_shards(Arc::new(AwsRegionDistributor::new(4)), &[1, 4])
            .unwrap_err();
        assert!(matches!(
            err,
            IoError::ShardOutOfRange {
                index: 4,
                shard_count: 4
            }
        ));
    }

    #[test]
    fn test_from_config_uses_base_key() {
        let config = EngineConfig::default().with_base_key("tenants/t1/latest");
        let io = ShardsIO::from_config(MemoryObjectStore::new(), &config);
        io.write(1, &sample_shard()).unwrap();
        assert_eq!(
            io.store().list("").unwrap(),
            vec!["tenants/t1/latest/1.json.gz"]
        );
    }
}
