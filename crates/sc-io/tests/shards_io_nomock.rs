//! Persistence against a real directory-backed store.
//!
//! Covers the read paths a scan pipeline relies on:
//! - Full save and load of a region-sharded collection
//! - Loading a single region's shard without the rest
//! - Independent writers persisting disjoint shards into one prefix

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;

use sc_common::{log_subscriber, EngineConfig, LogConfig, LogFormat};
use sc_io::{FsObjectStore, IoError, ShardsIO};
use sc_shards::{
    AwsRegionDistributor, Distributor, ErrorType, LogicalClock, ShardPart, ShardsCollection,
};
use serde_json::json;
use tempfile::TempDir;
use tracing::level_filters::LevelFilter;

fn scan(clock: &LogicalClock) -> ShardsCollection {
    let mut collection = ShardsCollection::new(Arc::new(AwsRegionDistributor::new(10)));
    collection.put_part(
        ShardPart::stamped(clock, "iam-root-mfa", "global")
            .with_resources(vec![json!({"account": "123456789012"})]),
    );
    collection.put_part(
        ShardPart::stamped(clock, "s3-public-read", "eu-west-1")
            .with_resources(vec![json!({"bucket": "logs"}), json!({"bucket": "web"})]),
    );
    collection.put_part(ShardPart::failed(
        "ec2-open-ssh",
        "eu-west-2",
        ErrorType::Access,
        "ec2:DescribeSecurityGroups denied",
    ));
    collection.update_meta([(
        "s3-public-read".to_string(),
        json!({"severity": "high", "service": "s3"}),
    )]);
    collection
}

#[test]
fn collection_survives_fs_roundtrip() {
    let dir = TempDir::new().unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "tenants/acme/latest");
    let clock = LogicalClock::new();
    let collection = scan(&clock);

    io.write_collection(&collection).unwrap();
    assert!(dir.path().join("tenants/acme/latest/0.json.gz").exists());
    assert!(dir.path().join("tenants/acme/latest/meta.json.gz").exists());

    let loaded = io
        .read_collection(Arc::new(AwsRegionDistributor::new(10)))
        .unwrap();
    assert_eq!(loaded.len(), collection.len());
    assert_eq!(loaded.meta(), collection.meta());
    for part in collection.iter_parts() {
        assert_eq!(loaded.get(part.policy(), part.location()), Some(part));
    }

    let failed = loaded.get("ec2-open-ssh", "eu-west-2").unwrap();
    assert_eq!(failed.error_type(), Some(ErrorType::Access));
    assert_eq!(failed.error_message(), Some("ec2:DescribeSecurityGroups denied"));
}

#[test]
fn previous_timestamp_is_persisted() {
    let dir = TempDir::new().unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "findings");
    let mut collection = ShardsCollection::new(Arc::new(AwsRegionDistributor::new(2)));
    collection.put_part(ShardPart::new("p", "eu-west-1").with_timestamp(1.0));
    collection.put_part(ShardPart::new("p", "eu-west-1").with_timestamp(2.0));
    io.write_collection(&collection).unwrap();

    let part = io.read_shard(1).unwrap().get("p", "eu-west-1").cloned().unwrap();
    assert_eq!(part.timestamp(), 2.0);
    assert_eq!(part.previous_timestamp(), Some(1.0));
}

#[test]
fn single_region_loads_alone() {
    let dir = TempDir::new().unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "findings");
    let clock = LogicalClock::new();
    io.write_collection(&scan(&clock)).unwrap();

    let distributor = Arc::new(AwsRegionDistributor::new(10));
    let index = distributor.distribute("eu-west-1");
    let partial = io.read_shards(distributor, &[index]).unwrap();

    assert_eq!(partial.len(), 1);
    assert_eq!(partial.resource_count(), 2);
    assert!(partial.get("iam-root-mfa", "global").is_none());
    // Meta travels with any load.
    assert!(partial.meta().contains_key("s3-public-read"));
}

#[test]
fn missing_shards_read_as_empty() {
    let dir = TempDir::new().unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "never-written");

    assert!(io.written_indices().unwrap().is_empty());
    let loaded = io
        .read_collection(Arc::new(AwsRegionDistributor::new(32)))
        .unwrap();
    assert!(loaded.is_empty());
    assert!(loaded.meta().is_empty());
}

#[test]
fn load_with_other_shard_count_reroutes_parts() {
    let dir = TempDir::new().unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "findings");
    let clock = LogicalClock::new();
    let written = scan(&clock);
    io.write_collection(&written).unwrap();

    // Written as ten shards, read back as two.
    let loaded = io.read_collection(Arc::new(AwsRegionDistributor::new(2))).unwrap();
    assert_eq!(loaded.len(), written.len());
    assert_eq!(loaded.resource_count(), written.resource_count());
    for part in written.iter_parts() {
        assert_eq!(loaded.get(part.policy(), part.location()), Some(part));
    }
    let two = AwsRegionDistributor::new(2);
    for (index, shard) in loaded.shards() {
        for part in shard {
            assert_eq!(two.distribute(part.location()), index);
        }
    }
}

#[test]
fn disjoint_writers_share_a_prefix() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path()).unwrap());
    let regions = ["global", "eu-central-1", "eu-west-1", "eu-west-2"];

    let handles: Vec<_> = regions
        .iter()
        .map(|&region| {
            let io = ShardsIO::gzip(Arc::clone(&store), "findings");
            thread::spawn(move || {
                let mut collection =
                    ShardsCollection::new(Arc::new(AwsRegionDistributor::new(10)));
                collection.put_part(
                    ShardPart::new("ec2-open-ssh", region)
                        .with_resources(vec![json!({"region": region})]),
                );
                let (index, shard) = collection.shards().next().unwrap();
                io.write(index, shard).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let io = ShardsIO::gzip(store, "findings");
    assert_eq!(io.written_indices().unwrap(), vec![0, 2, 3, 4]);
    let loaded = io
        .read_collection(Arc::new(AwsRegionDistributor::new(10)))
        .unwrap();
    assert_eq!(loaded.len(), regions.len());
}

#[test]
fn configured_io_uses_base_key_and_level() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default()
        .with_base_key("scans/2026-10-18")
        .with_storage_dir(dir.path());
    let store = FsObjectStore::new(config.storage_dir.clone().unwrap()).unwrap();
    let io = ShardsIO::from_config(store, &config);

    let clock = LogicalClock::new();
    io.write_collection(&scan(&clock)).unwrap();
    assert!(dir.path().join("scans/2026-10-18/meta.json.gz").exists());
    assert_eq!(io.written_indices().unwrap(), vec![0, 3, 4]);
}

#[test]
fn corrupted_shard_surfaces_error() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("findings")).unwrap();
    std::fs::write(dir.path().join("findings/0.json.gz"), b"truncated").unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "findings");

    let err = io
        .read_collection(Arc::new(AwsRegionDistributor::new(4)))
        .unwrap_err();
    assert!(matches!(err, IoError::Corrupted { .. }));
    let common: sc_common::Error = err.into();
    assert_eq!(common.category(), sc_common::ErrorCategory::Data);
}

#[derive(Clone, Default)]
struct LogSink(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn persistence_emits_structured_events() {
    let dir = TempDir::new().unwrap();
    let io = ShardsIO::gzip(FsObjectStore::new(dir.path()).unwrap(), "findings");
    let clock = LogicalClock::new();
    let sink = LogSink::default();
    let writer = sink.clone();
    let config = LogConfig::at_level(LogFormat::Jsonl, LevelFilter::DEBUG);

    tracing::subscriber::with_default(log_subscriber(&config, move || writer.clone()), || {
        io.write_collection(&scan(&clock)).unwrap();
        io.read_collection(Arc::new(AwsRegionDistributor::new(2)))
            .unwrap();
    });

    let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let find = |message: &str| {
        events
            .iter()
            .find(|e| e["message"] == message)
            .unwrap_or_else(|| panic!("no {:?} event in {}", message, text))
    };

    let wrote = find("Wrote collection");
    assert_eq!(wrote["level"], "INFO");
    assert_eq!(wrote["shards"], 3);
    assert_eq!(wrote["parts"], 3);

    let rerouted = find("Blobs written with more shards than the reader uses, re-routing");
    assert_eq!(rerouted["level"], "WARN");
    assert_eq!(rerouted["highest"], 4);
    assert_eq!(rerouted["shard_count"], 2);

    assert_eq!(find("Read collection")["parts"], 3);
    assert!(events.iter().any(|e| e["message"] == "Wrote shard"));
}
