//! Object-store persistence for sharded findings collections.
//!
//! Each shard of a collection is stored as its own blob, so independent
//! workers can write different shards without coordinating and readers can
//! load a single shard (e.g. one region) without touching the rest.
//!
//! # Layout
//!
//! ```text
//! {base_key}/0.json.gz      shard 0 (always holds "global" findings)
//! {base_key}/3.json.gz      shard 3
//! {base_key}/meta.json.gz   policy meta
//! ```
//!
//! Shard blobs hold a JSON array of part records; the meta blob holds a JSON
//! object. A shard blob that does not exist reads back as an empty shard.
//!
//! The adapter is assembled from three seams that change independently:
//! - [`ObjectStore`]: where bytes live (memory, local filesystem, …)
//! - [`BlobCodec`]: how bytes are compressed
//! - [`KeyLayout`]: how shard indices map to keys
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sc_io::{MemoryObjectStore, ShardsIO};
//! use sc_shards::{AwsRegionDistributor, ShardPart, ShardsCollection};
//!
//! let io = ShardsIO::gzip(MemoryObjectStore::new(), "tenants/acme/latest");
//!
//! let distributor = Arc::new(AwsRegionDistributor::new(10));
//! let mut collection = ShardsCollection::new(distributor.clone());
//! collection.put_part(ShardPart::new("s3-public-read", "eu-west-1"));
//! io.write_collection(&collection).unwrap();
//!
//! let loaded = io.read_collection(distributor).unwrap();
//! assert_eq!(loaded.len(), 1);
//! ```

pub mod codec;
pub mod error;
pub mod layout;
pub mod shards_io;
pub mod store;

pub use codec::{BlobCodec, GzipCodec, IdentityCodec};
pub use error::{IoError, Result};
pub use layout::{KeyLayout, ShardsKeyLayout};
pub use shards_io::ShardsIO;
pub use store::{FsObjectStore, MemoryObjectStore, ObjectStore};
