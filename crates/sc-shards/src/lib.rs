//! Sharded findings collection engine.
//!
//! Many independent policy executions (one per rule × region × tenant) each
//! produce a [`ShardPart`]: the outcome of one policy in one location. Parts
//! are routed by a [`Distributor`] into [`Shard`]s of a [`ShardsCollection`],
//! where the newest part per `(policy, location)` wins regardless of arrival
//! order.
//!
//! # Operations
//!
//! - `put_part` / `put_parts`: route parts into their shard
//! - `update`: merge another collection (e.g. one built by another worker)
//! - `a - b`: resources in `a` that `b` did not have ("new since last scan")
//! - `iter_parts`: every surviving part, in shard-index order
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sc_shards::{AwsRegionDistributor, ShardPart, ShardsCollection};
//! use serde_json::json;
//!
//! let mut previous = ShardsCollection::new(Arc::new(AwsRegionDistributor::new(10)));
//! previous.put_part(
//!     ShardPart::new("ecs-public-ip", "eu-west-1")
//!         .with_resources(vec![json!({"id": "svc-1"})])
//!         .with_timestamp(100.0),
//! );
//!
//! let mut current = ShardsCollection::new(Arc::new(AwsRegionDistributor::new(10)));
//! current.put_part(
//!     ShardPart::new("ecs-public-ip", "eu-west-1")
//!         .with_resources(vec![json!({"id": "svc-1"}), json!({"id": "svc-2"})])
//!         .with_timestamp(200.0),
//! );
//!
//! let new_findings = &current - &previous;
//! assert_eq!(new_findings.resource_count(), 1);
//! ```

pub mod canonical;
pub mod clock;
pub mod collection;
pub mod distributor;
pub mod factory;
pub mod iter;
pub mod part;
pub mod regions;
pub mod shard;

pub use canonical::{canonical_json, fingerprint, ResourceFingerprint};
pub use clock::{Clock, LogicalClock, SystemClock};
pub use collection::{CollectionStats, PolicyMeta, ShardsCollection};
pub use distributor::{AwsRegionDistributor, Distributor, SingleShardDistributor};
pub use factory::{Cloud, ShardsCollectionFactory};
pub use iter::ShardsIterator;
pub use part::{ErrorType, PartKey, Resource, ShardPart};
pub use regions::RegionTable;
pub use shard::Shard;
