//! The whole findings dataset of one scan, split into shards.
//!
//! A collection routes parts through its distributor into lazily created
//! shards, merges collections built elsewhere, and subtracts one snapshot
//! from another to find what is new. It performs no locking; share it across
//! threads behind a mutex or give each worker its own and merge afterwards.

use std::collections::{BTreeMap, HashSet};
use std::ops::Sub;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::canonical::{fingerprint, ResourceFingerprint};
use crate::distributor::{Distributor, SingleShardDistributor};
use crate::iter::ShardsIterator;
use crate::part::{ErrorType, Resource, ShardPart};
use crate::shard::Shard;

/// Descriptive attributes per policy name, carried next to the shards.
pub type PolicyMeta = BTreeMap<String, serde_json::Value>;

/// Aggregate counts over a collection, for metrics consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub shards: usize,
    pub parts: usize,
    pub resources: usize,
    pub failed_parts: usize,
    pub errors_by_type: BTreeMap<ErrorType, usize>,
    /// Failed parts whose error kind was not recognised.
    pub unclassified_errors: usize,
}

/// Sparse `shard index → Shard` mapping plus policy meta.
#[derive(Debug, Clone)]
pub struct ShardsCollection {
    distributor: Arc<dyn Distributor>,
    shards: BTreeMap<usize, Shard>,
    meta: PolicyMeta,
}

impl ShardsCollection {
    pub fn new(distributor: Arc<dyn Distributor>) -> Self {
        ShardsCollection {
            distributor,
            shards: BTreeMap::new(),
            meta: PolicyMeta::new(),
        }
    }

    /// Collection that keeps everything in shard 0.
    pub fn single_shard() -> Self {
        Self::new(Arc::new(SingleShardDistributor))
    }

    pub fn distributor(&self) -> &Arc<dyn Distributor> {
        &self.distributor
    }

    pub fn shard_count(&self) -> usize {
        self.distributor.shard_count()
    }

    /// Number of current parts across all shards.
    pub fn len(&self) -> usize {
        self.shards.values().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.values().all(Shard::is_empty)
    }

    pub fn put_part(&mut self, part: ShardPart) {
        let index = self.distributor.distribute_part(&part);
        self.shards.entry(index).or_default().put(part);
    }

    pub fn put_parts<I: IntoIterator<Item = ShardPart>>(&mut self, parts: I) {
        for part in parts {
            self.put_part(part);
        }
    }

    /// Merge a shard into the slot `index` as-is, without re-routing its parts.
    ///
    /// The caller must know the parts belong to `index` under this
    /// collection's distributor. Empty shards are ignored. An index the
    /// distributor never produces cannot be iterated, so those parts are
    /// re-routed instead.
    pub fn put_shard(&mut self, index: usize, shard: Shard) {
        if shard.is_empty() {
            return;
        }
        if index >= self.shard_count() {
            warn!(
                index,
                shard_count = self.shard_count(),
                parts = shard.len(),
                "Shard index out of range, re-routing its parts"
            );
            self.put_parts(shard.into_parts());
            return;
        }
        match self.shards.get_mut(&index) {
            Some(existing) => existing.merge(shard),
            None => {
                self.shards.insert(index, shard);
            }
        }
    }

    pub fn get(&self, policy: &str, location: &str) -> Option<&ShardPart> {
        let index = self.distributor.distribute(location);
        self.shards.get(&index)?.get(policy, location)
    }

    pub fn shard(&self, index: usize) -> Option<&Shard> {
        self.shards.get(&index)
    }

    /// Present shards in index order, bounded by the shard count.
    pub fn shards(&self) -> ShardsIterator<'_> {
        ShardsIterator::new(&self.shards, self.shard_count())
    }

    /// Every current part, in shard-index order. Call again to restart.
    pub fn iter_parts(&self) -> impl Iterator<Item = &ShardPart> + '_ {
        self.shards().flat_map(|(_, shard)| shard.iter())
    }

    /// Parts whose execution failed.
    pub fn iter_error_parts(&self) -> impl Iterator<Item = &ShardPart> + '_ {
        self.iter_parts().filter(|part| part.has_error())
    }

    /// Every resource together with the part that reported it.
    pub fn iter_resources(&self) -> impl Iterator<Item = (&ShardPart, &Resource)> + '_ {
        self.iter_parts()
            .flat_map(|part| part.resources().iter().map(move |resource| (part, resource)))
    }

    pub fn resource_count(&self) -> usize {
        self.iter_parts().map(ShardPart::resource_count).sum()
    }

    /// Merge another collection into this one.
    ///
    /// With a compatible distributor the shards are merged index by index.
    /// Otherwise `other`'s parts are re-routed through this collection's
    /// distributor. Meta entries from `other` overwrite existing ones.
    pub fn update(&mut self, other: &ShardsCollection) {
        if self.distributor.is_compatible(other.distributor.as_ref()) {
            for (index, shard) in &other.shards {
                match self.shards.get_mut(index) {
                    Some(existing) => existing.update(shard),
                    None => {
                        self.shards.insert(*index, shard.clone());
                    }
                }
            }
        } else {
            warn!(
                ours = self.distributor.name(),
                ours_shards = self.shard_count(),
                theirs = other.distributor.name(),
                theirs_shards = other.shard_count(),
                "Merging collections with different distributors, re-partitioning"
            );
            self.put_parts(other.iter_parts().cloned());
        }
        self.update_meta(other.meta.iter().map(|(k, v)| (k.clone(), v.clone())));
        debug!(parts = self.len(), shards = self.shards.len(), "Collection updated");
    }

    /// Like [`ShardsCollection::update`], consuming `other`.
    pub fn merge(&mut self, other: ShardsCollection) {
        let compatible = self.distributor.is_compatible(other.distributor.as_ref());
        let ShardsCollection { shards, meta, .. } = other;
        if compatible {
            for (index, shard) in shards {
                self.put_shard(index, shard);
            }
        } else {
            warn!(
                ours = self.distributor.name(),
                ours_shards = self.shard_count(),
                "Merging collections with different distributors, re-partitioning"
            );
            self.put_parts(shards.into_values().flat_map(Shard::into_parts));
        }
        self.meta.extend(meta);
    }

    /// Resources present in `self` but not in `other`, per `(policy, location)`.
    ///
    /// Resources are compared by canonical value, so duplicates collapse.
    /// Keys left with no resources are dropped. Surviving parts keep their
    /// error and timestamps. The result is single-sharded and carries the
    /// union of both metas, with `self`'s entries winning.
    pub fn difference(&self, other: &ShardsCollection) -> ShardsCollection {
        let mut result = ShardsCollection::single_shard();

        for part in self.iter_parts() {
            let seen: HashSet<ResourceFingerprint> = other
                .get(part.policy(), part.location())
                .map(|theirs| theirs.resources().iter().map(fingerprint).collect())
                .unwrap_or_default();

            let mut kept = HashSet::new();
            let fresh: Vec<Resource> = part
                .resources()
                .iter()
                .filter(|resource| {
                    let fp = fingerprint(resource);
                    !seen.contains(&fp) && kept.insert(fp)
                })
                .cloned()
                .collect();

            if !fresh.is_empty() {
                result.put_part(part.derive_with_resources(fresh));
            }
        }

        result.meta = other.meta.clone();
        result.meta.extend(self.meta.iter().map(|(k, v)| (k.clone(), v.clone())));

        debug!(
            parts = result.len(),
            resources = result.resource_count(),
            "Computed collection difference"
        );
        result
    }

    pub fn meta(&self) -> &PolicyMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut PolicyMeta {
        &mut self.meta
    }

    pub fn set_meta(&mut self, meta: PolicyMeta) {
        self.meta = meta;
    }

    /// Dict-update semantics: incoming entries overwrite existing ones.
    pub fn update_meta<I: IntoIterator<Item = (String, serde_json::Value)>>(&mut self, entries: I) {
        self.meta.extend(entries);
    }

    pub fn stats(&self) -> CollectionStats {
        let mut stats = CollectionStats {
            shards: self.shards.values().filter(|s| !s.is_empty()).count(),
            ..CollectionStats::default()
        };
        for part in self.iter_parts() {
            stats.parts += 1;
            stats.resources += part.resource_count();
            if part.has_error() {
                stats.failed_parts += 1;
                match part.error_type() {
                    Some(kind) => *stats.errors_by_type.entry(kind).or_default() += 1,
                    None => stats.unclassified_errors += 1,
                }
            }
        }
        stats
    }
}

impl Sub<&ShardsCollection> for &ShardsCollection {
    type Output = ShardsCollection;

    fn sub(self, other: &ShardsCollection) -> ShardsCollection {
        self.difference(other)
    }
}

impl Sub for ShardsCollection {
    type Output = ShardsCollection;

    fn sub(self, other: ShardsCollection) -> ShardsCollection {
        self.difference(&other)
    }
}
