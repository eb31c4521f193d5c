//! Strategies mapping a part's location to a shard index.
//!
//! A distributor is pure: for a fixed shard count the same location always
//! lands in the same shard. That is what lets independent workers write
//! different shards without coordinating.

use std::fmt;

use sc_common::GLOBAL_LOCATION;
use tracing::warn;

use crate::part::ShardPart;
use crate::regions::RegionTable;

/// Maps locations to shard indices in `[0, shard_count())`.
pub trait Distributor: fmt::Debug + Send + Sync {
    /// Stable strategy name, used to decide whether two collections can be
    /// merged shard-by-shard.
    fn name(&self) -> &'static str;

    /// Number of shards this distributor partitions into (at least 1).
    fn shard_count(&self) -> usize;

    /// Shard index for a location. Must be total and deterministic.
    fn distribute(&self, location: &str) -> usize;

    fn distribute_part(&self, part: &ShardPart) -> usize {
        self.distribute(part.location())
    }

    /// Region ordering, for distributors that have one.
    fn region_table(&self) -> Option<&RegionTable> {
        None
    }

    /// True when both distributors send every location to the same index.
    fn is_compatible(&self, other: &dyn Distributor) -> bool {
        self.name() == other.name()
            && self.shard_count() == other.shard_count()
            && self.region_table() == other.region_table()
    }
}

/// Everything goes to shard 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleShardDistributor;

impl Distributor for SingleShardDistributor {
    fn name(&self) -> &'static str {
        "single"
    }

    fn shard_count(&self) -> usize {
        1
    }

    fn distribute(&self, _location: &str) -> usize {
        0
    }
}

/// Spreads regions over `n` shards by their ordinal in a region table.
///
/// `"global"` always maps to shard 0. Locations missing from the table also
/// map to shard 0.
#[derive(Debug, Clone)]
pub struct AwsRegionDistributor {
    shard_count: usize,
    regions: RegionTable,
}

impl AwsRegionDistributor {
    /// Distributor over the built-in AWS region table. A count of 0 is treated as 1.
    pub fn new(shard_count: usize) -> Self {
        Self::with_regions(shard_count, RegionTable::aws())
    }

    pub fn with_regions(shard_count: usize, regions: RegionTable) -> Self {
        AwsRegionDistributor {
            shard_count: shard_count.max(1),
            regions,
        }
    }
}

impl Distributor for AwsRegionDistributor {
    fn name(&self) -> &'static str {
        "aws-region"
    }

    fn shard_count(&self) -> usize {
        self.shard_count
    }

    fn distribute(&self, location: &str) -> usize {
        if location == GLOBAL_LOCATION {
            return 0;
        }
        match self.regions.ordinal(location) {
            Some(ordinal) => ordinal % self.shard_count,
            None => {
                warn!(location, "Location not in region table, routing to shard 0");
                0
            }
        }
    }

    fn region_table(&self) -> Option<&RegionTable> {
        Some(&self.regions)
    }
}
