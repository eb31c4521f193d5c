//! Fixed region orderings used by region-aware distributors.
//!
//! A region's ordinal is its position in the table. The ordering must never
//! change for data that is already persisted: shard indices are derived from it.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use sc_common::EngineConfig;

/// Built-in AWS region ordering. Append new regions at the end only.
pub const AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-northeast-3",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-south-1",
    "eu-west-3",
    "eu-north-1",
    "me-south-1",
    "sa-east-1",
    "ca-central-1",
    "ap-south-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "eu-south-2",
    "eu-central-2",
    "me-central-1",
    "il-central-1",
    "ca-west-1",
    "ap-southeast-5",
    "mx-central-1",
    "ap-southeast-7",
];

static AWS_TABLE: OnceLock<RegionTable> = OnceLock::new();

#[derive(Debug)]
struct Inner {
    regions: Vec<String>,
    ordinals: HashMap<String, usize>,
}

/// Immutable, cheaply cloneable region → ordinal table.
#[derive(Debug, Clone)]
pub struct RegionTable {
    inner: Arc<Inner>,
}

impl RegionTable {
    /// Build a table from an ordered list of regions.
    ///
    /// A region listed twice keeps its first ordinal.
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Vec::new();
        let mut ordinals = HashMap::new();
        for region in regions {
            let region = region.into();
            if !ordinals.contains_key(&region) {
                ordinals.insert(region.clone(), list.len());
                list.push(region);
            }
        }
        RegionTable {
            inner: Arc::new(Inner {
                regions: list,
                ordinals,
            }),
        }
    }

    /// The built-in AWS table, shared by every caller.
    pub fn aws() -> Self {
        AWS_TABLE
            .get_or_init(|| RegionTable::new(AWS_REGIONS.iter().copied()))
            .clone()
    }

    /// The configured region override, or the AWS table.
    pub fn from_config(config: &EngineConfig) -> Self {
        match &config.regions {
            Some(regions) => RegionTable::new(regions.iter().cloned()),
            None => RegionTable::aws(),
        }
    }

    pub fn ordinal(&self, region: &str) -> Option<usize> {
        self.inner.ordinals.get(region).copied()
    }

    pub fn contains(&self, region: &str) -> bool {
        self.inner.ordinals.contains_key(region)
    }

    pub fn len(&self) -> usize {
        self.inner.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.regions.iter().map(String::as_str)
    }
}

impl PartialEq for RegionTable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.regions == other.inner.regions
    }
}

impl Eq for RegionTable {}
