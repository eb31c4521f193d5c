//! Choosing a distributor per cloud.
//!
//! Only AWS findings are spread over several shards by region. Other clouds
//! produce far fewer locations per tenant and stay in a single shard.

use std::fmt;
use std::sync::Arc;

use sc_common::config::DEFAULT_SHARD_COUNT;
use sc_common::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::collection::ShardsCollection;
use crate::distributor::{AwsRegionDistributor, Distributor, SingleShardDistributor};
use crate::regions::RegionTable;

/// Cloud a scan ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Cloud {
    Aws,
    Azure,
    Google,
    Kubernetes,
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cloud::Aws => write!(f, "AWS"),
            Cloud::Azure => write!(f, "AZURE"),
            Cloud::Google => write!(f, "GOOGLE"),
            Cloud::Kubernetes => write!(f, "KUBERNETES"),
        }
    }
}

impl std::str::FromStr for Cloud {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AWS" => Ok(Cloud::Aws),
            "AZURE" => Ok(Cloud::Azure),
            "GOOGLE" | "GCP" => Ok(Cloud::Google),
            "KUBERNETES" | "K8S" => Ok(Cloud::Kubernetes),
            _ => Err(format!("unknown cloud: {}", s)),
        }
    }
}

/// Builds empty collections with the right distributor for a cloud.
#[derive(Debug, Clone)]
pub struct ShardsCollectionFactory {
    shard_count: usize,
    regions: RegionTable,
}

impl Default for ShardsCollectionFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_COUNT)
    }
}

impl ShardsCollectionFactory {
    pub fn new(shard_count: usize) -> Self {
        ShardsCollectionFactory {
            shard_count,
            regions: RegionTable::aws(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        ShardsCollectionFactory {
            shard_count: config.shard_count,
            regions: RegionTable::from_config(config),
        }
    }

    pub fn distributor(&self, cloud: Cloud) -> Arc<dyn Distributor> {
        match cloud {
            Cloud::Aws => Arc::new(AwsRegionDistributor::with_regions(
                self.shard_count,
                self.regions.clone(),
            )),
            Cloud::Azure | Cloud::Google | Cloud::Kubernetes => Arc::new(SingleShardDistributor),
        }
    }

    pub fn from_cloud(&self, cloud: Cloud) -> ShardsCollection {
        ShardsCollection::new(self.distributor(cloud))
    }
}
