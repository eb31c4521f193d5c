//! A single partition of the findings dataset.
//!
//! A shard keeps one part per `(policy, location)`: the one with the highest
//! timestamp ever submitted for that key. The final state does not depend on
//! the order parts arrive in.

use std::cmp::Ordering;
use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

use crate::part::{PartKey, ShardPart};

/// Conflict-resolving container of the current part per key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shard {
    parts: BTreeMap<PartKey, ShardPart>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a part. Returns true if it became the current part for its key.
    ///
    /// The newer timestamp wins; on a tie the incoming part wins. The surviving
    /// part's `previous_timestamp` records the newest timestamp it superseded.
    pub fn put(&mut self, mut part: ShardPart) -> bool {
        match self.parts.entry(part.key()) {
            Entry::Vacant(slot) => {
                slot.insert(part);
                true
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match part.timestamp().total_cmp(&existing.timestamp()) {
                    Ordering::Less => {
                        existing.absorb_previous(Some(part.timestamp()));
                        existing.absorb_previous(part.previous_timestamp());
                        false
                    }
                    Ordering::Equal => {
                        part.absorb_previous(existing.previous_timestamp());
                        *existing = part;
                        true
                    }
                    Ordering::Greater => {
                        part.absorb_previous(Some(existing.timestamp()));
                        *existing = part;
                        true
                    }
                }
            }
        }
    }

    /// Fold every part of `other` through [`Shard::put`].
    pub fn update(&mut self, other: &Shard) {
        for part in other.parts.values() {
            self.put(part.clone());
        }
    }

    /// Like [`Shard::update`], consuming `other` instead of cloning its parts.
    pub fn merge(&mut self, other: Shard) {
        for part in other.parts.into_values() {
            self.put(part);
        }
    }

    pub fn get(&self, policy: &str, location: &str) -> Option<&ShardPart> {
        self.parts.get(&PartKey::new(policy, location))
    }

    pub fn get_key(&self, key: &PartKey) -> Option<&ShardPart> {
        self.parts.get(key)
    }

    pub fn contains(&self, policy: &str, location: &str) -> bool {
        self.get(policy, location).is_some()
    }

    /// Number of current parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Current parts, ordered by key.
    pub fn iter(&self) -> btree_map::Values<'_, PartKey, ShardPart> {
        self.parts.values()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, PartKey, ShardPart> {
        self.parts.keys()
    }

    pub fn into_parts(self) -> Vec<ShardPart> {
        self.parts.into_values().collect()
    }
}

impl FromIterator<ShardPart> for Shard {
    fn from_iter<I: IntoIterator<Item = ShardPart>>(iter: I) -> Self {
        let mut shard = Shard::new();
        shard.extend(iter);
        shard
    }
}

impl Extend<ShardPart> for Shard {
    fn extend<I: IntoIterator<Item = ShardPart>>(&mut self, iter: I) {
        for part in iter {
            self.put(part);
        }
    }
}

impl<'a> IntoIterator for &'a Shard {
    type Item = &'a ShardPart;
    type IntoIter = btree_map::Values<'a, PartKey, ShardPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
