//! Ordered iteration over a sparse set of shards.

use std::collections::BTreeMap;
use std::iter::FusedIterator;

use crate::shard::Shard;

/// Yields `(index, shard)` for present shards with index below a bound,
/// in ascending index order.
#[derive(Debug, Clone)]
pub struct ShardsIterator<'a> {
    shards: &'a BTreeMap<usize, Shard>,
    next: usize,
    bound: usize,
}

impl<'a> ShardsIterator<'a> {
    pub(crate) fn new(shards: &'a BTreeMap<usize, Shard>, bound: usize) -> Self {
        ShardsIterator {
            shards,
            next: 0,
            bound,
        }
    }
}

impl<'a> Iterator for ShardsIterator<'a> {
    type Item = (usize, &'a Shard);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.bound {
            return None;
        }
        match self.shards.range(self.next..self.bound).next() {
            Some((&index, shard)) => {
                self.next = index + 1;
                Some((index, shard))
            }
            None => {
                self.next = self.bound;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.bound.saturating_sub(self.next)))
    }
}

impl FusedIterator for ShardsIterator<'_> {}
