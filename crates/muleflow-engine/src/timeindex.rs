//! Ordered timestamp index over a transaction batch.
//!
//! A balanced ordered container keyed by `(timestamp, insertion sequence)`
//! so duplicate timestamps keep their batch order. Insert is O(log N),
//! in-order traversal yields transactions by non-decreasing timestamp, and
//! the inclusive range query is O(log N + K).

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::Transaction;

/// Balanced ordered index from timestamp to transaction index.
#[derive(Debug, Default)]
pub struct TimeIndex {
    entries: BTreeMap<(DateTime<Utc>, u64), usize>,
    seq: u64,
}

impl TimeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over a whole batch.
    #[must_use]
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut index = Self::new();
        for (i, txn) in transactions.iter().enumerate() {
            index.insert(txn.timestamp, i);
        }
        index
    }

    /// Insert one transaction index under its timestamp.
    pub fn insert(&mut self, timestamp: DateTime<Utc>, txn_index: usize) {
        self.entries.insert((timestamp, self.seq), txn_index);
        self.seq += 1;
    }

    /// Transaction indices in non-decreasing timestamp order.
    pub fn in_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.values().copied()
    }

    /// Transaction indices with `start <= timestamp <= end`.
    #[must_use]
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<usize> {
        if start > end {
            return Vec::new();
        }
        self.entries
            .range((start, 0)..=(end, u64::MAX))
            .map(|(_, &i)| i)
            .collect()
    }

    /// Number of indexed transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
