//! # Draw History
//!
//! Bounded per-pool ring buffer of recent draws. Advisory only; the pity
//! counter is the source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::pool::Item;

/// Default number of records kept per pool.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One entry in the history ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// The item drawn.
    pub item: Item,
    /// Whether the featured pickup fired.
    #[serde(default)]
    pub featured: bool,
    /// When the draw happened.
    pub drawn_at: DateTime<Utc>,
    /// Pity counter the draw was rolled with (including this draw).
    pub pity_counter_at_draw: u32,
}

/// Ring buffer of draw records; the oldest entry is evicted first.
#[derive(Clone, Debug)]
pub struct HistoryLedger {
    records: VecDeque<DrawRecord>,
    capacity: usize,
}

impl HistoryLedger {
    /// Creates an empty ledger. A zero capacity is raised to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest when full.
    pub fn push(&mut self, record: DrawRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<DrawRecord> {
        self.records.iter().cloned().collect()
    }

    /// Iterates records oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DrawRecord> + '_ {
        self.records.iter()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replaces the contents, keeping only the newest `capacity` records.
    pub fn replace(&mut self, records: impl IntoIterator<Item = DrawRecord>) {
        self.records.clear();
        for record in records {
            self.push(record);
        }
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
