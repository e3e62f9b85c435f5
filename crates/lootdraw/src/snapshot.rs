//! # Persistent State Snapshots
//!
//! The pity counter and the free-draw claim time are the only state that
//! must survive a session. The host exports a snapshot, stores it however
//! it likes, and restores it on the next start. History rides along but is
//! optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DrawError, DrawResult};
use crate::ledger::DrawRecord;

/// Persistent state of one pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Draws since the last top-rarity result.
    #[serde(default)]
    pub pity_counter: u32,
    /// Last daily free draw claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_free_claim: Option<DateTime<Utc>>,
    /// Recent draws, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<DrawRecord>,
}

/// Persistent state of every pool, keyed by pool id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Per-pool state.
    #[serde(default)]
    pub pools: BTreeMap<String, PoolSnapshot>,
}

impl EngineSnapshot {
    /// Encodes the snapshot as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::Snapshot`] if encoding fails.
    pub fn to_toml(&self) -> DrawResult<String> {
        toml::to_string(self).map_err(|e| DrawError::Snapshot(e.to_string()))
    }

    /// Decodes a snapshot from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::Snapshot`] if decoding fails.
    pub fn from_toml(text: &str) -> DrawResult<Self> {
        toml::from_str(text).map_err(|e| DrawError::Snapshot(e.to_string()))
    }

    /// Drops history from every pool, leaving only the required state.
    #[must_use]
    pub fn without_history(mut self) -> Self {
        for pool in self.pools.values_mut() {
            pool.history.clear();
        }
        self
    }
}
