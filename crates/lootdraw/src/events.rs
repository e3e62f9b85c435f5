//! Draw events for the notification layer.
//!
//! The engine buffers events; consumers drain them when convenient. Events
//! are display-only and carry no authority.

use chrono::{DateTime, Utc};

use crate::pool::Item;

/// Something the notification layer may want to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawEvent {
    /// A single draw resolved.
    Drawn {
        /// Pool drawn from.
        pool_id: String,
        /// Item drawn.
        item: Item,
        /// Whether the featured pickup fired.
        featured: bool,
        /// Counter the draw was rolled with.
        pity_counter_at_draw: u32,
    },
    /// A top-rarity item was drawn and the pity counter reset.
    TopRarityHit {
        /// Pool drawn from.
        pool_id: String,
        /// Item drawn.
        item: Item,
        /// Draws it took.
        pity_counter_at_draw: u32,
    },
    /// The featured pickup fired.
    FeaturedHit {
        /// Pool drawn from.
        pool_id: String,
        /// Featured item granted.
        item: Item,
    },
    /// A batch completed.
    BatchCompleted {
        /// Pool drawn from.
        pool_id: String,
        /// Number of draws in the batch.
        draws: usize,
    },
    /// A daily free draw was claimed.
    FreeDrawClaimed {
        /// Pool drawn from.
        pool_id: String,
        /// When it was claimed.
        claimed_at: DateTime<Utc>,
    },
    /// The pity counter was reset by an administrator.
    PityCounterReset {
        /// Pool affected.
        pool_id: String,
        /// Counter before the reset.
        previous: u32,
    },
}
