//! # LOOTDRAW Draw Engine
//!
//! Server-side randomized reward draws: rarity tables, pity counters, batch
//! guarantees and daily free draws.
//!
//! ## Design Principles
//!
//! 1. **Authoritative** - every draw resolves here; clients only display results
//! 2. **Replayable** - all randomness flows through a per-pool seeded stream
//! 3. **All-or-nothing** - a failed draw or batch leaves pool state untouched
//! 4. **External configuration** - rates, pity and pools live in TOML files
//!
//! ## Thread Safety
//!
//! [`DrawEngine`] is shared between request handlers. Draws on one pool are
//! serialized; different pools never contend.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lootdraw::{DrawEngine, EngineConfig};
//!
//! let engine = DrawEngine::new(EngineConfig::load("data/draws.toml")?)?;
//!
//! let single = engine.draw_single("standard")?;
//! let ten = engine.draw_ten("standard")?;
//!
//! if engine.can_claim_free("standard")? {
//!     let free = engine.draw_free("standard")?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod batch;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod pity;
pub mod pool;
pub mod rarity;
pub mod rng;
pub mod schedule;
pub mod selector;
pub mod snapshot;
pub mod stats;

pub use batch::{BatchConfig, Rated};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DrawSettings, EngineConfig};
pub use engine::{DrawEngine, DrawOutcome};
pub use error::{DrawError, DrawResult};
pub use events::DrawEvent;
pub use ledger::{DrawRecord, HistoryLedger};
pub use pity::{AdjustedWeights, PityConfig, PityStage};
pub use pool::{ActivityWindow, DrawCost, Item, ItemId, Pool, PoolKind};
pub use rarity::{Rarity, RarityTable};
pub use rng::{ChaChaSource, RandomSource, SequenceSource};
pub use schedule::ResetSchedule;
pub use selector::Selection;
pub use snapshot::{EngineSnapshot, PoolSnapshot};
pub use stats::DrawStatistics;
