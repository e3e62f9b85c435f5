//! # Draw Engine
//!
//! The single point of contact for callers. Every draw against a pool runs
//! as one critical section under that pool's lock:
//!
//! ```text
//! lock(pool) ──> next = counter + 1
//!                   │
//!                   ▼
//!            pity::adjust(table, next, floor)
//!                   │
//!                   ▼
//!            selector::select(weights, pool)
//!                   │
//!            ┌──────┴───────┐
//!            ▼              ▼
//!      counter = 0     counter = next        (top rarity / anything else)
//!            └──────┬───────┘
//!                   ▼
//!            history.push(record)  ──> unlock(pool) ──> events
//! ```
//!
//! Nothing is written until the selection has fully resolved, so a failed
//! draw leaves the pool untouched. Batches stage their counter and history
//! and commit once at the end.
//!
//! ## Thread Safety
//!
//! `DrawEngine` is `Send + Sync`. Draws on the same pool are serialized by a
//! `parking_lot::Mutex`; draws on different pools never contend. Each pool
//! owns its random stream.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::batch::{self, Rated};
use crate::clock::{Clock, SystemClock};
use crate::config::{DrawSettings, EngineConfig};
use crate::error::{DrawError, DrawResult};
use crate::events::DrawEvent;
use crate::ledger::{DrawRecord, HistoryLedger};
use crate::pity::{self, PityStage};
use crate::pool::{Item, Pool};
use crate::rarity::{Rarity, RarityTable};
use crate::rng::{ChaChaSource, RandomSource};
use crate::schedule;
use crate::selector;
use crate::snapshot::{EngineSnapshot, PoolSnapshot};

/// Result of one draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Pool drawn from.
    pub pool_id: String,
    /// Item to grant.
    pub item: Item,
    /// Whether the featured pickup fired.
    pub featured: bool,
    /// Whether the item is of the pool's top rarity.
    pub top_rarity: bool,
    /// Pity rule in effect for this draw.
    pub stage: PityStage,
    /// Counter the draw was rolled with (including this draw).
    pub pity_counter_at_draw: u32,
    /// Counter after the draw.
    pub pity_counter_after: u32,
    /// When the draw happened.
    pub drawn_at: DateTime<Utc>,
}

impl DrawOutcome {
    fn record(&self) -> DrawRecord {
        DrawRecord {
            item: self.item.clone(),
            featured: self.featured,
            drawn_at: self.drawn_at,
            pity_counter_at_draw: self.pity_counter_at_draw,
        }
    }

    fn events(&self) -> impl Iterator<Item = DrawEvent> {
        let drawn = DrawEvent::Drawn {
            pool_id: self.pool_id.clone(),
            item: self.item.clone(),
            featured: self.featured,
            pity_counter_at_draw: self.pity_counter_at_draw,
        };
        let top = self.top_rarity.then(|| DrawEvent::TopRarityHit {
            pool_id: self.pool_id.clone(),
            item: self.item.clone(),
            pity_counter_at_draw: self.pity_counter_at_draw,
        });
        let featured = self.featured.then(|| DrawEvent::FeaturedHit {
            pool_id: self.pool_id.clone(),
            item: self.item.clone(),
        });
        std::iter::once(drawn).chain(top).chain(featured)
    }
}

impl Rated for DrawOutcome {
    fn rarity(&self) -> Rarity {
        self.item.rarity
    }
}

/// Mutable per-pool state.
#[derive(Debug)]
struct PoolState {
    pity_counter: u32,
    history: HistoryLedger,
    last_free_claim: Option<DateTime<Utc>>,
}

/// Everything guarded by a pool's lock.
struct PoolCell<R> {
    state: PoolState,
    rng: R,
}

/// A registered pool: read-only config plus its locked state.
struct PoolSlot<R> {
    pool: Pool,
    table: RarityTable,
    cell: Mutex<PoolCell<R>>,
}

type RngFactory<R> = Box<dyn Fn(&str) -> R + Send + Sync>;

/// The draw engine.
///
/// Constructed once and shared (usually behind an `Arc`).
///
/// ```rust,ignore
/// let engine = DrawEngine::new(EngineConfig::load("data/draws.toml")?)?;
///
/// let outcome = engine.draw_single("standard")?;
/// inventory.grant(outcome.item);
///
/// let batch = engine.draw_ten("standard")?;
/// ```
pub struct DrawEngine<R: RandomSource = ChaChaSource> {
    settings: DrawSettings,
    pools: RwLock<HashMap<String, Arc<PoolSlot<R>>>>,
    rng_factory: RngFactory<R>,
    clock: Arc<dyn Clock>,
    events: Mutex<Vec<DrawEvent>>,
}

impl DrawEngine<ChaChaSource> {
    /// Creates an engine on the wall clock with ChaCha20 streams.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: EngineConfig) -> DrawResult<Self> {
        let seed = config.settings.seed;
        Self::with_parts(config, Arc::new(SystemClock), move |pool_id| {
            ChaChaSource::for_pool(seed, pool_id)
        })
    }
}

impl<R: RandomSource> DrawEngine<R> {
    /// Creates an engine with an explicit clock and random source factory.
    ///
    /// `rng_factory` is called once per registered pool with the pool id.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if the configuration is invalid.
    pub fn with_parts(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        rng_factory: impl Fn(&str) -> R + Send + Sync + 'static,
    ) -> DrawResult<Self> {
        config.validate()?;
        let EngineConfig { settings, pools } = config;

        let engine = Self {
            settings,
            pools: RwLock::new(HashMap::with_capacity(pools.len())),
            rng_factory: Box::new(rng_factory),
            clock,
            events: Mutex::new(Vec::with_capacity(64)),
        };
        for pool in pools {
            engine.register_pool(pool)?;
        }
        Ok(engine)
    }

    /// Engine-wide settings.
    #[must_use]
    pub const fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    // ========================================================================
    // Pool registry
    // ========================================================================

    /// Registers a pool.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if the pool is invalid or its id
    /// is already registered.
    pub fn register_pool(&self, pool: Pool) -> DrawResult<()> {
        let table = pool.rates.clone().unwrap_or_else(|| self.settings.rates.clone());
        pool.validate(&table)?;

        let mut pools = self.pools.write();
        if pools.contains_key(&pool.id) {
            return Err(DrawError::InvalidConfig(format!(
                "pool {} is already registered",
                pool.id
            )));
        }

        tracing::info!(
            pool = %pool.id,
            kind = ?pool.kind,
            items = pool.items.len(),
            featured = pool.featured.len(),
            top = %table.top(),
            "registered draw pool"
        );

        let slot = PoolSlot {
            cell: Mutex::new(PoolCell {
                state: PoolState {
                    pity_counter: 0,
                    history: HistoryLedger::new(self.settings.history_capacity),
                    last_free_claim: None,
                },
                rng: (self.rng_factory)(&pool.id),
            }),
            table,
            pool,
        };
        pools.insert(slot.pool.id.clone(), Arc::new(slot));
        Ok(())
    }

    /// Removes a pool and its state, returning its configuration.
    pub fn remove_pool(&self, pool_id: &str) -> Option<Pool> {
        let slot = self.pools.write().remove(pool_id)?;
        tracing::info!(pool = %pool_id, "removed draw pool");
        Some(slot.pool.clone())
    }

    /// Configuration of a registered pool.
    #[must_use]
    pub fn pool(&self, pool_id: &str) -> Option<Pool> {
        self.pools.read().get(pool_id).map(|slot| slot.pool.clone())
    }

    /// Ids of every registered pool, sorted.
    #[must_use]
    pub fn pool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pools.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Pools accepting draws right now, sorted by id.
    #[must_use]
    pub fn active_pools(&self) -> Vec<Pool> {
        let now = self.clock.now();
        let mut active: Vec<Pool> = self
            .pools
            .read()
            .values()
            .filter(|slot| slot.pool.window.is_open(now))
            .map(|slot| slot.pool.clone())
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        active
    }

    fn slot(&self, pool_id: &str) -> DrawResult<Arc<PoolSlot<R>>> {
        self.pools
            .read()
            .get(pool_id)
            .cloned()
            .ok_or_else(|| DrawError::UnknownPool(pool_id.to_string()))
    }

    // ========================================================================
    // Draws
    // ========================================================================

    /// One draw with no rarity floor.
    ///
    /// # Errors
    ///
    /// See [`DrawEngine::draw`].
    pub fn draw_single(&self, pool_id: &str) -> DrawResult<DrawOutcome> {
        self.draw(pool_id, Rarity::FLOOR)
    }

    /// One draw that never returns below `min_rarity`.
    ///
    /// # Errors
    ///
    /// - [`DrawError::UnknownPool`] if the pool is not registered
    /// - [`DrawError::InactivePool`] outside the pool's activity window
    /// - [`DrawError::EmptyPool`] if the pool has no items
    /// - [`DrawError::Misconfigured`] if no weight exists at or above the floor
    pub fn draw(&self, pool_id: &str, min_rarity: Rarity) -> DrawResult<DrawOutcome> {
        let slot = self.slot(pool_id)?;
        let now = self.clock.now();

        let outcome = {
            let mut cell = slot.cell.lock();
            Self::ensure_open(&slot, now)?;
            let PoolCell { state, rng } = &mut *cell;
            let outcome = self.resolve(&slot, rng, state.pity_counter, min_rarity, now)?;
            Self::commit(state, std::slice::from_ref(&outcome));
            outcome
        };

        self.publish(outcome.events());
        Ok(outcome)
    }

    /// The configured batch: `batch.size` draws with `batch.guarantee`.
    ///
    /// # Errors
    ///
    /// See [`DrawEngine::draw_batch`].
    pub fn draw_ten(&self, pool_id: &str) -> DrawResult<Vec<DrawOutcome>> {
        let batch = self.settings.batch;
        self.draw_batch(pool_id, batch.size, batch.guarantee)
    }

    /// `n` draws; the last carries `guarantee` as its floor unless an earlier
    /// draw already met it.
    ///
    /// The pool stays locked for the whole batch and nothing is committed
    /// unless every draw succeeds.
    ///
    /// # Errors
    ///
    /// See [`DrawEngine::draw`].
    pub fn draw_batch(
        &self,
        pool_id: &str,
        n: usize,
        guarantee: Option<Rarity>,
    ) -> DrawResult<Vec<DrawOutcome>> {
        let slot = self.slot(pool_id)?;
        let now = self.clock.now();

        let outcomes = {
            let mut cell = slot.cell.lock();
            Self::ensure_open(&slot, now)?;
            let PoolCell { state, rng } = &mut *cell;

            let mut counter = state.pity_counter;
            let outcomes = batch::draw_batch(n, guarantee, |floor| {
                let outcome = self.resolve(&slot, &mut *rng, counter, floor, now)?;
                counter = outcome.pity_counter_after;
                Ok(outcome)
            })?;
            Self::commit(state, &outcomes);
            outcomes
        };

        tracing::debug!(pool = %pool_id, draws = outcomes.len(), "batch complete");
        self.publish(outcomes.iter().flat_map(DrawOutcome::events));
        self.publish(std::iter::once(DrawEvent::BatchCompleted {
            pool_id: pool_id.to_string(),
            draws: outcomes.len(),
        }));
        Ok(outcomes)
    }

    /// Claims the daily free draw.
    ///
    /// # Errors
    ///
    /// - [`DrawError::NotEligible`] if the pool offers no free draw or it was
    ///   already claimed since the last reset
    /// - anything [`DrawEngine::draw`] can return
    pub fn draw_free(&self, pool_id: &str) -> DrawResult<DrawOutcome> {
        let slot = self.slot(pool_id)?;
        let now = self.clock.now();

        let outcome = {
            let mut cell = slot.cell.lock();
            Self::ensure_open(&slot, now)?;
            let PoolCell { state, rng } = &mut *cell;

            if !slot.pool.daily_free_draw
                || !schedule::can_claim(state.last_free_claim, now, &self.settings.free_draw)
            {
                return Err(DrawError::NotEligible(pool_id.to_string()));
            }

            let outcome = self.resolve(&slot, rng, state.pity_counter, Rarity::FLOOR, now)?;
            Self::commit(state, std::slice::from_ref(&outcome));
            state.last_free_claim = Some(now);
            outcome
        };

        tracing::info!(pool = %pool_id, item = outcome.item.id, "daily free draw claimed");
        self.publish(outcome.events());
        self.publish(std::iter::once(DrawEvent::FreeDrawClaimed {
            pool_id: pool_id.to_string(),
            claimed_at: now,
        }));
        Ok(outcome)
    }

    /// Whether the daily free draw can be claimed now.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::UnknownPool`] if the pool is not registered.
    pub fn can_claim_free(&self, pool_id: &str) -> DrawResult<bool> {
        let slot = self.slot(pool_id)?;
        let now = self.clock.now();
        let last = slot.cell.lock().state.last_free_claim;
        Ok(slot.pool.daily_free_draw
            && slot.pool.window.is_open(now)
            && schedule::can_claim(last, now, &self.settings.free_draw))
    }

    /// Next daily reset after now.
    #[must_use]
    pub fn next_free_reset(&self) -> DateTime<Utc> {
        schedule::next_reset(self.clock.now(), &self.settings.free_draw)
    }

    fn ensure_open(slot: &PoolSlot<R>, now: DateTime<Utc>) -> DrawResult<()> {
        if slot.pool.window.is_open(now) {
            Ok(())
        } else {
            tracing::warn!(pool = %slot.pool.id, %now, "draw rejected outside activity window");
            Err(DrawError::InactivePool(slot.pool.id.clone()))
        }
    }

    /// Resolves one draw without touching pool state.
    fn resolve(
        &self,
        slot: &PoolSlot<R>,
        rng: &mut R,
        counter: u32,
        floor: Rarity,
        now: DateTime<Utc>,
    ) -> DrawResult<DrawOutcome> {
        let next = counter.saturating_add(1);
        let weights = pity::adjust(&slot.table, next, floor, &self.settings.pity)
            .map_err(|e| e.for_pool(&slot.pool.id))?;
        let selection =
            selector::select(&weights, &slot.pool, self.settings.pickup_rate, rng)?;

        let top_rarity = selection.item.rarity == weights.top();
        let outcome = DrawOutcome {
            pool_id: slot.pool.id.clone(),
            item: selection.item,
            featured: selection.featured,
            top_rarity,
            stage: weights.stage(),
            pity_counter_at_draw: next,
            pity_counter_after: if top_rarity { 0 } else { next },
            drawn_at: now,
        };

        if top_rarity {
            tracing::info!(
                pool = %outcome.pool_id,
                item = outcome.item.id,
                pity = next,
                featured = outcome.featured,
                stage = ?outcome.stage,
                "top rarity drawn, pity reset"
            );
        } else {
            tracing::debug!(
                pool = %outcome.pool_id,
                item = outcome.item.id,
                rarity = %outcome.item.rarity,
                pity = next,
                "draw resolved"
            );
        }
        Ok(outcome)
    }

    fn commit(state: &mut PoolState, outcomes: &[DrawOutcome]) {
        for outcome in outcomes {
            state.pity_counter = outcome.pity_counter_after;
            state.history.push(outcome.record());
        }
    }

    // ========================================================================
    // Pity and history
    // ========================================================================

    /// Draws since the last top-rarity result.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::UnknownPool`] if the pool is not registered.
    pub fn pity_counter(&self, pool_id: &str) -> DrawResult<u32> {
        Ok(self.slot(pool_id)?.cell.lock().state.pity_counter)
    }

    /// Draws left until the hard guarantee.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::UnknownPool`] if the pool is not registered.
    pub fn pity_remaining(&self, pool_id: &str) -> DrawResult<u32> {
        let counter = self.pity_counter(pool_id)?;
        Ok(self.settings.pity.remaining(counter))
    }

    /// Administrative reset of the pity counter.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::UnknownPool`] if the pool is not registered.
    pub fn reset_pity_counter(&self, pool_id: &str) -> DrawResult<()> {
        let slot = self.slot(pool_id)?;
        let previous = std::mem::take(&mut slot.cell.lock().state.pity_counter);
        tracing::info!(pool = %pool_id, previous, "pity counter reset by administrator");
        self.publish(std::iter::once(DrawEvent::PityCounterReset {
            pool_id: pool_id.to_string(),
            previous,
        }));
        Ok(())
    }

    /// Recent draws, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::UnknownPool`] if the pool is not registered.
    pub fn history(&self, pool_id: &str) -> DrawResult<Vec<DrawRecord>> {
        Ok(self.slot(pool_id)?.cell.lock().state.history.to_vec())
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn publish(&self, events: impl IntoIterator<Item = DrawEvent>) {
        self.events.lock().extend(events);
    }

    /// Drains all pending events.
    pub fn drain_events(&self) -> Vec<DrawEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.lock().len()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Exports the persistent state of every pool.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let pools = self
            .pools
            .read()
            .iter()
            .map(|(id, slot)| {
                let cell = slot.cell.lock();
                let snapshot = PoolSnapshot {
                    pity_counter: cell.state.pity_counter,
                    last_free_claim: cell.state.last_free_claim,
                    history: cell.state.history.to_vec(),
                };
                (id.clone(), snapshot)
            })
            .collect();
        EngineSnapshot { pools }
    }

    /// Restores persistent state. Pools not registered are skipped.
    ///
    /// Returns the number of pools restored.
    pub fn restore(&self, snapshot: &EngineSnapshot) -> usize {
        let pools = self.pools.read();
        let mut restored = 0;
        for (id, saved) in &snapshot.pools {
            let Some(slot) = pools.get(id) else {
                tracing::warn!(pool = %id, "snapshot references an unknown pool, skipping");
                continue;
            };
            let mut cell = slot.cell.lock();
            cell.state.pity_counter = saved.pity_counter;
            cell.state.last_free_claim = saved.last_free_claim;
            cell.state.history.replace(saved.history.iter().cloned());
            restored += 1;
        }
        tracing::info!(restored, "restored draw state");
        restored
    }
}

// Thread safety:
// - RwLock for the pool registry (writes only on register/remove)
// - one Mutex per pool for counter, history, free-draw claim and RNG
// - Mutex for the event buffer, never taken while a pool lock is held
