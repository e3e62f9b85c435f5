//! Monte-Carlo balance statistics.
//!
//! Runs a pool through the same adjust/select pipeline the engine uses,
//! tracking the pity counter locally, and tallies what comes out. Used to
//! check configured rates before they ship.

use std::collections::{BTreeMap, HashMap};

use crate::config::DrawSettings;
use crate::error::DrawResult;
use crate::pity;
use crate::pool::{ItemId, Pool};
use crate::rarity::Rarity;
use crate::rng::RandomSource;
use crate::selector;

/// Statistics from a draw simulation.
#[derive(Clone, Debug, Default)]
pub struct DrawStatistics {
    /// Total number of draws performed.
    pub total_draws: u64,
    /// Draw counts by rarity.
    pub rarity_counts: BTreeMap<Rarity, u64>,
    /// Draw counts by item id.
    pub item_counts: HashMap<ItemId, u64>,
    /// Top-rarity results.
    pub top_rarity_hits: u64,
    /// Top-rarity results that went to a featured item.
    pub featured_hits: u64,
    /// Longest run of draws it took to reach the top rarity.
    pub longest_pity: u32,
}

impl DrawStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of draws at `rarity`, as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rarity_percent(&self, rarity: Rarity) -> f64 {
        if self.total_draws == 0 {
            return 0.0;
        }
        let count = self.rarity_counts.get(&rarity).copied().unwrap_or(0);
        (count as f64 / self.total_draws as f64) * 100.0
    }

    /// Average draws per top-rarity result.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_draws_per_top(&self) -> Option<f64> {
        (self.top_rarity_hits > 0).then(|| self.total_draws as f64 / self.top_rarity_hits as f64)
    }
}

/// Simulates `draws` single draws against `pool` with `settings`.
///
/// The pool's own rate override wins over `settings.rates`.
///
/// # Errors
///
/// Returns the first error a draw would have raised (for example an empty
/// pool).
pub fn simulate(
    pool: &Pool,
    settings: &DrawSettings,
    draws: u64,
    rng: &mut dyn RandomSource,
) -> DrawResult<DrawStatistics> {
    let table = pool.rates.as_ref().unwrap_or(&settings.rates);
    let mut stats = DrawStatistics::new();
    let mut counter = 0u32;

    for _ in 0..draws {
        let next = counter.saturating_add(1);
        let weights = pity::adjust(table, next, Rarity::FLOOR, &settings.pity)
            .map_err(|e| e.for_pool(&pool.id))?;
        let selection = selector::select(&weights, pool, settings.pickup_rate, rng)?;
        let rarity = selection.item.rarity;

        stats.total_draws += 1;
        *stats.rarity_counts.entry(rarity).or_insert(0) += 1;
        *stats.item_counts.entry(selection.item.id).or_insert(0) += 1;

        if rarity == weights.top() {
            stats.top_rarity_hits += 1;
            stats.featured_hits += u64::from(selection.featured);
            stats.longest_pity = stats.longest_pity.max(next);
            counter = 0;
        } else {
            counter = next;
        }
    }

    tracing::debug!(
        pool = %pool.id,
        draws,
        top_hits = stats.top_rarity_hits,
        longest_pity = stats.longest_pity,
        "simulation complete"
    );
    Ok(stats)
}
