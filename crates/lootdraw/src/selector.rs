//! # Item Selection
//!
//! Resolves adjusted weights into a concrete item in two steps: rarity tier,
//! then item within the tier.
//!
//! ## Tier roll
//!
//! ```text
//!   u in [0, 1)          r = (1 - u) * total, r in (0, total]
//!
//!   |-- Legendary --|-- Epic --|---- Rare ----|----- ... -----|
//!   0                                                      total
//! ```
//!
//! Tiers are walked in descending rarity and the first tier whose cumulative
//! weight reaches `r` wins. Rounding error therefore lands on the lowest
//! tiers, and a zero-weight tier is never picked.

use crate::error::{DrawError, DrawResult};
use crate::pity::AdjustedWeights;
use crate::pool::{Item, Pool};
use crate::rarity::Rarity;
use crate::rng::RandomSource;

/// A resolved draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// The item drawn.
    pub item: Item,
    /// The tier the roll landed on, before any empty-tier fallback.
    pub tier: Rarity,
    /// Whether the featured pickup fired.
    pub featured: bool,
}

/// Rolls a rarity tier against the weights.
#[must_use]
pub fn roll_tier(weights: &AdjustedWeights, rng: &mut dyn RandomSource) -> Rarity {
    let total = weights.total();
    let r = (1.0 - rng.next_unit()) * total;

    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (rarity, weight) in weights.descending() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(rarity);
        if cumulative >= r {
            return rarity;
        }
    }

    // r == total with cumulative rounding short of it
    last_positive.unwrap_or_else(|| weights.floor())
}

/// Selects an item from the pool.
///
/// # Errors
///
/// Returns [`DrawError::EmptyPool`] if the pool has no items at all.
pub fn select(
    weights: &AdjustedWeights,
    pool: &Pool,
    pickup_rate: f64,
    rng: &mut dyn RandomSource,
) -> DrawResult<Selection> {
    if pool.items.is_empty() {
        return Err(DrawError::EmptyPool(pool.id.clone()));
    }

    let tier = roll_tier(weights, rng);

    if tier == weights.top() && !pool.featured.is_empty() && rng.next_unit() < pickup_rate {
        let featured: Vec<&Item> = pool.featured_items().collect();
        if !featured.is_empty() {
            let item = featured[rng.next_index(featured.len())].clone();
            return Ok(Selection {
                item,
                tier,
                featured: true,
            });
        }
    }

    let resolved = resolve_tier(pool, tier, weights.floor())
        .ok_or_else(|| DrawError::EmptyPool(pool.id.clone()))?;
    if resolved != tier {
        tracing::warn!(
            pool = %pool.id,
            rolled = %tier,
            %resolved,
            "no items in rolled tier, falling back"
        );
    }

    let candidates: Vec<&Item> = pool.items_of(resolved).collect();
    let item = candidates[rng.next_index(candidates.len())].clone();
    Ok(Selection {
        item,
        tier,
        featured: false,
    })
}

/// Finds the tier to draw from when `tier` may be empty.
///
/// Order: `tier` itself, lower tiers down to `floor`, higher tiers, then
/// tiers below `floor`.
fn resolve_tier(pool: &Pool, tier: Rarity, floor: Rarity) -> Option<Rarity> {
    let down = Rarity::ALL
        .into_iter()
        .rev()
        .filter(|r| *r <= tier && *r >= floor);
    let up = Rarity::ALL.into_iter().filter(|r| *r > tier);
    let below_floor = Rarity::ALL.into_iter().rev().filter(|r| *r < floor && *r <= tier);

    down.chain(up)
        .chain(below_floor)
        .find(|r| pool.has_tier(*r))
}
