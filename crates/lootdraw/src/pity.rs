//! # Pity Adjustment
//!
//! Turns a base [`RarityTable`] plus the pool's pity counter into the weights
//! actually rolled against.
//!
//! Precedence is strict:
//!
//! ```text
//! counter >= hard_pity_count   -> top rarity forced (weight 1, all others 0)
//! counter >= soft_pity_start   -> top += bonus, others -= bonus / (n - 1), floored at 0
//! otherwise                    -> base table
//! ```
//!
//! The floor is applied per rarity and the clipped excess is dropped, not
//! redistributed. Once a tier bottoms out the adjusted total no longer equals
//! the base total; selection normalizes by whatever total it is handed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DrawError, DrawResult};
use crate::rarity::{Rarity, RarityTable};

/// Pity tuning for a pool.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PityConfig {
    /// Draw count at which the top rarity is forced.
    pub hard_pity_count: u32,
    /// Draw count at which the soft ramp begins.
    pub soft_pity_start: u32,
    /// Weight added to the top rarity per draw past `soft_pity_start`.
    pub soft_pity_rate_increase: f64,
}

impl PityConfig {
    /// Validates the tuning values.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if `hard_pity_count` is zero or
    /// the rate increase is negative or not finite.
    pub fn validate(&self) -> DrawResult<()> {
        if self.hard_pity_count == 0 {
            return Err(DrawError::InvalidConfig(
                "hard_pity_count must be at least 1".to_string(),
            ));
        }
        if !self.soft_pity_rate_increase.is_finite() || self.soft_pity_rate_increase < 0.0 {
            return Err(DrawError::InvalidConfig(format!(
                "soft_pity_rate_increase must be finite and non-negative, got {}",
                self.soft_pity_rate_increase
            )));
        }
        if self.soft_pity_start > self.hard_pity_count {
            tracing::warn!(
                soft_pity_start = self.soft_pity_start,
                hard_pity_count = self.hard_pity_count,
                "soft pity starts after hard pity and will never engage"
            );
        }
        Ok(())
    }

    /// Draws remaining until the hard guarantee, given the current counter.
    #[must_use]
    pub const fn remaining(&self, counter: u32) -> u32 {
        self.hard_pity_count.saturating_sub(counter)
    }
}

impl Default for PityConfig {
    fn default() -> Self {
        Self {
            hard_pity_count: 90,
            soft_pity_start: 75,
            soft_pity_rate_increase: 0.06,
        }
    }
}

/// Which pity rule produced a set of weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PityStage {
    /// Base table, no pity engaged.
    Base,
    /// Soft ramp active.
    Soft,
    /// Hard guarantee active.
    Hard,
}

/// Weights rolled against for a single draw.
#[derive(Clone, Debug, PartialEq)]
pub struct AdjustedWeights {
    weights: BTreeMap<Rarity, f64>,
    top: Rarity,
    stage: PityStage,
}

impl AdjustedWeights {
    /// Weight for a rarity (0 when absent).
    #[must_use]
    pub fn get(&self, rarity: Rarity) -> f64 {
        self.weights.get(&rarity).copied().unwrap_or(0.0)
    }

    /// Tiers in descending rarity order, the selection walk order.
    pub fn descending(&self) -> impl Iterator<Item = (Rarity, f64)> + '_ {
        self.weights.iter().rev().map(|(r, w)| (*r, *w))
    }

    /// Sum of all weights, accumulated in descending order.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.descending().map(|(_, w)| w).sum()
    }

    /// Top rarity of the underlying table.
    #[must_use]
    pub const fn top(&self) -> Rarity {
        self.top
    }

    /// Pity rule that produced these weights.
    #[must_use]
    pub const fn stage(&self) -> PityStage {
        self.stage
    }

    /// Lowest tier present.
    #[must_use]
    pub fn floor(&self) -> Rarity {
        self.weights.keys().next().copied().unwrap_or(self.top)
    }
}

/// Computes the adjusted weights for a draw.
///
/// `counter` is the draw number including the draw being made.
///
/// # Errors
///
/// Returns [`DrawError::NoWeightAtFloor`] if the table has no positive
/// weight at or above `min_rarity`.
pub fn adjust(
    table: &RarityTable,
    counter: u32,
    min_rarity: Rarity,
    cfg: &PityConfig,
) -> DrawResult<AdjustedWeights> {
    let top = table.top();
    let mut weights: BTreeMap<Rarity, f64> = table.at_or_above(min_rarity).collect();

    if weights.is_empty() || !weights.values().any(|w| *w > 0.0) {
        return Err(DrawError::NoWeightAtFloor(min_rarity));
    }

    if counter >= cfg.hard_pity_count {
        for (rarity, weight) in &mut weights {
            *weight = if *rarity == top { 1.0 } else { 0.0 };
        }
        return Ok(AdjustedWeights {
            weights,
            top,
            stage: PityStage::Hard,
        });
    }

    if counter >= cfg.soft_pity_start {
        let steps = counter - cfg.soft_pity_start + 1;
        let bonus = f64::from(steps) * cfg.soft_pity_rate_increase;
        let others = weights.len() - 1;

        if let Some(top_weight) = weights.get_mut(&top) {
            *top_weight += bonus;
        }
        if others > 0 {
            #[allow(clippy::cast_precision_loss)]
            let reduction = bonus / others as f64;
            for (rarity, weight) in &mut weights {
                if *rarity != top {
                    *weight = (*weight - reduction).max(0.0);
                }
            }
        }
        return Ok(AdjustedWeights {
            weights,
            top,
            stage: PityStage::Soft,
        });
    }

    Ok(AdjustedWeights {
        weights,
        top,
        stage: PityStage::Base,
    })
}
