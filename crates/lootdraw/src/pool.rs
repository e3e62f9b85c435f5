//! # Pools and Items
//!
//! Configuration data for a draw pool. Loaded once, validated on
//! registration, then treated as read-only by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{DrawError, DrawResult};
use crate::rarity::{Rarity, RarityTable};

/// Unique identifier for an item.
pub type ItemId = u32;

/// An obtainable item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the pool.
    pub id: ItemId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Rarity tier.
    pub rarity: Rarity,
}

impl Item {
    /// Creates a new item.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, rarity: Rarity) -> Self {
        Self {
            id,
            name: name.into(),
            rarity,
        }
    }
}

/// Banner category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Always-available pool.
    #[default]
    Normal,
    /// Premium-currency pool.
    Premium,
    /// Time-limited pool.
    Limited,
    /// Zero-cost pool.
    Free,
}

/// When a pool accepts draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityWindow {
    /// Master switch.
    #[serde(default = "default_true")]
    pub active: bool,
    /// First instant draws are accepted (inclusive).
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Last instant draws are accepted (inclusive).
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl ActivityWindow {
    /// A window that is always open.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            active: true,
            starts_at: None,
            ends_at: None,
        }
    }

    /// A window open between two instants.
    #[must_use]
    pub const fn between(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            active: true,
            starts_at: Some(starts_at),
            ends_at: Some(ends_at),
        }
    }

    /// Whether draws are accepted at `now`.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.map_or(true, |start| now >= start)
            && self.ends_at.map_or(true, |end| now <= end)
    }
}

impl Default for ActivityWindow {
    fn default() -> Self {
        Self::always()
    }
}

/// Price of a draw, for the currency collaborator. The engine never charges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCost {
    /// Currency identifier, e.g. `"gold"` or `"gem"`.
    pub currency: String,
    /// Price of a single draw.
    pub single: u32,
    /// Price of a full batch.
    pub batch: u32,
}

/// A named, configured set of obtainable items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Pool identity.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Banner category.
    #[serde(default)]
    pub kind: PoolKind,
    /// Obtainable items, in configuration order.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Ids of top-rarity items that receive the pickup bias.
    #[serde(default)]
    pub featured: Vec<ItemId>,
    /// Activity window.
    #[serde(flatten)]
    pub window: ActivityWindow,
    /// Whether a daily free draw is offered.
    #[serde(default)]
    pub daily_free_draw: bool,
    /// Price metadata.
    #[serde(default)]
    pub cost: Option<DrawCost>,
    /// Rate override; the engine-wide table applies when absent.
    #[serde(default)]
    pub rates: Option<RarityTable>,
}

impl Pool {
    /// Creates an always-open normal pool.
    #[must_use]
    pub fn new(id: impl Into<String>, items: Vec<Item>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: PoolKind::Normal,
            items,
            featured: Vec::new(),
            window: ActivityWindow::always(),
            daily_free_draw: false,
            cost: None,
            rates: None,
        }
    }

    /// Sets the featured item ids.
    #[must_use]
    pub fn with_featured(mut self, featured: Vec<ItemId>) -> Self {
        self.featured = featured;
        self
    }

    /// Sets the activity window.
    #[must_use]
    pub fn with_window(mut self, window: ActivityWindow) -> Self {
        self.window = window;
        self
    }

    /// Enables or disables the daily free draw.
    #[must_use]
    pub fn with_daily_free_draw(mut self, enabled: bool) -> Self {
        self.daily_free_draw = enabled;
        self
    }

    /// Sets the pool kind.
    #[must_use]
    pub fn with_kind(mut self, kind: PoolKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets a rate override.
    #[must_use]
    pub fn with_rates(mut self, rates: RarityTable) -> Self {
        self.rates = Some(rates);
        self
    }

    /// Items of one rarity tier.
    pub fn items_of(&self, rarity: Rarity) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().filter(move |item| item.rarity == rarity)
    }

    /// Whether any item of the tier exists.
    #[must_use]
    pub fn has_tier(&self, rarity: Rarity) -> bool {
        self.items_of(rarity).next().is_some()
    }

    /// Looks up an item by id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Featured items, in configuration order.
    pub fn featured_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.featured.iter().filter_map(|id| self.item(*id))
    }

    /// Checks pool invariants against the table that will be rolled.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] on an empty id, duplicate item
    /// ids, a featured id that is not in the pool, a featured item that is
    /// not of the table's top rarity, or a non-empty pool with no item of the
    /// top rarity (hard pity could never reset).
    pub fn validate(&self, table: &RarityTable) -> DrawResult<()> {
        if self.id.trim().is_empty() {
            return Err(DrawError::InvalidConfig("pool id must not be empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(DrawError::InvalidConfig(format!(
                    "pool {}: duplicate item id {}",
                    self.id, item.id
                )));
            }
        }

        let top = table.top();
        for id in &self.featured {
            let Some(item) = self.item(*id) else {
                return Err(DrawError::InvalidConfig(format!(
                    "pool {}: featured item {id} is not in the pool",
                    self.id
                )));
            };
            if item.rarity != top {
                return Err(DrawError::InvalidConfig(format!(
                    "pool {}: featured item {id} is {} but the top rarity is {top}",
                    self.id, item.rarity
                )));
            }
        }

        if let (Some(start), Some(end)) = (self.window.starts_at, self.window.ends_at) {
            if start > end {
                return Err(DrawError::InvalidConfig(format!(
                    "pool {}: window starts after it ends",
                    self.id
                )));
            }
        }

        if !self.items.is_empty() && !self.has_tier(top) {
            return Err(DrawError::InvalidConfig(format!(
                "pool {}: no {top} items, the pity counter could never reset",
                self.id
            )));
        }

        for (rarity, weight) in table.iter() {
            if weight > 0.0 && !self.has_tier(rarity) && !self.items.is_empty() {
                tracing::warn!(
                    pool = %self.id,
                    %rarity,
                    "pool has no items for a weighted tier; draws will fall back"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_pool() -> Pool {
        Pool::new(
            "standard",
            vec![
                Item::new(1, "Squire", Rarity::Common),
                Item::new(2, "Archer", Rarity::Rare),
                Item::new(3, "Dragon Knight", Rarity::Legendary),
                Item::new(4, "Storm Queen", Rarity::Legendary),
            ],
        )
    }

    #[test]
    fn test_items_of_tier() {
        let pool = create_test_pool();
        let legendary: Vec<_> = pool.items_of(Rarity::Legendary).map(|i| i.id).collect();
        assert_eq!(legendary, vec![3, 4]);
        assert!(!pool.has_tier(Rarity::Epic));
    }

    #[test]
    fn test_validate_featured_subset() {
        let table = RarityTable::standard();
        assert!(create_test_pool().with_featured(vec![4]).validate(&table).is_ok());
        assert!(create_test_pool().with_featured(vec![99]).validate(&table).is_err());
        assert!(create_test_pool().with_featured(vec![2]).validate(&table).is_err());
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let mut pool = create_test_pool();
        pool.items.push(Item::new(1, "Clone", Rarity::Common));
        assert!(pool.validate(&RarityTable::standard()).is_err());
    }

    #[test]
    fn test_window() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        let window = ActivityWindow::between(start, end);

        assert!(window.is_open(start));
        assert!(window.is_open(end));
        assert!(!window.is_open(end + chrono::Duration::seconds(1)));
        assert!(!window.is_open(start - chrono::Duration::seconds(1)));

        let closed = ActivityWindow {
            active: false,
            ..ActivityWindow::always()
        };
        assert!(!closed.is_open(start));
    }

    #[test]
    fn test_validate_requires_top_rarity_item() {
        let pool = Pool::new(
            "no_legendary",
            vec![
                Item::new(1, "Squire", Rarity::Common),
                Item::new(2, "Scout", Rarity::Uncommon),
                Item::new(3, "Archer", Rarity::Rare),
                Item::new(4, "Paladin", Rarity::Epic),
            ],
        );
        assert!(matches!(
            pool.validate(&RarityTable::standard()),
            Err(DrawError::InvalidConfig(_))
        ));

        // Top rarity follows the table, so an Epic-capped table accepts it.
        let capped = RarityTable::new([
            (Rarity::Common, 0.6),
            (Rarity::Uncommon, 0.25),
            (Rarity::Rare, 0.1),
            (Rarity::Epic, 0.05),
        ])
        .unwrap();
        assert!(pool.validate(&capped).is_ok());

        // An empty pool is rejected at draw time instead.
        assert!(Pool::new("empty", vec![]).validate(&RarityTable::standard()).is_ok());
    }

    #[test]
    fn test_kind_from_toml() {
        let pool = create_test_pool().with_kind(PoolKind::Premium);
        let parsed: Pool = toml::from_str(
            r#"
                id = "standard"
                kind = "premium"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.kind, pool.kind);
        assert_eq!(Pool::new("plain", vec![]).kind, PoolKind::Normal);
    }
}
