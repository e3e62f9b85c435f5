//! # Engine Configuration
//!
//! All balance data lives in external TOML files and is loaded once at
//! startup.
//!
//! ```toml
//! seed = 42
//! pickup_rate = 0.5
//! history_capacity = 100
//!
//! [rates]
//! common = 0.49
//! uncommon = 0.30
//! rare = 0.15
//! epic = 0.05
//! legendary = 0.01
//!
//! [pity]
//! hard_pity_count = 90
//! soft_pity_start = 75
//! soft_pity_rate_increase = 0.06
//!
//! [batch]
//! size = 10
//! guarantee = "rare"
//!
//! [free_draw]
//! reset_hour = 5
//! utc_offset_minutes = 0
//!
//! [[pools]]
//! id = "standard"
//! name = "Standard Recruitment"
//! daily_free_draw = true
//! featured = [5]
//! items = [
//!     { id = 1, name = "Squire", rarity = "common" },
//!     { id = 5, name = "Dragon Knight", rarity = "legendary" },
//! ]
//! ```
//!
//! Timestamps (`starts_at`, `ends_at`) are RFC 3339 strings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::batch::BatchConfig;
use crate::error::{DrawError, DrawResult};
use crate::ledger::DEFAULT_HISTORY_CAPACITY;
use crate::pity::PityConfig;
use crate::pool::Pool;
use crate::rarity::RarityTable;
use crate::schedule::ResetSchedule;

/// Engine-wide tuning shared by every pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    /// Seed for the per-pool random streams; OS entropy when absent.
    pub seed: Option<u64>,
    /// Default base rates for pools without an override.
    pub rates: RarityTable,
    /// Pity tuning.
    pub pity: PityConfig,
    /// Chance that a top-rarity hit resolves to a featured item.
    pub pickup_rate: f64,
    /// Batch size and guarantee.
    pub batch: BatchConfig,
    /// Daily free draw reset.
    pub free_draw: ResetSchedule,
    /// Records kept per pool in the history ledger.
    pub history_capacity: usize,
}

impl DrawSettings {
    /// Validates every tuning value.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> DrawResult<()> {
        self.pity.validate()?;
        self.batch.validate()?;
        self.free_draw.validate()?;
        if !(0.0..=1.0).contains(&self.pickup_rate) {
            return Err(DrawError::InvalidConfig(format!(
                "pickup_rate must be in [0, 1], got {}",
                self.pickup_rate
            )));
        }
        if self.history_capacity == 0 {
            return Err(DrawError::InvalidConfig(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            seed: None,
            rates: RarityTable::standard(),
            pity: PityConfig::default(),
            pickup_rate: 0.5,
            batch: BatchConfig::default(),
            free_draw: ResetSchedule::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Complete engine configuration: settings plus pool definitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine-wide tuning.
    #[serde(flatten)]
    pub settings: DrawSettings,
    /// Pools registered at startup.
    #[serde(default)]
    pub pools: Vec<Pool>,
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] on a parse or validation failure.
    pub fn from_toml_str(text: &str) -> DrawResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| DrawError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if the file cannot be read,
    /// parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> DrawResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DrawError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            pools = config.pools.len(),
            "loaded draw configuration"
        );
        Ok(config)
    }

    /// Validates settings and every pool.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> DrawResult<()> {
        self.settings.validate()?;
        let mut ids = HashSet::with_capacity(self.pools.len());
        for pool in &self.pools {
            if !ids.insert(pool.id.as_str()) {
                return Err(DrawError::InvalidConfig(format!(
                    "duplicate pool id {}",
                    pool.id
                )));
            }
            pool.validate(pool.rates.as_ref().unwrap_or(&self.settings.rates))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolKind;
    use crate::rarity::Rarity;

    const SAMPLE: &str = r#"
        seed = 42
        pickup_rate = 0.5

        [pity]
        hard_pity_count = 80
        soft_pity_start = 65
        soft_pity_rate_increase = 0.05

        [batch]
        size = 10
        guarantee = "epic"

        [free_draw]
        reset_hour = 4

        [[pools]]
        id = "standard"
        name = "Standard Recruitment"
        daily_free_draw = true
        featured = [5]
        items = [
            { id = 1, name = "Squire", rarity = "common" },
            { id = 3, name = "Archer", rarity = "rare" },
            { id = 5, name = "Dragon Knight", rarity = "legendary" },
        ]

        [[pools]]
        id = "festival"
        kind = "limited"
        starts_at = "2026-07-01T00:00:00Z"
        ends_at = "2026-07-15T00:00:00Z"
        cost = { currency = "gem", single = 150, batch = 1500 }
        rates = { rare = 0.8, epic = 0.17, legendary = 0.03 }
        items = [
            { id = 10, name = "Lantern Mage", rarity = "rare" },
            { id = 11, name = "Firework Ronin", rarity = "legendary" },
        ]
    "#;

    #[test]
    fn test_parse_sample() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.settings.seed, Some(42));
        assert_eq!(config.settings.pity.hard_pity_count, 80);
        assert_eq!(config.settings.batch.guarantee, Some(Rarity::Epic));
        assert_eq!(config.settings.free_draw.reset_hour, 4);
        assert_eq!(config.settings.rates, RarityTable::standard());
        assert_eq!(config.settings.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.pools.len(), 2);

        let festival = &config.pools[1];
        assert_eq!(festival.kind, PoolKind::Limited);
        assert!(festival.window.starts_at.is_some());
        assert_eq!(festival.cost.as_ref().map(|c| c.single), Some(150));
        assert_eq!(festival.rates.as_ref().map(RarityTable::top), Some(Rarity::Legendary));
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.settings, DrawSettings::default());
        assert!(config.pools.is_empty());
    }

    #[test]
    fn test_rejects_bad_pickup_rate() {
        assert!(EngineConfig::from_toml_str("pickup_rate = 1.5").is_err());
    }

    #[test]
    fn test_rejects_duplicate_pools() {
        let text = r#"
            [[pools]]
            id = "a"
            [[pools]]
            id = "a"
        "#;
        assert!(EngineConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_rejects_unknown_rarity() {
        let text = r#"
            [rates]
            mythic = 0.1
        "#;
        assert!(matches!(
            EngineConfig::from_toml_str(text),
            Err(DrawError::InvalidConfig(_))
        ));
    }
}
