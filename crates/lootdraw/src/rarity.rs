//! # Rarity Tiers and Base Tables
//!
//! A closed, ordered rarity enumeration and the immutable per-pool base
//! probability table.
//!
//! Tables are keyed by [`Rarity`] in a `BTreeMap`, so iteration order is the
//! enum order. Selection walks it in *descending* order explicitly; nothing
//! depends on insertion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DrawError, DrawResult};

/// Rarity tier for items.
///
/// Written lowercase; read case-insensitively, the same as table keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[repr(u8)]
pub enum Rarity {
    /// Common items (gray).
    Common = 0,
    /// Uncommon items (green).
    Uncommon = 1,
    /// Rare items (blue).
    Rare = 2,
    /// Epic items (purple).
    Epic = 3,
    /// Legendary items (orange).
    Legendary = 4,
}

impl Rarity {
    /// Every tier, lowest first.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];

    /// The unconstrained floor.
    pub const FLOOR: Self = Self::Common;

    /// Lowercase name used in config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Rarity {
    type Error = DrawError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl FromStr for Rarity {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DrawError::InvalidConfig(format!("unknown rarity '{s}'")))
    }
}

/// Immutable base probability per rarity.
///
/// Weights do not have to sum to 1; selection normalizes by the total of
/// whatever subset is in play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct RarityTable {
    weights: BTreeMap<Rarity, f64>,
}

impl RarityTable {
    /// Builds a table from `(rarity, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if any weight is negative or not
    /// finite, or if no weight is positive.
    pub fn new(entries: impl IntoIterator<Item = (Rarity, f64)>) -> DrawResult<Self> {
        let weights: BTreeMap<Rarity, f64> = entries.into_iter().collect();
        for (rarity, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(DrawError::InvalidConfig(format!(
                    "weight for {rarity} must be a finite non-negative number, got {weight}"
                )));
            }
        }
        if !weights.values().any(|w| *w > 0.0) {
            return Err(DrawError::InvalidConfig(
                "rarity table must have at least one positive weight".to_string(),
            ));
        }
        Ok(Self { weights })
    }

    /// The classic five-tier table: 49 / 30 / 15 / 5 / 1 percent.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            weights: BTreeMap::from([
                (Rarity::Common, 0.49),
                (Rarity::Uncommon, 0.30),
                (Rarity::Rare, 0.15),
                (Rarity::Epic, 0.05),
                (Rarity::Legendary, 0.01),
            ]),
        }
    }

    /// Base weight for a rarity (0 when not configured).
    #[must_use]
    pub fn weight(&self, rarity: Rarity) -> f64 {
        self.weights.get(&rarity).copied().unwrap_or(0.0)
    }

    /// Highest configured rarity.
    #[must_use]
    pub fn top(&self) -> Rarity {
        self.weights
            .keys()
            .next_back()
            .copied()
            .unwrap_or(Rarity::Legendary)
    }

    /// Iterates configured tiers, lowest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Rarity, f64)> + '_ {
        self.weights.iter().map(|(r, w)| (*r, *w))
    }

    /// Sum of every configured weight.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Configured tiers at or above `floor`.
    pub fn at_or_above(&self, floor: Rarity) -> impl DoubleEndedIterator<Item = (Rarity, f64)> + '_ {
        self.weights.range(floor..).map(|(r, w)| (*r, *w))
    }
}

impl Default for RarityTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<BTreeMap<String, f64>> for RarityTable {
    type Error = DrawError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let entries = raw
            .into_iter()
            .map(|(name, weight)| Ok((name.parse::<Rarity>()?, weight)))
            .collect::<DrawResult<Vec<_>>>()?;
        Self::new(entries)
    }
}

impl From<RarityTable> for BTreeMap<String, f64> {
    fn from(table: RarityTable) -> Self {
        table
            .weights
            .into_iter()
            .map(|(r, w)| (r.as_str().to_string(), w))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Epic < Rarity::Legendary);
    }

    #[test]
    fn test_rarity_parse() {
        assert_eq!("Legendary".parse::<Rarity>().unwrap(), Rarity::Legendary);
        assert_eq!(" rare ".parse::<Rarity>().unwrap(), Rarity::Rare);
        assert!("mythic".parse::<Rarity>().is_err());
    }

    #[test]
    fn test_table_rejects_bad_weights() {
        assert!(RarityTable::new([(Rarity::Common, -0.1)]).is_err());
        assert!(RarityTable::new([(Rarity::Common, f64::NAN)]).is_err());
        assert!(RarityTable::new([(Rarity::Common, 0.0), (Rarity::Rare, 0.0)]).is_err());
    }

    #[test]
    fn test_table_top_and_floor() {
        let table = RarityTable::new([
            (Rarity::Common, 0.8),
            (Rarity::Rare, 0.15),
            (Rarity::Epic, 0.05),
        ])
        .unwrap();

        assert_eq!(table.top(), Rarity::Epic);
        let above: Vec<_> = table.at_or_above(Rarity::Uncommon).map(|(r, _)| r).collect();
        assert_eq!(above, vec![Rarity::Rare, Rarity::Epic]);
        assert!((table.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_table_from_toml() {
        let table: RarityTable = toml::from_str(
            r#"
            common = 0.49
            uncommon = 0.30
            rare = 0.15
            epic = 0.05
            legendary = 0.01
            "#,
        )
        .unwrap();

        assert_eq!(table, RarityTable::standard());
    }

    #[test]
    fn test_names_parse_alike_everywhere() {
        #[derive(Deserialize)]
        struct Entry {
            rarity: Rarity,
            rates: RarityTable,
        }

        let entry: Entry = toml::from_str(
            r#"
            rarity = "Epic"
            rates = { Common = 0.9, LEGENDARY = 0.1 }
            "#,
        )
        .unwrap();

        assert_eq!(entry.rarity, Rarity::Epic);
        assert_eq!(entry.rates.top(), Rarity::Legendary);
        assert!(toml::from_str::<Entry>("rarity = \"mythic\"\nrates = { common = 1.0 }").is_err());
        assert!(toml::to_string(&RarityTable::standard()).unwrap().contains("legendary"));
    }
}
