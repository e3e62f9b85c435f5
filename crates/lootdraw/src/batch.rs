//! # Batch Draws
//!
//! N draws where the last one carries a minimum-rarity floor if nothing
//! earlier in the batch already met it.
//!
//! ```text
//! draw 1 .. n-1   floor = Common       track: any result >= guarantee?
//! draw n          floor = guarantee    only if configured and still unmet
//! ```
//!
//! An earned result is never downgraded: once the guarantee is met the last
//! draw is a plain draw.

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::rarity::Rarity;

/// Anything with a rarity, so the coordinator can track the guarantee.
pub trait Rated {
    /// Rarity of the drawn result.
    fn rarity(&self) -> Rarity;
}

/// Batch size and guarantee for `draw_ten`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Draws per batch.
    pub size: usize,
    /// Minimum rarity guaranteed somewhere in the batch.
    pub guarantee: Option<Rarity>,
}

impl BatchConfig {
    /// Validates the batch size.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if the size is zero.
    pub fn validate(&self) -> DrawResult<()> {
        if self.size == 0 {
            return Err(DrawError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: 10,
            guarantee: Some(Rarity::Rare),
        }
    }
}

/// Runs `n` draws through `draw`, applying the guarantee to the last one.
///
/// `draw` receives the floor for each draw. `n == 0` yields an empty batch.
///
/// # Errors
///
/// Stops at and returns the first error from `draw`.
pub fn draw_batch<T, F>(n: usize, guarantee: Option<Rarity>, mut draw: F) -> DrawResult<Vec<T>>
where
    T: Rated,
    F: FnMut(Rarity) -> DrawResult<T>,
{
    let mut results = Vec::with_capacity(n);
    if n == 0 {
        return Ok(results);
    }

    let mut satisfied = guarantee.is_none();
    for _ in 0..n - 1 {
        let result = draw(Rarity::FLOOR)?;
        if let Some(min) = guarantee {
            satisfied |= result.rarity() >= min;
        }
        results.push(result);
    }

    let floor = match guarantee {
        Some(min) if !satisfied => {
            tracing::debug!(%min, "batch guarantee applied to final draw");
            min
        }
        _ => Rarity::FLOOR,
    };
    results.push(draw(floor)?);

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Rated for Rarity {
        fn rarity(&self) -> Rarity {
            *self
        }
    }

    /// Returns scripted rarities, clamped up to the floor, and records floors.
    fn scripted(script: Vec<Rarity>, floors: &mut Vec<Rarity>) -> impl FnMut(Rarity) -> DrawResult<Rarity> + '_ {
        let mut script = script.into_iter();
        move |floor| {
            floors.push(floor);
            let rolled = script.next().unwrap_or(Rarity::Common);
            Ok(rolled.max(floor))
        }
    }

    #[test]
    fn test_guarantee_applied_when_unmet() {
        let mut floors = Vec::new();
        let results = draw_batch(10, Some(Rarity::Rare), scripted(vec![Rarity::Common; 10], &mut floors)).unwrap();

        assert_eq!(results.len(), 10);
        assert_eq!(floors[..9], [Rarity::Common; 9]);
        assert_eq!(floors[9], Rarity::Rare);
        assert!(results.iter().any(|r| *r >= Rarity::Rare));
    }

    #[test]
    fn test_never_downgrade_after_epic() {
        let mut script = vec![Rarity::Common; 10];
        script[8] = Rarity::Epic;
        let mut floors = Vec::new();
        let results = draw_batch(10, Some(Rarity::Rare), scripted(script, &mut floors)).unwrap();

        assert_eq!(floors, vec![Rarity::Common; 10]);
        assert_eq!(results[8], Rarity::Epic);
        assert_eq!(results[9], Rarity::Common);
    }

    #[test]
    fn test_no_guarantee_configured() {
        let mut floors = Vec::new();
        draw_batch(5, None, scripted(vec![Rarity::Common; 5], &mut floors)).unwrap();
        assert_eq!(floors, vec![Rarity::Common; 5]);
    }

    #[test]
    fn test_single_draw_batch_gets_guarantee() {
        let mut floors = Vec::new();
        draw_batch(1, Some(Rarity::Epic), scripted(vec![Rarity::Common], &mut floors)).unwrap();
        assert_eq!(floors, vec![Rarity::Epic]);
    }

    #[test]
    fn test_empty_batch() {
        let results: Vec<Rarity> = draw_batch(0, Some(Rarity::Rare), |_| Ok(Rarity::Common)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_error_stops_batch() {
        let mut calls = 0;
        let result: DrawResult<Vec<Rarity>> = draw_batch(10, None, |_| {
            calls += 1;
            if calls == 3 {
                Err(DrawError::EmptyPool("standard".to_string()))
            } else {
                Ok(Rarity::Common)
            }
        });

        assert!(result.is_err());
        assert_eq!(calls, 3);
    }
}
