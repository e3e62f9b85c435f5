//! # Random Sources
//!
//! Every random decision in a draw goes through [`RandomSource`], so draws
//! can be replayed from a fixed stream.
//!
//! The production source is ChaCha20. Each pool gets its own stream of the
//! engine seed, selected by an FNV-1a hash of the pool id, so adding a pool
//! never shifts another pool's sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;

/// Source of uniform unit values.
pub trait RandomSource: Send {
    /// Uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let index = (self.next_unit() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }
}

/// FNV-1a over a byte string.
#[inline]
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// ChaCha20-backed source.
#[derive(Clone, Debug)]
pub struct ChaChaSource {
    rng: ChaCha20Rng,
}

impl ChaChaSource {
    /// Creates a source from a seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Creates a source seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Creates the stream for one pool.
    ///
    /// Without a seed the pool gets an entropy-seeded generator.
    #[must_use]
    pub fn for_pool(seed: Option<u64>, pool_id: &str) -> Self {
        let mut source = match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        };
        source.rng.set_stream(fnv1a(pool_id.as_bytes()));
        source
    }
}

impl RandomSource for ChaChaSource {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed list of unit values, cycling when exhausted.
///
/// Used for deterministic replays and tests. Values are clamped into
/// `[0, 1)`.
#[derive(Clone, Debug, Default)]
pub struct SequenceSource {
    values: VecDeque<f64>,
    cycle: Vec<f64>,
}

impl SequenceSource {
    /// Creates a source from unit values.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let cycle: Vec<f64> = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self {
            values: cycle.iter().copied().collect(),
            cycle,
        }
    }

    /// A source that always yields the same value.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.values.extend(self.cycle.iter().copied());
        }
        self.values.pop_front().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = ChaChaSource::for_pool(Some(7), "standard");
        let mut b = ChaChaSource::for_pool(Some(7), "standard");
        for _ in 0..32 {
            assert_eq!(a.next_unit().to_bits(), b.next_unit().to_bits());
        }
    }

    #[test]
    fn test_pools_get_distinct_streams() {
        let mut a = ChaChaSource::for_pool(Some(7), "standard");
        let mut b = ChaChaSource::for_pool(Some(7), "limited");
        let same = (0..32)
            .filter(|_| a.next_unit().to_bits() == b.next_unit().to_bits())
            .count();
        assert!(same < 4, "streams should diverge, {same}/32 matched");
    }

    #[test]
    fn test_units_in_range() {
        let mut source = ChaChaSource::from_seed(99);
        for _ in 0..10_000 {
            let u = source.next_unit();
            assert!((0.0..1.0).contains(&u));
            assert!(source.next_index(3) < 3);
        }
    }

    #[test]
    fn test_sequence_cycles_and_clamps() {
        let mut source = SequenceSource::new([0.25, 1.5]);
        assert!((source.next_unit() - 0.25).abs() < f64::EPSILON);
        assert!(source.next_unit() < 1.0);
        assert!((source.next_unit() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_index_from_unit() {
        let mut source = SequenceSource::new([0.0, 0.5, 0.999]);
        assert_eq!(source.next_index(4), 0);
        assert_eq!(source.next_index(4), 2);
        assert_eq!(source.next_index(4), 3);
    }

    #[test]
    fn test_fnv1a_stable() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_ne!(fnv1a(b"a"), fnv1a(b"b"));
    }
}
