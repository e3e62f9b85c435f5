//! # Draw Error Types
//!
//! All errors that can occur in the draw engine. None are retried
//! internally; retry policy belongs to the caller.

use thiserror::Error;

use crate::rarity::Rarity;

/// Errors that can occur in the draw engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    /// Pool identity is not configured.
    #[error("unknown pool: {0}")]
    UnknownPool(String),

    /// Pool has zero items of any rarity.
    #[error("pool {0} has no items")]
    EmptyPool(String),

    /// Draw attempted outside the pool's activity window.
    #[error("pool {0} is not active")]
    InactivePool(String),

    /// Free draw requested before the next reset boundary.
    #[error("free draw for pool {0} is not available yet")]
    NotEligible(String),

    /// Pool is configured but cannot produce a draw (e.g. every weight at or
    /// above the requested floor is zero).
    #[error("pool {pool_id} is misconfigured: {reason}")]
    Misconfigured {
        /// The offending pool.
        pool_id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No weight at or above the floor; raised by the pure adjuster before
    /// the engine attaches a pool identity.
    #[error("rarity table has no positive weight at or above {0}")]
    NoWeightAtFloor(Rarity),

    /// Invalid configuration file or pool definition.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl DrawError {
    /// Attaches a pool identity to errors raised by the pure stages.
    #[must_use]
    pub fn for_pool(self, pool_id: &str) -> Self {
        match self {
            Self::NoWeightAtFloor(floor) => Self::Misconfigured {
                pool_id: pool_id.to_string(),
                reason: format!("no positive weight at or above {floor}"),
            },
            other => other,
        }
    }
}

/// Result type for draw operations.
pub type DrawResult<T> = Result<T, DrawError>;
