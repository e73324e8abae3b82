//! Configuration types for the Gavel engine and its background scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CommissionTable, constants};

/// Configuration for the bid engine and finalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ISO currency code used for every payment hold.
    pub currency: String,
    /// Bound on conditional-commit retries under contention.
    pub max_commit_retries: u32,
    /// Commission tiers applied to settled amounts.
    pub commission: CommissionTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: constants::DEFAULT_CURRENCY.to_string(),
            max_commit_retries: constants::MAX_COMMIT_RETRIES,
            commission: CommissionTable::standard(),
        }
    }
}

/// Timing configuration for the deadline scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the scheduler scans for due auctions.
    pub poll_interval: Duration,
    /// Auctions whose deadline falls within `now + lookahead` are scan
    /// candidates; only those actually past deadline get finalized.
    pub lookahead: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(constants::DEFAULT_POLL_INTERVAL_SECS),
            lookahead: Duration::from_secs(constants::DEFAULT_LOOKAHEAD_SECS),
        }
    }
}

impl SchedulerConfig {
    /// A fast configuration for tests: short poll, generous lookahead.
    #[must_use]
    pub fn fast(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            lookahead: Duration::from_secs(constants::DEFAULT_LOOKAHEAD_SECS),
        }
    }
}
