//! Commission calculation — the platform's cut of a settled amount.
//!
//! A pure tier-table lookup shared by auction settlement reporting and
//! the regular checkout payout release. Tiers are evaluated in order and
//! the first match wins; bounds are inclusive on both ends. An amount
//! outside every tier yields the table's default rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One `[min, max] → rate` band. `max = None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTier {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl CommissionTier {
    #[must_use]
    pub fn new(min: Decimal, max: Option<Decimal>, rate: Decimal) -> Self {
        Self { min, max, rate }
    }

    /// Whether `amount` falls inside this band (inclusive bounds).
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && self.max.is_none_or(|max| amount <= max)
    }
}

/// Ordered, non-overlapping commission rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTable {
    tiers: Vec<CommissionTier>,
    /// Rate applied when no tier matches.
    default_rate: Decimal,
}

impl CommissionTable {
    #[must_use]
    pub fn new(tiers: Vec<CommissionTier>, default_rate: Decimal) -> Self {
        Self {
            tiers,
            default_rate,
        }
    }

    /// The platform's canonical tier table:
    /// `[0, 100] → 5%`, `[101, 500] → 8%`, `[501, ∞) → 12%`.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            vec![
                CommissionTier::new(Decimal::ZERO, Some(Decimal::new(100, 0)), Decimal::new(5, 2)),
                CommissionTier::new(
                    Decimal::new(101, 0),
                    Some(Decimal::new(500, 0)),
                    Decimal::new(8, 2),
                ),
                CommissionTier::new(Decimal::new(501, 0), None, Decimal::new(12, 2)),
            ],
            Decimal::ZERO,
        )
    }

    /// The commission rate for a settlement amount. First matching tier
    /// wins; the default rate covers amounts outside every tier.
    #[must_use]
    pub fn rate(&self, amount: Decimal) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| tier.contains(amount))
            .map_or(self.default_rate, |tier| tier.rate)
    }

    /// The platform fee for a settlement amount.
    #[must_use]
    pub fn fee(&self, amount: Decimal) -> Decimal {
        amount * self.rate(amount)
    }

    #[must_use]
    pub fn tiers(&self) -> &[CommissionTier] {
        &self.tiers
    }

    #[must_use]
    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }
}

impl Default for CommissionTable {
    fn default() -> Self {
        Self::standard()
    }
}
