//! # Bid — the funded offer primitive
//!
//! Every accepted bid carries a payment hold: funds are reserved against
//! the bidder the moment the bid is placed, and the hold is resolved
//! exactly once at settlement (capture for the winner, release for
//! everyone else).
//!
//! ## Outcome State Machine
//!
//! ```text
//!   ┌──────┐  settlement capture   ┌──────────┐
//!   │ HELD ├──────────────────────▶│ CAPTURED │
//!   └──┬───┘                       └──────────┘
//!      │ outbid / loser sweep
//!      ▼
//!   ┌──────────┐     release retry    ┌───────────────┐
//!   │ RELEASED │◀─────────────────────┤ REFUND_FAILED │
//!   └──────────┘                      └───────────────┘
//! ```
//!
//! `HELD → CAPTURED` and `HELD → RELEASED` are terminal and mutually
//! exclusive. `REFUND_FAILED` records a release that did not go through:
//! the hold is still live at the gateway and must be retried by the loser
//! sweep or an operator — it is an anomaly to surface, never to drop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, GavelError, ReservationId, Result, UserId};

/// Settlement outcome of a bid's payment hold.
///
/// The local outcome is a cache of gateway truth: after a timeout or a
/// failed release it may disagree with the gateway and must be reconciled
/// against the reservation's remote status, not trusted blindly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidOutcome {
    /// Funds are reserved. The bid is live (leader) or awaiting sweep.
    Held,
    /// The hold was canceled or refunded. Funds returned to the bidder.
    Released,
    /// Settlement captured this hold. Funds moved to the platform.
    /// **Irreversible.** At most one bid per auction reaches this state.
    Captured,
    /// A release or refund attempt failed; the hold may still be live at
    /// the gateway. Reconciliation required.
    RefundFailed,
}

impl BidOutcome {
    /// Can this outcome transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Held,
                Self::Captured | Self::Released | Self::RefundFailed
            ) | (Self::RefundFailed, Self::Released)
        )
    }

    /// Whether the hold still needs resolution at settlement time.
    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        matches!(self, Self::Held | Self::RefundFailed)
    }
}

impl std::fmt::Display for BidOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held => write!(f, "HELD"),
            Self::Released => write!(f, "RELEASED"),
            Self::Captured => write!(f, "CAPTURED"),
            Self::RefundFailed => write!(f, "REFUND_FAILED"),
        }
    }
}

/// Contact and delivery details collected with each bid, so the eventual
/// winner can be shipped to without a second round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A bid on an auction, bound to a payment hold.
///
/// Bids are append-only and immutable once created, except for `outcome`,
/// which tracks the hold's resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    /// Globally unique bid identifier.
    pub id: BidId,
    /// The auction this bid was placed on.
    pub auction_id: AuctionId,
    /// Who placed the bid.
    pub bidder: UserId,
    /// Offered amount. Strictly greater than the auction's amount at the
    /// time of placement.
    pub amount: Decimal,
    /// The payment hold backing this bid.
    pub reservation: ReservationId,
    /// Resolution state of the hold.
    pub outcome: BidOutcome,
    /// Delivery details for the eventual winner.
    pub contact: ContactInfo,
    /// When the bid was placed.
    pub placed_at: DateTime<Utc>,
}

impl Bid {
    /// Attempt to transition the outcome, enforcing the state machine.
    ///
    /// # Errors
    /// Returns `ReconciliationRequired` if the transition is not legal
    /// (e.g. releasing an already-captured hold).
    pub fn transition(&mut self, target: BidOutcome) -> Result<()> {
        if !self.outcome.can_transition_to(target) {
            return Err(GavelError::ReconciliationRequired {
                reservation: self.reservation.clone(),
                reason: format!(
                    "bid {} cannot transition from {} to {target}",
                    self.id, self.outcome
                ),
            });
        }
        self.outcome = target;
        Ok(())
    }
}

/// Dummy constructors for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl ContactInfo {
    pub fn dummy() -> Self {
        Self {
            full_name: "Test Bidder".to_string(),
            email: "bidder@example.com".to_string(),
            phone: "+10000000000".to_string(),
            street: "1 Test Street".to_string(),
            city: "Testville".to_string(),
            state: "TS".to_string(),
            postal_code: "00000".to_string(),
            country: "US".to_string(),
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Bid {
    /// Create a dummy held bid for unit tests.
    pub fn dummy(auction_id: AuctionId, bidder: UserId, amount: Decimal) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder,
            amount,
            reservation: ReservationId::new(format!("hold_{:08x}", rand::random::<u32>())),
            outcome: BidOutcome::Held,
            contact: ContactInfo::dummy(),
            placed_at: Utc::now(),
        }
    }
}
