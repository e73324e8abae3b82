//! Reservation types — the payment-hold view shared with the gateway.
//!
//! The Reservation Gateway is the authoritative system of record for
//! money movement. The core only stores a [`ReservationId`] per bid and a
//! cached [`BidOutcome`]; whenever a discrepancy is suspected (timeout,
//! failed release), the remote status read here is the truth.
//!
//! [`ReservationId`]: crate::ReservationId
//! [`BidOutcome`]: crate::BidOutcome

use serde::{Deserialize, Serialize};

/// The gateway's view of a reservation.
///
/// `Open → Captured` and `Open → Canceled`/`Refunded` are terminal and
/// mutually exclusive; the core never reopens a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteStatus {
    /// Authorized, not captured. Funds reserved against the payer.
    Open,
    /// Funds were captured. Terminal.
    Captured,
    /// The hold was canceled before capture. Terminal.
    Canceled,
    /// Captured funds were returned via refund. Terminal.
    Refunded,
}

impl RemoteStatus {
    /// Whether the reservation can still be captured or canceled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether funds ended up back with the payer.
    #[must_use]
    pub fn funds_returned(&self) -> bool {
        matches!(self, Self::Canceled | Self::Refunded)
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Captured => write!(f, "CAPTURED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}
