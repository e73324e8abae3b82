//! Error types for the Gavel auction engine.
//!
//! All errors use the `GV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Auction lifecycle errors
//! - 2xx: Bid errors
//! - 3xx: Reservation / payment gateway errors
//! - 4xx: Store / settlement errors
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AuctionId, BidId, ReservationId};

/// Central error enum for all Gavel operations.
#[derive(Debug, Error)]
pub enum GavelError {
    // =================================================================
    // Auction Lifecycle Errors (1xx)
    // =================================================================
    /// The requested auction was not found in the store.
    #[error("GV_ERR_100: Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    /// The auction has ended or its deadline has passed — no more bids.
    #[error("GV_ERR_101: Auction closed: {0}")]
    AuctionClosed(AuctionId),

    /// Finalize was called before the auction's deadline.
    #[error("GV_ERR_102: Auction has not ended yet (deadline {deadline})")]
    TooEarly { deadline: DateTime<Utc> },

    /// The auction was already finalized (idempotency guard).
    #[error("GV_ERR_103: Auction already finalized: {0}")]
    AlreadyFinalized(AuctionId),

    /// An auction cannot be created with a deadline in the past.
    #[error("GV_ERR_104: Invalid deadline: {deadline} is not in the future")]
    InvalidDeadline { deadline: DateTime<Utc> },

    // =================================================================
    // Bid Errors (2xx)
    // =================================================================
    /// The bid does not exceed the auction's current amount.
    #[error("GV_ERR_200: Bid too low: offered {amount}, current {current}")]
    BidTooLow { amount: Decimal, current: Decimal },

    /// A bid or starting price must be strictly positive.
    #[error("GV_ERR_201: Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// The requested bid was not found on any auction.
    #[error("GV_ERR_202: Bid not found: {0}")]
    BidNotFound(BidId),

    // =================================================================
    // Reservation / Gateway Errors (3xx)
    // =================================================================
    /// The gateway rejected the hold (card declined, invalid payer, etc.).
    /// Client-correctable; no auction state was changed.
    #[error("GV_ERR_300: Payment failed: {reason}")]
    PaymentFailed { reason: String },

    /// The gateway could not be reached or timed out — transient, worth a
    /// bounded retry at the call site.
    #[error("GV_ERR_301: Payment gateway unavailable: {reason}")]
    PaymentGatewayUnavailable { reason: String },

    /// A reservation's local and remote state disagree, or a release/refund
    /// failed. Must be surfaced to an operator, never dropped.
    #[error("GV_ERR_302: Reconciliation required for {reservation}: {reason}")]
    ReconciliationRequired {
        reservation: ReservationId,
        reason: String,
    },

    // =================================================================
    // Store / Settlement Errors (4xx)
    // =================================================================
    /// A conditional write lost the version race too many times.
    #[error("GV_ERR_400: Store conflict on auction {0}: retries exhausted")]
    StoreConflict(AuctionId),

    /// The auction has no winner (no bids, or not yet finalized).
    #[error("GV_ERR_401: No winner for auction {0}")]
    NoWinner(AuctionId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("GV_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GavelError>;

impl GavelError {
    /// Whether the error is a transient gateway condition worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::PaymentGatewayUnavailable { .. })
    }
}
