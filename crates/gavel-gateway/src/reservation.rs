//! Reservation Gateway client — hold/capture/cancel/refund primitives.
//!
//! The gateway is an external payment processor and the authoritative
//! system of record for money movement. Every method is a network call
//! and the only suspension points in the engine.
//!
//! ## Timeout discipline
//!
//! A timed-out call is an **unknown outcome**, not a failure. Callers must
//! reconcile via [`ReservationGateway::status`] before retrying a capture
//! or cancel — double-capturing or double-refunding is a correctness
//! violation, so blind retries are never safe.

use std::future::Future;

use gavel_types::{AuctionId, ContactInfo, PayerRef, RemoteStatus, ReservationId, Result, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the gateway needs to open a manual-capture hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldRequest {
    /// The processor-side registration of the paying bidder.
    pub payer: PayerRef,
    /// Amount to authorize (not capture).
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Human-readable line shown on the payer's statement.
    pub description: String,
    /// The auction the hold is for, for gateway-side metadata.
    pub auction_id: AuctionId,
    /// The bidding user, for gateway-side metadata.
    pub bidder: UserId,
    /// Shipping/contact details forwarded to the processor.
    pub contact: ContactInfo,
}

impl HoldRequest {
    #[must_use]
    pub fn new(
        payer: PayerRef,
        amount: Decimal,
        currency: impl Into<String>,
        auction_id: AuctionId,
        bidder: UserId,
        contact: ContactInfo,
    ) -> Self {
        let currency = currency.into();
        Self {
            description: format!("Bid of {amount} {currency} on auction {auction_id}"),
            payer,
            amount,
            currency,
            auction_id,
            bidder,
            contact,
        }
    }
}

/// The gateway's answer to a successful hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldConfirmation {
    /// Opaque handle for all later capture/cancel/refund/status calls.
    pub reservation: ReservationId,
    /// Client-facing token the bidder's browser completes the
    /// authorization with.
    pub confirmation_token: String,
}

/// Client adapter to the external payment processor's hold primitives.
///
/// Implementations map processor-specific failures onto the engine's
/// taxonomy: a rejection (declined card, invalid payer) becomes
/// `PaymentFailed`, a transport problem becomes
/// `PaymentGatewayUnavailable`.
pub trait ReservationGateway: Send + Sync {
    /// Open a manual-capture hold for `request.amount` against the payer.
    /// Authorized but not captured; resolves later to exactly one of
    /// capture or cancel.
    fn open_hold(&self, request: HoldRequest)
    -> impl Future<Output = Result<HoldConfirmation>> + Send;

    /// Irreversibly transfer the held funds. Terminal.
    fn capture(&self, reservation: &ReservationId) -> impl Future<Output = Result<()>> + Send;

    /// Cancel an open hold, returning the funds. Terminal.
    fn cancel_hold(&self, reservation: &ReservationId) -> impl Future<Output = Result<()>> + Send;

    /// Return already-captured funds. Only valid on a captured
    /// reservation — the defensive path for holds captured by mistake.
    fn refund(&self, reservation: &ReservationId) -> impl Future<Output = Result<()>> + Send;

    /// Reconciliation read: the reservation's authoritative remote state.
    fn status(&self, reservation: &ReservationId)
    -> impl Future<Output = Result<RemoteStatus>> + Send;
}
