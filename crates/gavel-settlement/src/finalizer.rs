//! Finalizer — settles one ended auction exactly once.
//!
//! ## Settlement order
//!
//! 1. **Claim**: the `AlreadyFinalized` and `TooEarly` guards run inside
//!    the same conditional write that flips the auction to `ENDED` and
//!    fixes the winner. A concurrent finalize (scheduler double-fire,
//!    admin retry) loses the claim before any gateway call is made —
//!    this is the sole protection against double settlement, so it
//!    shares the store's serialization discipline instead of being a
//!    read-then-act check.
//! 2. **Capture** the winning hold. A capture failure does not reopen
//!    bidding; the auction stays ended and the report is flagged
//!    unsettled for operator reconciliation.
//! 3. **Sweep** every other unresolved hold: reconcile against the
//!    gateway's remote state first, then cancel (still open) or refund
//!    (captured by mistake). Failures are collected per bid and never
//!    abort the rest of the sweep.

use std::sync::Arc;

use chrono::Utc;
use gavel_types::{
    AuctionId, AuctionStatus, Bid, BidId, BidOutcome, EngineConfig, GavelError, PayoutRef,
    RemoteStatus, ReservationId, Result, UserId,
};
use gavel_engine::AuctionStore;
use gavel_gateway::{AccountDirectory, ReservationGateway};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// How the winner's hold was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// The auction ended with no bids; nothing to capture.
    NoBids,
    /// The winning hold was captured.
    Captured,
    /// Capture failed; the auction is ended but unsettled.
    Failed { reason: String },
}

/// One loser hold that could not be resolved during the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFailure {
    pub bid: BidId,
    pub reservation: ReservationId,
    pub reason: String,
}

/// The outcome of one finalize call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReport {
    pub auction_id: AuctionId,
    pub winner: Option<UserId>,
    pub winning_bid: Option<BidId>,
    pub winning_amount: Option<Decimal>,
    pub capture: CaptureOutcome,
    /// Commission on the winning amount, per the platform tier table.
    pub commission_rate: Decimal,
    pub commission_fee: Decimal,
    /// The seller's payout destination, if onboarded.
    pub seller_payout: Option<PayoutRef>,
    /// Loser holds needing operator remediation. Never silently dropped.
    pub sweep_failures: Vec<SweepFailure>,
    /// Two bids shared the maximum amount — an invariant violation the
    /// bid engine should make impossible; flagged, not resolved.
    pub tie_detected: bool,
}

impl SettlementReport {
    fn no_bids(auction_id: AuctionId) -> Self {
        Self {
            auction_id,
            winner: None,
            winning_bid: None,
            winning_amount: None,
            capture: CaptureOutcome::NoBids,
            commission_rate: Decimal::ZERO,
            commission_fee: Decimal::ZERO,
            seller_payout: None,
            sweep_failures: Vec::new(),
            tie_detected: false,
        }
    }

    /// Whether settlement completed with nothing left to reconcile.
    #[must_use]
    pub fn fully_settled(&self) -> bool {
        !matches!(self.capture, CaptureOutcome::Failed { .. }) && self.sweep_failures.is_empty()
    }
}

/// Settles ended auctions: capture the winner, release every loser.
pub struct Finalizer<G, D> {
    store: Arc<AuctionStore>,
    gateway: Arc<G>,
    directory: Arc<D>,
    config: EngineConfig,
}

impl<G, D> Finalizer<G, D>
where
    G: ReservationGateway,
    D: AccountDirectory,
{
    #[must_use]
    pub fn new(
        store: Arc<AuctionStore>,
        gateway: Arc<G>,
        directory: Arc<D>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            directory,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<AuctionStore> {
        &self.store
    }

    /// Settle an auction whose deadline has passed.
    ///
    /// # Errors
    /// - `AuctionNotFound` if the auction does not exist
    /// - `AlreadyFinalized` if it was settled before (no gateway calls)
    /// - `TooEarly` if the deadline has not passed (no gateway calls)
    pub async fn finalize(&self, auction_id: AuctionId) -> Result<SettlementReport> {
        let (winning, tie, seller) = self.claim(auction_id)?;

        if tie {
            error!(
                auction = %auction_id,
                "tied maximum bids at settlement; the bid engine should make this impossible"
            );
        }

        let Some(winning) = winning else {
            info!(auction = %auction_id, "auction ended with no bids");
            return Ok(SettlementReport {
                tie_detected: tie,
                ..SettlementReport::no_bids(auction_id)
            });
        };

        let capture = match self.gateway.capture(&winning.reservation).await {
            Ok(()) => {
                self.mark(auction_id, winning.id, BidOutcome::Captured);
                info!(
                    auction = %auction_id,
                    bid = %winning.id,
                    amount = %winning.amount,
                    "winning hold captured"
                );
                CaptureOutcome::Captured
            }
            Err(err) => {
                warn!(
                    auction = %auction_id,
                    bid = %winning.id,
                    reservation = %winning.reservation,
                    %err,
                    "winner capture failed; auction closed unsettled"
                );
                CaptureOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        let seller_payout = match self.directory.payout_destination(seller).await {
            Ok(dest) => dest,
            Err(err) => {
                warn!(auction = %auction_id, %err, "payout destination lookup failed");
                None
            }
        };

        let sweep_failures = self.sweep_losers(auction_id, winning.id).await;

        let report = SettlementReport {
            auction_id,
            winner: Some(winning.bidder),
            winning_bid: Some(winning.id),
            winning_amount: Some(winning.amount),
            capture,
            commission_rate: self.config.commission.rate(winning.amount),
            commission_fee: self.config.commission.fee(winning.amount),
            seller_payout,
            sweep_failures,
            tie_detected: tie,
        };
        info!(
            auction = %auction_id,
            winner = %winning.bidder,
            settled = report.fully_settled(),
            anomalies = report.sweep_failures.len(),
            "auction finalized"
        );
        Ok(report)
    }

    /// Atomically transition ONGOING → ENDED and fix the winner. Returns
    /// the winning bid (cloned), the tie flag, and the seller.
    fn claim(&self, auction_id: AuctionId) -> Result<(Option<Bid>, bool, UserId)> {
        self.store.update(auction_id, |auction| {
            if auction.status == AuctionStatus::Ended {
                return Err(GavelError::AlreadyFinalized(auction.id));
            }
            if Utc::now() < auction.deadline {
                return Err(GavelError::TooEarly {
                    deadline: auction.deadline,
                });
            }
            let (winning, tie) = auction.highest_bid();
            let winning = winning.cloned();
            auction.status = AuctionStatus::Ended;
            auction.winner = winning.as_ref().map(|b| b.bidder);
            Ok((winning, tie, auction.seller))
        })
    }

    /// Resolve every non-winning hold that still needs it. Failures are
    /// collected; one stuck hold never blocks the rest.
    async fn sweep_losers(&self, auction_id: AuctionId, winning: BidId) -> Vec<SweepFailure> {
        let Some(auction) = self.store.get(auction_id) else {
            return Vec::new();
        };

        let mut failures = Vec::new();
        for bid in auction
            .bids
            .iter()
            .filter(|b| b.id != winning && b.outcome.needs_resolution())
        {
            match self.resolve_loser(bid).await {
                Ok(()) => self.mark(auction_id, bid.id, BidOutcome::Released),
                Err(err) => {
                    warn!(
                        auction = %auction_id,
                        bid = %bid.id,
                        reservation = %bid.reservation,
                        %err,
                        "loser hold unresolved, flagged for reconciliation"
                    );
                    self.mark(auction_id, bid.id, BidOutcome::RefundFailed);
                    failures.push(SweepFailure {
                        bid: bid.id,
                        reservation: bid.reservation.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        failures
    }

    /// Reconcile one loser hold against the gateway, then resolve it.
    ///
    /// The local outcome is only a cache: the remote state decides
    /// whether to cancel (still open), refund (captured by mistake), or
    /// do nothing (already returned).
    async fn resolve_loser(&self, bid: &Bid) -> Result<()> {
        match self.gateway.status(&bid.reservation).await? {
            RemoteStatus::Open => self.gateway.cancel_hold(&bid.reservation).await,
            RemoteStatus::Captured => {
                warn!(
                    bid = %bid.id,
                    reservation = %bid.reservation,
                    "loser hold was captured; refunding"
                );
                self.gateway.refund(&bid.reservation).await
            }
            RemoteStatus::Canceled | RemoteStatus::Refunded => Ok(()),
        }
    }

    /// Record a bid outcome; idempotent per target state.
    fn mark(&self, auction_id: AuctionId, bid_id: BidId, outcome: BidOutcome) {
        let res = self.store.update(auction_id, |auction| {
            match auction.bid_mut(bid_id) {
                Some(b) if b.outcome == outcome => Ok(()),
                Some(b) => b.transition(outcome),
                None => Ok(()),
            }
        });
        if let Err(err) = res {
            error!(auction = %auction_id, bid = %bid_id, %err, "failed to record bid outcome");
        }
    }
}
