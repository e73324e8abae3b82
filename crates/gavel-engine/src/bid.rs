//! Bid engine — validates and applies bids, coordinating store and gateway.
//!
//! ## Order of operations
//!
//! 1. Validate against a snapshot (exists, open, amount strictly higher).
//! 2. Resolve the bidder's payer registration and open a manual-capture
//!    hold for the full amount. A gateway rejection aborts with no state
//!    change.
//! 3. Commit through the store's conditional write, re-validating against
//!    the freshest snapshot each attempt. A bid that lost the race is
//!    rejected and its just-opened hold is canceled — an opened
//!    reservation is never left dangling.
//! 4. Release the previous leader's hold. A failed release does not
//!    unwind the new bid; the old bid is marked `REFUND_FAILED` so the
//!    settlement sweep (or an operator) retries it later. A stuck hold
//!    must never block the auction.

use std::sync::Arc;

use chrono::Utc;
use gavel_types::{
    Auction, AuctionId, Bid, BidId, BidOutcome, ContactInfo, EngineConfig, GavelError,
    ReservationId, Result, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use gavel_gateway::{AccountDirectory, HoldRequest, ReservationGateway};

use crate::store::{AuctionStore, CommitError};

/// What the client gets back for an accepted bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidReceipt {
    /// The auction after the bid was applied.
    pub auction: Auction,
    pub bid_id: BidId,
    pub reservation: ReservationId,
    /// Token the bidder's client completes the authorization with.
    pub confirmation_token: String,
}

/// Applies bids against the auction store, one hold per bid.
pub struct BidEngine<G, D> {
    store: Arc<AuctionStore>,
    gateway: Arc<G>,
    directory: Arc<D>,
    config: EngineConfig,
}

impl<G, D> BidEngine<G, D>
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

    /// Place a bid on an ongoing auction.
    ///
    /// # Errors
    /// - `AuctionNotFound` if the auction does not exist
    /// - `AuctionClosed` if it ended or its deadline passed
    /// - `BidTooLow` if `amount` does not strictly exceed the current one
    /// - `PaymentFailed` / `PaymentGatewayUnavailable` if the hold could
    ///   not be opened; no state changes persist
    pub async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder: UserId,
        amount: Decimal,
        contact: ContactInfo,
    ) -> Result<BidReceipt> {
        // Cheap rejection before any gateway traffic.
        let (auction, _) = self
            .store
            .snapshot(auction_id)
            .ok_or(GavelError::AuctionNotFound(auction_id))?;
        Self::validate(&auction, amount)?;

        // Payer registration is get-or-create at the directory.
        let payer = self.directory.payer_account(bidder).await?;

        // Manual-capture hold for the full amount. Rejection means the
        // bid never happened.
        let hold = self
            .gateway
            .open_hold(HoldRequest::new(
                payer,
                amount,
                self.config.currency.clone(),
                auction_id,
                bidder,
                contact.clone(),
            ))
            .await?;

        let bid = Bid {
            id: BidId::new(),
            auction_id,
            bidder,
            amount,
            reservation: hold.reservation.clone(),
            outcome: BidOutcome::Held,
            contact,
            placed_at: Utc::now(),
        };

        // Serialized apply: conditional commit, re-validated per attempt.
        let previous = match self.commit_bid(auction_id, &bid).await {
            Ok(previous) => previous,
            Err(err) => {
                self.abandon_hold(&hold.reservation, &err).await;
                return Err(err);
            }
        };

        info!(
            auction = %auction_id,
            bid = %bid.id,
            %amount,
            reservation = %hold.reservation,
            "bid accepted, leader replaced"
        );

        // The outbid leader's hold is released after the commit; failure
        // is recorded on the old bid, never propagated to the new bidder.
        if let Some((old_bid, old_reservation)) = previous {
            self.release_outbid_hold(auction_id, old_bid, &old_reservation)
                .await;
        }

        let auction = self
            .store
            .get(auction_id)
            .ok_or(GavelError::AuctionNotFound(auction_id))?;
        Ok(BidReceipt {
            auction,
            bid_id: bid.id,
            reservation: hold.reservation,
            confirmation_token: hold.confirmation_token,
        })
    }

    /// Apply the bid under the store's version check. Returns the outbid
    /// leader's (bid, reservation) if one was displaced.
    async fn commit_bid(
        &self,
        auction_id: AuctionId,
        bid: &Bid,
    ) -> Result<Option<(BidId, ReservationId)>> {
        for _ in 0..self.config.max_commit_retries {
            let (mut auction, version) = self
                .store
                .snapshot(auction_id)
                .ok_or(GavelError::AuctionNotFound(auction_id))?;

            // The race loser re-validates here and fails BidTooLow
            // against the now-current amount.
            Self::validate(&auction, bid.amount)?;

            let previous = auction
                .leader_bid()
                .filter(|b| b.outcome == BidOutcome::Held)
                .map(|b| (b.id, b.reservation.clone()));

            auction.bids.push(bid.clone());
            auction.current_amount = bid.amount;
            auction.current_leader = Some(bid.bidder);

            match self.store.try_commit(auction_id, version, auction) {
                Ok(_) => return Ok(previous),
                Err(CommitError::Conflict { .. }) => continue,
                Err(CommitError::NotFound(_)) => {
                    return Err(GavelError::AuctionNotFound(auction_id));
                }
            }
        }
        Err(GavelError::StoreConflict(auction_id))
    }

    fn validate(auction: &Auction, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(GavelError::InvalidAmount { amount });
        }
        if !auction.is_open(Utc::now()) {
            return Err(GavelError::AuctionClosed(auction.id));
        }
        if amount <= auction.current_amount {
            return Err(GavelError::BidTooLow {
                amount,
                current: auction.current_amount,
            });
        }
        Ok(())
    }

    /// Cancel a hold whose bid was rejected after the hold was opened.
    async fn abandon_hold(&self, reservation: &ReservationId, cause: &GavelError) {
        match self.gateway.cancel_hold(reservation).await {
            Ok(()) => {
                info!(%reservation, %cause, "canceled hold for rejected bid");
            }
            Err(err) => {
                // The hold is live at the gateway with no bid record to
                // hang it on; the log line is the operator's handle.
                error!(%reservation, %err, "failed to cancel hold for rejected bid");
            }
        }
    }

    /// Release the displaced leader's hold and record the result.
    async fn release_outbid_hold(
        &self,
        auction_id: AuctionId,
        old_bid: BidId,
        old_reservation: &ReservationId,
    ) {
        let outcome = match self.gateway.cancel_hold(old_reservation).await {
            Ok(()) => BidOutcome::Released,
            Err(err) => {
                warn!(
                    auction = %auction_id,
                    bid = %old_bid,
                    reservation = %old_reservation,
                    %err,
                    "failed to release outbid leader's hold, flagged for reconciliation"
                );
                BidOutcome::RefundFailed
            }
        };

        let marked = self.store.update(auction_id, |auction| {
            match auction.bid_mut(old_bid) {
                Some(b) => b.transition(outcome),
                None => Ok(()),
            }
        });
        if let Err(err) = marked {
            error!(auction = %auction_id, bid = %old_bid, %err, "failed to record hold release");
        }
    }
}
