//! Service facade — the inbound API surface over engine and finalizer.
//!
//! Each operation is request/response and returns the uniform
//! success/message/data envelope. Validation and state-machine errors
//! come back synchronously as `success=false` with the error's summarized
//! display string; gateway internals never leak further than that.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gavel_types::{
    ApiResponse, Auction, AuctionId, Bid, BidId, ContactInfo, EngineConfig, GavelError,
    ItemListing, Result, SchedulerConfig, UserId,
};
use gavel_engine::{AuctionStore, BidEngine, BidReceipt};
use gavel_gateway::{AccountDirectory, ReservationGateway};
use rust_decimal::Decimal;

use crate::finalizer::{Finalizer, SettlementReport};
use crate::scheduler::{DeadlineScheduler, SchedulerHandle};

/// Wires store, bid engine, and finalizer behind the marketplace API.
pub struct AuctionService<G, D> {
    store: Arc<AuctionStore>,
    engine: BidEngine<G, D>,
    finalizer: Arc<Finalizer<G, D>>,
}

impl<G, D> AuctionService<G, D>
where
    G: ReservationGateway + 'static,
    D: AccountDirectory + 'static,
{
    #[must_use]
    pub fn new(gateway: Arc<G>, directory: Arc<D>, config: EngineConfig) -> Self {
        let store = Arc::new(AuctionStore::new());
        let engine = BidEngine::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            Arc::clone(&directory),
            config.clone(),
        );
        let finalizer = Arc::new(Finalizer::new(
            Arc::clone(&store),
            gateway,
            directory,
            config,
        ));
        Self {
            store,
            engine,
            finalizer,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<AuctionStore> {
        &self.store
    }

    /// Start the deadline scheduler against this service's finalizer.
    #[must_use]
    pub fn start_scheduler(&self, config: SchedulerConfig) -> SchedulerHandle {
        DeadlineScheduler::new(Arc::clone(&self.finalizer), config).spawn()
    }

    /// Open a new auction for a seller's listing.
    pub fn create_auction(
        &self,
        seller: UserId,
        item: ItemListing,
        starting_price: Decimal,
        deadline: DateTime<Utc>,
    ) -> ApiResponse<Auction> {
        let result = self.try_create(seller, item, starting_price, deadline);
        ApiResponse::from_result("Auction created successfully", result)
    }

    fn try_create(
        &self,
        seller: UserId,
        item: ItemListing,
        starting_price: Decimal,
        deadline: DateTime<Utc>,
    ) -> Result<Auction> {
        if starting_price <= Decimal::ZERO {
            return Err(GavelError::InvalidAmount {
                amount: starting_price,
            });
        }
        if deadline <= Utc::now() {
            return Err(GavelError::InvalidDeadline { deadline });
        }
        let auction = Auction::open(seller, item, starting_price, deadline);
        let id = self.store.insert(auction);
        self.store
            .get(id)
            .ok_or(GavelError::AuctionNotFound(id))
    }

    /// Place a bid, opening a payment hold for the full amount.
    pub async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder: UserId,
        amount: Decimal,
        contact: ContactInfo,
    ) -> ApiResponse<BidReceipt> {
        let result = self
            .engine
            .place_bid(auction_id, bidder, amount, contact)
            .await;
        ApiResponse::from_result("Bid placed successfully", result)
    }

    /// Manually trigger settlement (admin path; the scheduler uses the
    /// same finalizer underneath).
    pub async fn finalize(&self, auction_id: AuctionId) -> ApiResponse<SettlementReport> {
        match self.finalizer.finalize(auction_id).await {
            Ok(report) => {
                let message = if report.winner.is_none() {
                    "Auction ended with no bids"
                } else if report.fully_settled() {
                    "Auction finalized successfully"
                } else {
                    "Auction finalized; reconciliation required"
                };
                ApiResponse::ok(message, report)
            }
            Err(err) => err.into(),
        }
    }

    /// All auctions, in creation order.
    pub fn list_auctions(&self) -> ApiResponse<Vec<Auction>> {
        ApiResponse::ok("All auctions fetched", self.store.list())
    }

    /// One auction by id.
    pub fn get_auction(&self, auction_id: AuctionId) -> ApiResponse<Auction> {
        ApiResponse::from_result(
            "Auction fetched successfully",
            self.store
                .get(auction_id)
                .ok_or(GavelError::AuctionNotFound(auction_id)),
        )
    }

    /// All bids on one auction, in placement order.
    pub fn bids(&self, auction_id: AuctionId) -> ApiResponse<Vec<Bid>> {
        ApiResponse::from_result(
            "Bids fetched successfully",
            self.store
                .get(auction_id)
                .map(|a| a.bids)
                .ok_or(GavelError::AuctionNotFound(auction_id)),
        )
    }

    /// One bid by id, searched across all auctions.
    pub fn get_bid(&self, bid_id: BidId) -> ApiResponse<Bid> {
        let found = self
            .store
            .list()
            .into_iter()
            .find_map(|a| a.bid(bid_id).cloned())
            .ok_or(GavelError::BidNotFound(bid_id));
        ApiResponse::from_result("Bid fetched successfully", found)
    }

    /// The auction's winner, once settled.
    pub fn winner(&self, auction_id: AuctionId) -> ApiResponse<UserId> {
        let result = self
            .store
            .get(auction_id)
            .ok_or(GavelError::AuctionNotFound(auction_id))
            .and_then(|a| a.winner.ok_or(GavelError::NoWinner(auction_id)));
        ApiResponse::from_result("Winner fetched successfully", result)
    }
}
