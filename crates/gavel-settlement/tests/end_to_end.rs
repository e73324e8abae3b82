//! End-to-end integration tests across the whole engine.
//!
//! These tests exercise the full auction lifecycle:
//! Service facade -> Bid Engine -> Auction Store -> Finalizer / Scheduler
//!
//! They verify that the planes work together correctly in realistic
//! scenarios: multi-bidder auctions, outbid hold release, settlement
//! sweeps, double-finalize protection, and scheduler-driven settlement.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gavel_engine::BidReceipt;
use gavel_gateway::{MockDirectory, MockGateway};
use gavel_settlement::{AuctionService, CaptureOutcome};
use gavel_types::{
    AuctionId, AuctionStatus, BidOutcome, ContactInfo, EngineConfig, GavelError, ItemListing,
    PayoutRef, RemoteStatus, SchedulerConfig, UserId,
};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Helper: full marketplace rig with mock externals.
struct Marketplace {
    service: AuctionService<MockGateway, MockDirectory>,
    gateway: Arc<MockGateway>,
    directory: Arc<MockDirectory>,
}

impl Marketplace {
    fn new() -> Self {
        let gateway = Arc::new(MockGateway::new());
        let directory = Arc::new(MockDirectory::new());
        let service = AuctionService::new(
            Arc::clone(&gateway),
            Arc::clone(&directory),
            EngineConfig::default(),
        );
        Self {
            service,
            gateway,
            directory,
        }
    }

    fn open_auction(&self, seller: UserId, starting: i64) -> AuctionId {
        let resp = self
            .service
            .create_auction(
                seller,
                ItemListing {
                    name: "Road bike".to_string(),
                    description: "54cm, ridden twice".to_string(),
                },
                dec(starting),
                Utc::now() + chrono::Duration::seconds(60),
            );
        assert!(resp.success, "{}", resp.message);
        resp.data.unwrap().id
    }

    async fn bid(&self, auction: AuctionId, bidder: UserId, amount: i64) -> BidReceipt {
        let resp = self
            .service
            .place_bid(auction, bidder, dec(amount), ContactInfo::dummy())
            .await;
        assert!(resp.success, "{}", resp.message);
        resp.data.unwrap()
    }

    /// Push the deadline into the past so settlement can run.
    fn expire(&self, auction: AuctionId) {
        self.service
            .store()
            .update(auction, |a| {
                a.deadline = Utc::now() - chrono::Duration::seconds(1);
                Ok(())
            })
            .unwrap();
    }
}

// =============================================================================
// Test: The reference end-to-end scenario — two bids, capture, no extra release
// =============================================================================
#[tokio::test]
async fn e2e_two_bidder_auction_settles_cleanly() {
    let market = Marketplace::new();
    let seller = UserId::new();
    let alice = UserId::new();
    let bob = UserId::new();
    market.directory.register_payout(seller, PayoutRef::new("acct_seller"));

    let auction = market.open_auction(seller, 100);

    // A=150: hold opens, A leads.
    let a = market.bid(auction, alice, 150).await;
    assert_eq!(market.gateway.open_reservations(), 1);

    // B=200: hold opens, B leads, A's hold released.
    let b = market.bid(auction, bob, 200).await;
    assert_eq!(market.gateway.open_reservations(), 1);
    assert_eq!(
        market.gateway.remote_status(&a.reservation),
        Some(RemoteStatus::Canceled)
    );

    market.expire(auction);
    let resp = market.service.finalize(auction).await;
    assert!(resp.success, "{}", resp.message);
    let report = resp.data.unwrap();

    // B's 200 hold captured, winner=B, nothing else released at finalize.
    assert_eq!(report.capture, CaptureOutcome::Captured);
    assert_eq!(report.winner, Some(bob));
    assert_eq!(report.winning_amount, Some(dec(200)));
    assert_eq!(report.seller_payout, Some(PayoutRef::new("acct_seller")));
    assert!(report.fully_settled());
    assert_eq!(
        market.gateway.remote_status(&b.reservation),
        Some(RemoteStatus::Captured)
    );
    assert_eq!(market.gateway.open_reservations(), 0);
    assert_eq!(market.gateway.capture_count(), 1);

    let settled = market.service.get_auction(auction).data.unwrap();
    assert_eq!(settled.status, AuctionStatus::Ended);
    assert_eq!(settled.winner, Some(bob));
    assert_eq!(settled.captured_count(), 1);
    assert!(settled.unresolved_bids().is_empty(), "no bid left HELD");

    let winner = market.service.winner(auction);
    assert!(winner.success);
    assert_eq!(winner.data, Some(bob));
}

// =============================================================================
// Test: Monotonic amounts and low-bid rejection without side effects
// =============================================================================
#[tokio::test]
async fn e2e_current_amount_is_nondecreasing_and_low_bids_are_clean_rejects() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);

    let mut last = dec(100);
    for amount in [150, 180, 200] {
        market.bid(auction, UserId::new(), amount).await;
        let current = market
            .service
            .get_auction(auction)
            .data
            .unwrap()
            .current_amount;
        assert!(current >= last);
        last = current;
    }

    let opened_before = market.gateway.open_count();
    let resp = market
        .service
        .place_bid(auction, UserId::new(), dec(175), ContactInfo::dummy())
        .await;
    assert!(!resp.success);
    assert!(resp.message.contains("GV_ERR_200"));

    // The reject happened before any hold was opened.
    assert_eq!(market.gateway.open_count(), opened_before);
    assert_eq!(
        market
            .service
            .get_auction(auction)
            .data
            .unwrap()
            .current_amount,
        dec(200)
    );
}

// =============================================================================
// Test: Concurrent 120/130 race — one leader, no dangling reservations
// =============================================================================
#[tokio::test]
async fn e2e_concurrent_bids_never_leak_holds() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);
    let service = Arc::new(market.service);

    let low = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .place_bid(auction, UserId::new(), dec(120), ContactInfo::dummy())
                .await
        })
    };
    let high = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .place_bid(auction, UserId::new(), dec(130), ContactInfo::dummy())
                .await
        })
    };
    let (low, high) = (low.await.unwrap(), high.await.unwrap());

    assert!(high.success, "the 130 bid always lands");
    if !low.success {
        assert!(low.message.contains("GV_ERR_200"), "{}", low.message);
    }

    // Exactly one reservation (the leader's) remains open either way.
    let auction_state = service.get_auction(auction).data.unwrap();
    assert_eq!(auction_state.current_amount, dec(130));
    assert_eq!(market.gateway.open_reservations(), 1);
    let leader = auction_state.leader_bid().unwrap();
    assert_eq!(leader.amount, dec(130));
    assert_eq!(leader.outcome, BidOutcome::Held);
}

// =============================================================================
// Test: Declined card never touches the auction
// =============================================================================
#[tokio::test]
async fn e2e_declined_hold_is_a_clean_reject() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);
    market.gateway.reject_next_open();

    let resp = market
        .service
        .place_bid(auction, UserId::new(), dec(150), ContactInfo::dummy())
        .await;
    assert!(!resp.success);
    assert!(resp.message.contains("GV_ERR_300"));

    let auction_state = market.service.get_auction(auction).data.unwrap();
    assert!(auction_state.bids.is_empty());
    assert_eq!(auction_state.current_amount, dec(100));
    assert_eq!(market.gateway.open_reservations(), 0);
}

// =============================================================================
// Test: A stuck release at outbid time is recovered by the settlement sweep
// =============================================================================
#[tokio::test]
async fn e2e_stuck_outbid_hold_is_recovered_at_settlement() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);

    let a = market.bid(auction, UserId::new(), 150).await;
    market.gateway.fail_cancel_for(&a.reservation);
    market.bid(auction, UserId::new(), 200).await;

    // The failed release is flagged, and the auction kept moving.
    let state = market.service.get_auction(auction).data.unwrap();
    assert_eq!(state.bids[0].outcome, BidOutcome::RefundFailed);
    assert_eq!(state.current_amount, dec(200));

    // Gateway recovers; the finalize sweep retries the stuck hold.
    market.gateway.clear_failures();
    market.expire(auction);
    let report = market.service.finalize(auction).await.data.unwrap();
    assert!(report.fully_settled());

    let settled = market.service.get_auction(auction).data.unwrap();
    assert_eq!(settled.bids[0].outcome, BidOutcome::Released);
    assert_eq!(market.gateway.open_reservations(), 0);
}

// =============================================================================
// Test: Finalize is exactly-once; the second call makes no gateway calls
// =============================================================================
#[tokio::test]
async fn e2e_double_finalize_is_guarded() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);
    market.bid(auction, UserId::new(), 150).await;
    market.expire(auction);

    let first = market.service.finalize(auction).await;
    assert!(first.success);
    let calls = market.gateway.total_calls();

    let second = market.service.finalize(auction).await;
    assert!(!second.success);
    assert!(second.message.contains("GV_ERR_103"));
    assert_eq!(market.gateway.total_calls(), calls, "no gateway traffic");
}

// =============================================================================
// Test: Finalize before the deadline leaves everything untouched
// =============================================================================
#[tokio::test]
async fn e2e_early_finalize_rejected() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);
    market.bid(auction, UserId::new(), 150).await;

    let resp = market.service.finalize(auction).await;
    assert!(!resp.success);
    assert!(resp.message.contains("GV_ERR_102"));

    let state = market.service.get_auction(auction).data.unwrap();
    assert_eq!(state.status, AuctionStatus::Ongoing);
    assert_eq!(state.bids[0].outcome, BidOutcome::Held);
}

// =============================================================================
// Test: Settlement report applies the commission tier table
// =============================================================================
#[tokio::test]
async fn e2e_commission_applied_per_tier() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 500);
    market.bid(auction, UserId::new(), 750).await;
    market.expire(auction);

    let report = market.service.finalize(auction).await.data.unwrap();
    assert_eq!(report.commission_rate, Decimal::new(12, 2));
    assert_eq!(report.commission_fee, dec(90));
}

// =============================================================================
// Test: The background scheduler settles a due auction on its own
// =============================================================================
#[tokio::test]
async fn e2e_scheduler_settles_due_auction() {
    let market = Marketplace::new();
    let bidder = UserId::new();
    let auction = market.open_auction(UserId::new(), 100);
    let receipt = market.bid(auction, bidder, 150).await;
    market.expire(auction);

    let handle = market
        .service
        .start_scheduler(SchedulerConfig::fast(Duration::from_millis(10)));

    let mut settled = false;
    for _ in 0..200 {
        if market.service.get_auction(auction).data.unwrap().status
            == AuctionStatus::Ended
        {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.shutdown().await;

    assert!(settled, "scheduler never settled the auction");
    assert_eq!(
        market.gateway.remote_status(&receipt.reservation),
        Some(RemoteStatus::Captured)
    );
    assert_eq!(market.gateway.capture_count(), 1);

    let winner = market.service.winner(auction);
    assert!(winner.success);
    assert_eq!(winner.data, Some(bidder));
}

// =============================================================================
// Test: Scheduler racing a manual finalize still settles exactly once
// =============================================================================
#[tokio::test]
async fn e2e_scheduler_and_manual_finalize_race() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);
    market.bid(auction, UserId::new(), 150).await;
    market.expire(auction);

    let handle = market
        .service
        .start_scheduler(SchedulerConfig::fast(Duration::from_millis(1)));

    // Fire manual finalizes while the scheduler is scanning.
    let mut manual_ok = 0;
    for _ in 0..5 {
        let resp = market.service.finalize(auction).await;
        if resp.success {
            manual_ok += 1;
        } else {
            assert!(
                resp.message.contains("GV_ERR_103"),
                "only AlreadyFinalized is acceptable: {}",
                resp.message
            );
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    handle.shutdown().await;

    assert!(manual_ok <= 1, "at most one manual finalize can win");
    assert_eq!(market.gateway.capture_count(), 1, "captured exactly once");
    let state = market.service.get_auction(auction).data.unwrap();
    assert_eq!(state.captured_count(), 1);
}

// =============================================================================
// Test: Winner capture failure closes the auction but reports unsettled
// =============================================================================
#[tokio::test]
async fn e2e_winner_capture_failure_is_flagged_not_hidden() {
    let market = Marketplace::new();
    let auction = market.open_auction(UserId::new(), 100);
    let receipt = market.bid(auction, UserId::new(), 150).await;
    market.expire(auction);
    market.gateway.fail_capture_for(&receipt.reservation);

    let resp = market.service.finalize(auction).await;
    assert!(resp.success, "finalize itself completes");
    assert_eq!(resp.message, "Auction finalized; reconciliation required");
    let report = resp.data.unwrap();
    assert!(matches!(report.capture, CaptureOutcome::Failed { .. }));
    assert!(!report.fully_settled());

    // Ended regardless; a retried finalize is AlreadyFinalized.
    let state = market.service.get_auction(auction).data.unwrap();
    assert_eq!(state.status, AuctionStatus::Ended);
    let retry = market.service.finalize(auction).await;
    assert!(!retry.success);
    assert!(retry.message.contains("GV_ERR_103"));
}

// =============================================================================
// Test: Error taxonomy maps cleanly through the envelope
// =============================================================================
#[tokio::test]
async fn e2e_error_envelope_taxonomy() {
    let market = Marketplace::new();

    let missing = AuctionId::new();
    let resp = market.service.finalize(missing).await;
    assert!(!resp.success);
    assert!(resp.message.contains("GV_ERR_100"));

    let err = GavelError::PaymentGatewayUnavailable {
        reason: "connect timeout".into(),
    };
    assert!(err.is_transient());
    assert!(
        !GavelError::PaymentFailed {
            reason: "declined".into()
        }
        .is_transient()
    );
}
