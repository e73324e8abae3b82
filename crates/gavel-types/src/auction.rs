//! Auction entity — the authoritative state of one time-bounded sale.
//!
//! An auction is created `Ongoing` with no bids, mutated by the bid engine
//! for its entire ongoing lifetime (new bid appended, leader replaced,
//! prior leader's hold released), and mutated exactly once more by the
//! finalizer, which transitions it to `Ended` and fixes the winner.
//! There is no deletion path; archival is an external concern.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionId, Bid, BidOutcome, UserId};

/// Lifecycle status of an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Accepting bids until the deadline.
    Ongoing,
    /// Settled (or settling). Terminal; the winner is fixed.
    Ended,
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ONGOING"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}

/// The listed item an auction is selling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListing {
    pub name: String,
    pub description: String,
}

/// One time-bounded auction and its full bid history.
///
/// Invariants maintained by the engine:
/// - `current_amount` equals the greatest live bid's amount, or
///   `starting_price` if no bids exist; `current_leader` is that bidder.
/// - While `Ongoing`, `winner` is `None`. Once `Ended`, `winner` is
///   immutable and equals the bidder of the globally maximum bid (or
///   `None` if no bids were ever placed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub seller: UserId,
    pub item: ItemListing,
    /// Price bidding starts from. A bid must strictly exceed
    /// `current_amount`, which begins equal to this.
    pub starting_price: Decimal,
    /// Highest accepted amount so far (== `starting_price` with no bids).
    pub current_amount: Decimal,
    /// Bidder of the highest accepted bid, if any.
    pub current_leader: Option<UserId>,
    /// Moment bidding closes. The deadline scheduler finalizes past this.
    pub deadline: DateTime<Utc>,
    pub status: AuctionStatus,
    /// Set exactly once, by the finalizer.
    pub winner: Option<UserId>,
    /// Append-only bid history, in placement order.
    pub bids: Vec<Bid>,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// Create a new ongoing auction with no bids.
    #[must_use]
    pub fn open(
        seller: UserId,
        item: ItemListing,
        starting_price: Decimal,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuctionId::new(),
            seller,
            item,
            starting_price,
            current_amount: starting_price,
            current_leader: None,
            deadline,
            status: AuctionStatus::Ongoing,
            winner: None,
            bids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether the auction can still accept bids at `now`.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Ongoing && now <= self.deadline
    }

    /// The bid currently backing `current_leader`, if any.
    ///
    /// Because amounts strictly increase, the leader is always the most
    /// recently accepted bid.
    #[must_use]
    pub fn leader_bid(&self) -> Option<&Bid> {
        self.bids.last()
    }

    /// The winning bid: maximum amount, earliest placement on a tie.
    ///
    /// Ties should be impossible under a correct bid engine (an equal
    /// amount is rejected as not-greater at placement); the second tuple
    /// element reports whether one was observed so the caller can flag
    /// the invariant violation instead of resolving it silently.
    #[must_use]
    pub fn highest_bid(&self) -> (Option<&Bid>, bool) {
        let mut best: Option<&Bid> = None;
        let mut tie = false;
        for bid in &self.bids {
            match best {
                None => best = Some(bid),
                Some(b) if bid.amount > b.amount => {
                    best = Some(bid);
                }
                Some(b) if bid.amount == b.amount => {
                    tie = true;
                }
                Some(_) => {}
            }
        }
        (best, tie)
    }

    /// Look up a bid by id.
    #[must_use]
    pub fn bid(&self, id: crate::BidId) -> Option<&Bid> {
        self.bids.iter().find(|b| b.id == id)
    }

    /// Mutable lookup, for outcome transitions.
    pub fn bid_mut(&mut self, id: crate::BidId) -> Option<&mut Bid> {
        self.bids.iter_mut().find(|b| b.id == id)
    }

    /// Bids whose holds still need resolution (held or failed-release).
    #[must_use]
    pub fn unresolved_bids(&self) -> Vec<&Bid> {
        self.bids
            .iter()
            .filter(|b| b.outcome.needs_resolution())
            .collect()
    }

    /// Number of captured bids. More than one is an invariant violation.
    #[must_use]
    pub fn captured_count(&self) -> usize {
        self.bids
            .iter()
            .filter(|b| b.outcome == BidOutcome::Captured)
            .count()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Auction {
    /// An ongoing auction starting at `starting_price` with a deadline one
    /// hour out.
    pub fn dummy(starting_price: Decimal) -> Self {
        Self::open(
            UserId::new(),
            ItemListing {
                name: "Vintage camera".to_string(),
                description: "Tested, working".to_string(),
            },
            starting_price,
            Utc::now() + chrono::Duration::hours(1),
        )
    }

    /// An ongoing auction whose deadline already passed (due for settlement).
    pub fn dummy_expired(starting_price: Decimal) -> Self {
        let mut auction = Self::dummy(starting_price);
        auction.deadline = Utc::now() - chrono::Duration::seconds(5);
        auction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bid;

    #[test]
    fn open_auction_starts_clean() {
        let auction = Auction::dummy(Decimal::new(100, 0));
        assert_eq!(auction.status, AuctionStatus::Ongoing);
        assert_eq!(auction.current_amount, auction.starting_price);
        assert!(auction.current_leader.is_none());
        assert!(auction.winner.is_none());
        assert!(auction.bids.is_empty());
    }

    #[test]
    fn is_open_respects_deadline() {
        let auction = Auction::dummy(Decimal::new(100, 0));
        assert!(auction.is_open(Utc::now()));
        assert!(!auction.is_open(auction.deadline + chrono::Duration::seconds(1)));
    }

    #[test]
    fn is_open_respects_status() {
        let mut auction = Auction::dummy(Decimal::new(100, 0));
        auction.status = AuctionStatus::Ended;
        assert!(!auction.is_open(Utc::now()));
    }

    #[test]
    fn highest_bid_none_when_empty() {
        let auction = Auction::dummy(Decimal::new(100, 0));
        let (best, tie) = auction.highest_bid();
        assert!(best.is_none());
        assert!(!tie);
    }

    #[test]
    fn highest_bid_picks_maximum() {
        let mut auction = Auction::dummy(Decimal::new(100, 0));
        auction
            .bids
            .push(Bid::dummy(auction.id, UserId::new(), Decimal::new(150, 0)));
        auction
            .bids
            .push(Bid::dummy(auction.id, UserId::new(), Decimal::new(200, 0)));
        let (best, tie) = auction.highest_bid();
        assert_eq!(best.unwrap().amount, Decimal::new(200, 0));
        assert!(!tie);
    }

    #[test]
    fn highest_bid_flags_tie_and_keeps_earliest() {
        let mut auction = Auction::dummy(Decimal::new(100, 0));
        let first = Bid::dummy(auction.id, UserId::new(), Decimal::new(200, 0));
        let first_id = first.id;
        auction.bids.push(first);
        auction
            .bids
            .push(Bid::dummy(auction.id, UserId::new(), Decimal::new(200, 0)));
        let (best, tie) = auction.highest_bid();
        assert!(tie, "equal amounts must be reported as a tie");
        assert_eq!(best.unwrap().id, first_id, "earliest bid wins the tie");
    }

    #[test]
    fn unresolved_tracks_held_and_refund_failed() {
        let mut auction = Auction::dummy(Decimal::new(100, 0));
        let mut released = Bid::dummy(auction.id, UserId::new(), Decimal::new(150, 0));
        released.outcome = BidOutcome::Released;
        let mut stuck = Bid::dummy(auction.id, UserId::new(), Decimal::new(180, 0));
        stuck.outcome = BidOutcome::RefundFailed;
        let held = Bid::dummy(auction.id, UserId::new(), Decimal::new(200, 0));
        auction.bids.extend([released, stuck, held]);

        let unresolved = auction.unresolved_bids();
        assert_eq!(unresolved.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let auction = Auction::dummy(Decimal::new(100, 0));
        let json = serde_json::to_string(&auction).unwrap();
        let back: Auction = serde_json::from_str(&json).unwrap();
        assert_eq!(auction.id, back.id);
        assert_eq!(auction.starting_price, back.starting_price);
        assert_eq!(auction.status, back.status);
    }
}
