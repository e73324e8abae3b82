//! # gavel-engine
//!
//! **Auction core**: the versioned store of record and the bid engine.
//!
//! ## Architecture
//!
//! 1. **AuctionStore**: single source of truth; per-auction conditional
//!    writes (version compare-and-swap) serialize every read-modify-write
//!    on one auction while leaving cross-auction traffic fully parallel
//! 2. **BidEngine**: validates a bid, opens a manual-capture hold through
//!    the gateway, applies the bid under the version check, and releases
//!    the displaced leader's hold
//!
//! ## Bid Flow
//!
//! ```text
//! API → snapshot/validate → Directory.payer_account() → Gateway.open_hold()
//!     → Store.try_commit() [re-validate, retry] → Gateway.cancel_hold(prev)
//! ```
//!
//! Every accepted bid holds funds; every rejected bid leaves zero state
//! and zero live reservations behind.

pub mod bid;
pub mod store;

pub use bid::{BidEngine, BidReceipt};
pub use store::{AuctionStore, CommitError, Version};
