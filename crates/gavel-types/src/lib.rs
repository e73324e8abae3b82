//! # gavel-types
//!
//! Shared types, errors, and configuration for the **Gavel** marketplace
//! auction engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AuctionId`], [`BidId`], [`UserId`], [`ReservationId`], [`PayerRef`], [`PayoutRef`]
//! - **Auction model**: [`Auction`], [`AuctionStatus`], [`ItemListing`]
//! - **Bid model**: [`Bid`], [`BidOutcome`], [`ContactInfo`]
//! - **Reservation model**: [`RemoteStatus`]
//! - **Commission model**: [`CommissionTable`], [`CommissionTier`]
//! - **API envelope**: [`ApiResponse`]
//! - **Configuration**: [`EngineConfig`], [`SchedulerConfig`]
//! - **Errors**: [`GavelError`] with `GV_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod auction;
pub mod bid;
pub mod commission;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod reservation;

// Re-export all primary types at crate root for ergonomic imports:
//   use gavel_types::{Auction, Bid, BidOutcome, GavelError, ...};

pub use auction::*;
pub use bid::*;
pub use commission::*;
pub use config::*;
pub use envelope::*;
pub use error::*;
pub use ids::*;
pub use reservation::*;

// Constants are accessed via `gavel_types::constants::FOO`
// (not re-exported to avoid name collisions).
