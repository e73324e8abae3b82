//! # gavel-settlement
//!
//! **Settlement plane**: auction finalization, deadline scheduling, and
//! the inbound service facade.
//!
//! ## Architecture
//!
//! Settlement receives an ended auction and:
//! 1. Claims the terminal transition under the store's version check
//!    (the `AlreadyFinalized` guard — the sole double-settlement gate)
//! 2. Captures the winning hold
//! 3. Sweeps every losing hold: reconcile remote state, cancel or refund
//! 4. Reports commission and any anomalies needing operator remediation
//!
//! The [`DeadlineScheduler`] drives this from a background task; the
//! [`AuctionService`] drives it from the admin API. Both funnel through
//! the same [`Finalizer`], so at-least-once triggering is safe.

pub mod finalizer;
pub mod scheduler;
pub mod service;

pub use finalizer::{CaptureOutcome, Finalizer, SettlementReport, SweepFailure};
pub use scheduler::{DeadlineScheduler, SchedulerHandle};
pub use service::AuctionService;
