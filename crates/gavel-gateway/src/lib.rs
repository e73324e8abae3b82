//! # gavel-gateway
//!
//! **External collaborator boundary**: client traits for the payment
//! processor's reservation primitives and the account directory, plus
//! in-memory doubles for tests.
//!
//! ## Architecture
//!
//! The engine never talks to the processor directly; it goes through:
//! 1. **ReservationGateway**: open/capture/cancel/refund/status on
//!    payment holds — the only suspension points in the system
//! 2. **AccountDirectory**: user → payer registration and payout
//!    destination resolution
//!
//! The local bid outcome is a cache of gateway truth: after any timeout
//! the caller reconciles via `status` before retrying, never blindly.

pub mod directory;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod reservation;

pub use directory::AccountDirectory;
#[cfg(any(test, feature = "test-helpers"))]
pub use mock::{MockDirectory, MockGateway};
pub use reservation::{HoldConfirmation, HoldRequest, ReservationGateway};
