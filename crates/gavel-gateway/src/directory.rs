//! Account Directory client — user-to-payment-identity resolution.
//!
//! The directory is an external collaborator mapping marketplace users to
//! their processor-side identities: the payer registration a hold is
//! opened against, and the payout destination a seller's commission split
//! is released to.

use std::future::Future;

use gavel_types::{PayerRef, PayoutRef, Result, UserId};

/// Resolves marketplace users to payment-processor identifiers.
pub trait AccountDirectory: Send + Sync {
    /// The payer registration for a bidder, created on first use.
    ///
    /// Mirrors the processor's get-or-create customer flow: an existing
    /// registration is reused, otherwise one is created and remembered.
    fn payer_account(&self, user: UserId) -> impl Future<Output = Result<PayerRef>> + Send;

    /// The seller's registered payout destination, or `None` if the user
    /// never completed payout onboarding.
    fn payout_destination(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<PayoutRef>>> + Send;
}
