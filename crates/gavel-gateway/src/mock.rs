//! In-memory gateway and directory doubles for tests.
//!
//! `MockGateway` keeps a reservation table with the same terminal-state
//! semantics as the real processor (open → captured | canceled,
//! captured → refunded) plus failure injection and call counters, so
//! tests can assert properties like "a second finalize performs no
//! gateway calls" or "no hold is ever left dangling".
//!
//! **Never use in production.**

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use gavel_types::{
    GavelError, PayerRef, PayoutRef, RemoteStatus, ReservationId, Result, UserId,
};

use crate::directory::AccountDirectory;
use crate::reservation::{HoldConfirmation, HoldRequest, ReservationGateway};

#[derive(Default)]
struct MockState {
    reservations: HashMap<ReservationId, RemoteStatus>,
    next_seq: u64,
    opens: u64,
    captures: u64,
    cancels: u64,
    refunds: u64,
    status_reads: u64,
    reject_next_open: bool,
    fail_capture: HashSet<ReservationId>,
    fail_cancel: HashSet<ReservationId>,
    fail_refund: HashSet<ReservationId>,
}

/// Deterministic in-memory stand-in for the payment processor.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open_hold` fail as a card decline.
    pub fn reject_next_open(&self) {
        self.state.lock().unwrap().reject_next_open = true;
    }

    /// Make every `capture` of `reservation` fail.
    pub fn fail_capture_for(&self, reservation: &ReservationId) {
        self.state
            .lock()
            .unwrap()
            .fail_capture
            .insert(reservation.clone());
    }

    /// Make every `cancel_hold` of `reservation` fail.
    pub fn fail_cancel_for(&self, reservation: &ReservationId) {
        self.state
            .lock()
            .unwrap()
            .fail_cancel
            .insert(reservation.clone());
    }

    /// Make every `refund` of `reservation` fail.
    pub fn fail_refund_for(&self, reservation: &ReservationId) {
        self.state
            .lock()
            .unwrap()
            .fail_refund
            .insert(reservation.clone());
    }

    /// Drop all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.reject_next_open = false;
        state.fail_capture.clear();
        state.fail_cancel.clear();
        state.fail_refund.clear();
    }

    /// Overwrite a reservation's remote state, bypassing the legal
    /// transitions. For reconciliation tests (e.g. a hold captured by
    /// mistake behind the engine's back).
    pub fn force_status(&self, reservation: &ReservationId, status: RemoteStatus) {
        self.state
            .lock()
            .unwrap()
            .reservations
            .insert(reservation.clone(), status);
    }

    /// The remote state of a reservation, if it exists.
    #[must_use]
    pub fn remote_status(&self, reservation: &ReservationId) -> Option<RemoteStatus> {
        self.state
            .lock()
            .unwrap()
            .reservations
            .get(reservation)
            .copied()
    }

    /// Number of reservations still in the OPEN state.
    #[must_use]
    pub fn open_reservations(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .reservations
            .values()
            .filter(|s| s.is_open())
            .count()
    }

    /// Number of reservations ever opened.
    #[must_use]
    pub fn open_count(&self) -> u64 {
        self.state.lock().unwrap().opens
    }

    #[must_use]
    pub fn capture_count(&self) -> u64 {
        self.state.lock().unwrap().captures
    }

    #[must_use]
    pub fn cancel_count(&self) -> u64 {
        self.state.lock().unwrap().cancels
    }

    #[must_use]
    pub fn refund_count(&self) -> u64 {
        self.state.lock().unwrap().refunds
    }

    /// Total gateway calls of any kind, including status reads.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        let state = self.state.lock().unwrap();
        state.opens + state.captures + state.cancels + state.refunds + state.status_reads
    }
}

impl ReservationGateway for MockGateway {
    async fn open_hold(&self, request: HoldRequest) -> Result<HoldConfirmation> {
        let mut state = self.state.lock().unwrap();
        state.opens += 1;
        if state.reject_next_open {
            state.reject_next_open = false;
            return Err(GavelError::PaymentFailed {
                reason: format!("card declined for {}", request.payer),
            });
        }
        state.next_seq += 1;
        let reservation = ReservationId::new(format!("hold_{:06}", state.next_seq));
        state
            .reservations
            .insert(reservation.clone(), RemoteStatus::Open);
        tracing::debug!(%reservation, amount = %request.amount, "mock hold opened");
        Ok(HoldConfirmation {
            confirmation_token: format!("tok_{:06}", state.next_seq),
            reservation,
        })
    }

    async fn capture(&self, reservation: &ReservationId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.captures += 1;
        if state.fail_capture.contains(reservation) {
            return Err(GavelError::PaymentFailed {
                reason: format!("capture rejected for {reservation}"),
            });
        }
        match state.reservations.get_mut(reservation) {
            Some(status @ RemoteStatus::Open) => {
                *status = RemoteStatus::Captured;
                Ok(())
            }
            Some(status) => Err(GavelError::PaymentFailed {
                reason: format!("{reservation} is {status}, not capturable"),
            }),
            None => Err(GavelError::PaymentFailed {
                reason: format!("unknown reservation {reservation}"),
            }),
        }
    }

    async fn cancel_hold(&self, reservation: &ReservationId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.cancels += 1;
        if state.fail_cancel.contains(reservation) {
            return Err(GavelError::PaymentGatewayUnavailable {
                reason: format!("cancel timed out for {reservation}"),
            });
        }
        match state.reservations.get_mut(reservation) {
            Some(status @ RemoteStatus::Open) => {
                *status = RemoteStatus::Canceled;
                Ok(())
            }
            Some(status) => Err(GavelError::PaymentFailed {
                reason: format!("{reservation} is {status}, not cancelable"),
            }),
            None => Err(GavelError::PaymentFailed {
                reason: format!("unknown reservation {reservation}"),
            }),
        }
    }

    async fn refund(&self, reservation: &ReservationId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.refunds += 1;
        if state.fail_refund.contains(reservation) {
            return Err(GavelError::PaymentGatewayUnavailable {
                reason: format!("refund timed out for {reservation}"),
            });
        }
        match state.reservations.get_mut(reservation) {
            Some(status @ RemoteStatus::Captured) => {
                *status = RemoteStatus::Refunded;
                Ok(())
            }
            Some(status) => Err(GavelError::PaymentFailed {
                reason: format!("{reservation} is {status}, not refundable"),
            }),
            None => Err(GavelError::PaymentFailed {
                reason: format!("unknown reservation {reservation}"),
            }),
        }
    }

    async fn status(&self, reservation: &ReservationId) -> Result<RemoteStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_reads += 1;
        state
            .reservations
            .get(reservation)
            .copied()
            .ok_or_else(|| GavelError::PaymentFailed {
                reason: format!("unknown reservation {reservation}"),
            })
    }
}

#[derive(Default)]
struct DirectoryState {
    payers: HashMap<UserId, PayerRef>,
    payouts: HashMap<UserId, PayoutRef>,
    next_seq: u64,
    fail_payer: bool,
}

/// In-memory account directory double with get-or-create payer semantics.
#[derive(Default)]
pub struct MockDirectory {
    state: Mutex<DirectoryState>,
}

impl MockDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payout destination for a seller.
    pub fn register_payout(&self, user: UserId, destination: PayoutRef) {
        self.state.lock().unwrap().payouts.insert(user, destination);
    }

    /// Make every `payer_account` lookup fail.
    pub fn fail_payer_lookups(&self, fail: bool) {
        self.state.lock().unwrap().fail_payer = fail;
    }
}

impl AccountDirectory for MockDirectory {
    async fn payer_account(&self, user: UserId) -> Result<PayerRef> {
        let mut state = self.state.lock().unwrap();
        if state.fail_payer {
            return Err(GavelError::PaymentFailed {
                reason: format!("no payment profile for user {user}"),
            });
        }
        if let Some(payer) = state.payers.get(&user) {
            return Ok(payer.clone());
        }
        state.next_seq += 1;
        let payer = PayerRef::new(format!("cus_{:06}", state.next_seq));
        state.payers.insert(user, payer.clone());
        Ok(payer)
    }

    async fn payout_destination(&self, user: UserId) -> Result<Option<PayoutRef>> {
        Ok(self.state.lock().unwrap().payouts.get(&user).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_types::{AuctionId, ContactInfo};
    use rust_decimal::Decimal;

    fn request(amount: i64) -> HoldRequest {
        HoldRequest::new(
            PayerRef::new("cus_test"),
            Decimal::new(amount, 0),
            "EUR",
            AuctionId::new(),
            UserId::new(),
            ContactInfo::dummy(),
        )
    }

    #[tokio::test]
    async fn hold_lifecycle_capture() {
        let gw = MockGateway::new();
        let hold = gw.open_hold(request(150)).await.unwrap();
        assert_eq!(gw.remote_status(&hold.reservation), Some(RemoteStatus::Open));

        gw.capture(&hold.reservation).await.unwrap();
        assert_eq!(
            gw.remote_status(&hold.reservation),
            Some(RemoteStatus::Captured)
        );
        assert_eq!(gw.open_reservations(), 0);
    }

    #[tokio::test]
    async fn hold_lifecycle_cancel() {
        let gw = MockGateway::new();
        let hold = gw.open_hold(request(150)).await.unwrap();
        gw.cancel_hold(&hold.reservation).await.unwrap();
        assert_eq!(
            gw.remote_status(&hold.reservation),
            Some(RemoteStatus::Canceled)
        );
    }

    #[tokio::test]
    async fn captured_hold_cannot_be_canceled() {
        let gw = MockGateway::new();
        let hold = gw.open_hold(request(150)).await.unwrap();
        gw.capture(&hold.reservation).await.unwrap();
        let err = gw.cancel_hold(&hold.reservation).await.unwrap_err();
        assert!(matches!(err, GavelError::PaymentFailed { .. }));
    }

    #[tokio::test]
    async fn refund_only_after_capture() {
        let gw = MockGateway::new();
        let hold = gw.open_hold(request(150)).await.unwrap();
        assert!(gw.refund(&hold.reservation).await.is_err());

        gw.capture(&hold.reservation).await.unwrap();
        gw.refund(&hold.reservation).await.unwrap();
        assert_eq!(
            gw.remote_status(&hold.reservation),
            Some(RemoteStatus::Refunded)
        );
    }

    #[tokio::test]
    async fn reject_next_open_is_one_shot() {
        let gw = MockGateway::new();
        gw.reject_next_open();
        assert!(gw.open_hold(request(150)).await.is_err());
        assert!(gw.open_hold(request(150)).await.is_ok());
    }

    #[tokio::test]
    async fn call_counters_track_every_call() {
        let gw = MockGateway::new();
        let hold = gw.open_hold(request(150)).await.unwrap();
        gw.status(&hold.reservation).await.unwrap();
        gw.capture(&hold.reservation).await.unwrap();
        assert_eq!(gw.total_calls(), 3);
    }

    #[tokio::test]
    async fn directory_get_or_create_is_stable() {
        let dir = MockDirectory::new();
        let user = UserId::new();
        let a = dir.payer_account(user).await.unwrap();
        let b = dir.payer_account(user).await.unwrap();
        assert_eq!(a, b);

        let other = dir.payer_account(UserId::new()).await.unwrap();
        assert_ne!(a, other);
    }

    #[tokio::test]
    async fn payout_destination_requires_onboarding() {
        let dir = MockDirectory::new();
        let seller = UserId::new();
        assert!(dir.payout_destination(seller).await.unwrap().is_none());

        dir.register_payout(seller, PayoutRef::new("acct_1"));
        assert_eq!(
            dir.payout_destination(seller).await.unwrap(),
            Some(PayoutRef::new("acct_1"))
        );
    }
}
