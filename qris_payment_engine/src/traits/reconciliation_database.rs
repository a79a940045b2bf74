use chrono::Duration;
use qpg_common::Rupiah;
use thiserror::Error;

use crate::{
    codec::CodecError,
    db_types::{NewExpectation, OrderRef, PaymentExpectation, UniqueAmountReservation},
    traits::{ExpectationApiError, ExpectationManagement},
};

/// The number of values in the unique-amount pool. Reserved values are `1..=UNIQUE_AMOUNT_POOL_SIZE`, written
/// as zero-padded three-digit strings.
pub const UNIQUE_AMOUNT_POOL_SIZE: i64 = 200;

/// How long a unique-amount reservation is held before it lapses and the value can be recycled.
pub const RESERVATION_TTL: Duration = Duration::hours(1);

/// The outcome of a single attempt to claim a pool value. Backends report `ValueTaken` when the store's
/// uniqueness constraint rejects the insert, so that callers can draw again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertReservationResult {
    Inserted(UniqueAmountReservation),
    ValueTaken,
}

/// This trait defines the write-side behaviour for backends supporting the reconciliation engine.
///
/// This behaviour includes:
/// * Registering payment expectations ahead of an incoming payment.
/// * Reserving unique disambiguation amounts from a small shared pool.
/// * Driving the pending/completed state machine as notifications are matched.
#[allow(async_fn_in_trait)]
pub trait ReconciliationDatabase: Clone + ExpectationManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a registration request and stores the expectation in a single atomic transaction.
    /// This call is idempotent: re-registering a reference whose expectation already exists returns the stored
    /// record untouched.
    /// Returns true if the expectation was inserted, or false if it already existed.
    async fn insert_expectation(
        &self,
        expectation: NewExpectation,
    ) -> Result<(PaymentExpectation, bool), ReconciliationError>;

    /// Reserves a unique-amount value for the given reference.
    ///
    /// While the reference holds an active reservation, the same value is returned unchanged. Otherwise
    /// reservations past their expiry are purged and a fresh value is drawn at random from the pool; a draw that
    /// loses the race to a concurrent caller ([`InsertReservationResult::ValueTaken`]) is retried with a new
    /// value, up to [`UNIQUE_AMOUNT_POOL_SIZE`] attempts.
    async fn reserve_unique_amount(
        &self,
        reference: &OrderRef,
    ) -> Result<UniqueAmountReservation, ReconciliationError>;

    /// Records the reserved value against a pending expectation, setting `expected_amount` to
    /// `original_amount` plus the value.
    async fn attach_unique_amount(
        &self,
        reference: &OrderRef,
        reservation: &UniqueAmountReservation,
    ) -> Result<PaymentExpectation, ReconciliationError>;

    /// Fetches the pending expectations whose `expected_amount` equals `amount` and that were created within
    /// the trailing `window`, oldest first.
    async fn pending_candidates(
        &self,
        amount: Rupiah,
        window: Duration,
    ) -> Result<Vec<PaymentExpectation>, ReconciliationError>;

    /// Transitions a pending expectation to completed and stamps `completed_at`.
    ///
    /// The update is conditional on the current status, so a redelivered notification that has already been
    /// matched returns `None` rather than completing twice.
    async fn complete_expectation(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ReconciliationError>;

    /// Rolls a completed expectation back to pending and clears `completed_at`. Returns `None` when the
    /// expectation was not completed.
    async fn revert_expectation(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ReconciliationError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), ReconciliationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("We have an internal database engine problem (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Every value in the unique-amount pool is reserved right now. Try again later.")]
    UniqueAmountPoolExhausted,
    #[error("The requested expectation {0} does not exist")]
    ExpectationNotFound(OrderRef),
    #[error("Order {0} has already been paid and completed")]
    OrderAlreadyCompleted(OrderRef),
    #[error("{0}")]
    ExpectationError(#[from] ExpectationApiError),
    #[error("The supplied payload could not be converted: {0}")]
    CodecError(#[from] CodecError),
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}
