use thiserror::Error;

use crate::{
    db_types::{OrderRef, PaymentExpectation, UniqueAmountReservation},
    expectation_objects::ExpectationQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum ExpectationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for ExpectationApiError {
    fn from(e: sqlx::Error) -> Self {
        ExpectationApiError::DatabaseError(e.to_string())
    }
}

/// The `ExpectationManagement` trait defines the read-side queries over payment expectations.
///
/// The [`ReconciliationDatabase`][crate::traits::ReconciliationDatabase] trait handles the machinery of
/// registering expectations and matching notifications against them. `ExpectationManagement` only looks.
#[allow(async_fn_in_trait)]
pub trait ExpectationManagement {
    /// Fetches the expectation registered under the given merchant reference. If none exists, `None` is
    /// returned.
    async fn fetch_expectation_by_reference(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ExpectationApiError>;

    /// Fetches the unique-amount reservation currently held by the given reference, ignoring lapsed ones.
    async fn fetch_reservation_for_reference(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<UniqueAmountReservation>, ExpectationApiError>;

    async fn search_expectations(
        &self,
        query: ExpectationQueryFilter,
    ) -> Result<Vec<PaymentExpectation>, ExpectationApiError>;
}
