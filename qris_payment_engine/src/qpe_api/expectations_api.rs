//! Unified read API for payment expectations.

use std::fmt::Debug;

use log::trace;
use qpg_common::Rupiah;

use crate::{
    db_types::{OrderRef, PaymentExpectation, UniqueAmountReservation},
    expectation_objects::ExpectationQueryFilter,
    traits::{ExpectationApiError, ExpectationManagement},
};

/// The `ExpectationsApi` provides a unified read-only view over registered expectations and their reservations.
pub struct ExpectationsApi<B> {
    db: B,
}

impl<B: Debug> Debug for ExpectationsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExpectationsApi ({:?})", self.db)
    }
}

impl<B> ExpectationsApi<B>
where B: ExpectationManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the expectation registered under the given reference. If none exists, `None` is returned.
    pub async fn expectation_by_reference(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ExpectationApiError> {
        self.db.fetch_expectation_by_reference(reference).await
    }

    /// Fetches the active unique-amount reservation held by the reference, if any.
    pub async fn reservation_for_reference(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<UniqueAmountReservation>, ExpectationApiError> {
        self.db.fetch_reservation_for_reference(reference).await
    }

    /// The disambiguation value the reference currently holds, as a rupiah amount.
    pub async fn active_unique_amount(&self, reference: &OrderRef) -> Result<Option<Rupiah>, ExpectationApiError> {
        let reservation = self.reservation_for_reference(reference).await?;
        Ok(reservation.map(|r| r.amount()))
    }

    pub async fn search_expectations(
        &self,
        query: ExpectationQueryFilter,
    ) -> Result<Vec<PaymentExpectation>, ExpectationApiError> {
        trace!("🔍️ Searching expectations: {query}");
        self.db.search_expectations(query).await
    }
}
