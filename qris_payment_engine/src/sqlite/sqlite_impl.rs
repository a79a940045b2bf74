//! `SqliteDatabase` is a concrete implementation of a reconciliation engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use qpg_common::Rupiah;
use rand::Rng;
use sqlx::SqlitePool;

use super::db::{db_url, expectations, new_pool, reservations};
use crate::{
    db_types::{NewExpectation, OrderRef, PaymentExpectation, UniqueAmountReservation},
    expectation_objects::ExpectationQueryFilter,
    traits::{
        ExpectationApiError,
        ExpectationManagement,
        InsertReservationResult,
        ReconciliationDatabase,
        ReconciliationError,
        RESERVATION_TTL,
        UNIQUE_AMOUNT_POOL_SIZE,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API pointing at the URL in the `QPG_DATABASE_URL` environment variable, falling
    /// back to the default path.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_expectation(
        &self,
        expectation: NewExpectation,
    ) -> Result<(PaymentExpectation, bool), ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let (expectation, inserted) = expectations::idempotent_insert(expectation, &mut tx).await?;
        tx.commit().await?;
        if inserted {
            debug!("🗃️ Expectation for {} has been saved in the DB", expectation.order_reference);
        }
        Ok((expectation, inserted))
    }

    async fn reserve_unique_amount(
        &self,
        reference: &OrderRef,
    ) -> Result<UniqueAmountReservation, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let now = Utc::now();
        if let Some(active) = reservations::fetch_active(reference, now, &mut conn).await? {
            trace!("🗃️ {reference} already holds unique amount {}. Reusing it.", active.value);
            return Ok(active);
        }
        reservations::purge_expired(now, &mut conn).await?;
        let expires_at = now + RESERVATION_TTL;
        // Concurrent callers race on the table's uniqueness constraint rather than any in-process lock, so a
        // lost draw just means drawing again.
        for _ in 0..UNIQUE_AMOUNT_POOL_SIZE {
            let value = format!("{:03}", rand::thread_rng().gen_range(1..=UNIQUE_AMOUNT_POOL_SIZE));
            match reservations::try_insert(&value, reference, expires_at, &mut conn).await? {
                InsertReservationResult::Inserted(reservation) => {
                    debug!("🗃️ Unique amount {} reserved for {reference}", reservation.value);
                    return Ok(reservation);
                },
                InsertReservationResult::ValueTaken => {
                    trace!("🗃️ Unique amount {value} is taken. Drawing again.");
                },
            }
        }
        warn!("🗃️ The unique-amount pool has no free values left for {reference}");
        Err(ReconciliationError::UniqueAmountPoolExhausted)
    }

    async fn attach_unique_amount(
        &self,
        reference: &OrderRef,
        reservation: &UniqueAmountReservation,
    ) -> Result<PaymentExpectation, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let expectation = expectations::attach_unique_amount(reference, reservation.amount(), &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Expectation for {reference} now waits on {} ({} + {})",
            expectation.expected_amount, expectation.original_amount, expectation.unique_amount
        );
        Ok(expectation)
    }

    async fn pending_candidates(
        &self,
        amount: Rupiah,
        window: Duration,
    ) -> Result<Vec<PaymentExpectation>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let candidates = expectations::pending_candidates(amount, window, &mut conn).await?;
        Ok(candidates)
    }

    async fn complete_expectation(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let expectation = expectations::complete_expectation(reference, &mut conn).await?;
        if let Some(expectation) = &expectation {
            debug!("🗃️ Expectation for {reference} marked as completed at {:?}", expectation.completed_at);
        }
        Ok(expectation)
    }

    async fn revert_expectation(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let expectation = expectations::revert_expectation(reference, &mut conn).await?;
        if expectation.is_some() {
            warn!("🗃️ Expectation for {reference} was rolled back to pending");
        }
        Ok(expectation)
    }

    async fn close(&mut self) -> Result<(), ReconciliationError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ExpectationManagement for SqliteDatabase {
    async fn fetch_expectation_by_reference(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<PaymentExpectation>, ExpectationApiError> {
        let mut conn = self.pool.acquire().await?;
        let expectation = expectations::fetch_expectation_by_reference(reference, &mut conn).await?;
        Ok(expectation)
    }

    async fn fetch_reservation_for_reference(
        &self,
        reference: &OrderRef,
    ) -> Result<Option<UniqueAmountReservation>, ExpectationApiError> {
        let mut conn = self.pool.acquire().await?;
        let reservation = reservations::fetch_active(reference, Utc::now(), &mut conn).await?;
        Ok(reservation)
    }

    async fn search_expectations(
        &self,
        query: ExpectationQueryFilter,
    ) -> Result<Vec<PaymentExpectation>, ExpectationApiError> {
        let mut conn = self.pool.acquire().await?;
        let expectations = expectations::search_expectations(query, &mut conn).await?;
        Ok(expectations)
    }
}
