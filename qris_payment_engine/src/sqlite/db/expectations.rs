use chrono::{Duration, Utc};
use log::{debug, trace};
use qpg_common::Rupiah;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewExpectation, OrderRef, PaymentExpectation},
    expectation_objects::ExpectationQueryFilter,
    traits::ReconciliationError,
};

/// Inserts the expectation into the database, returning `false` in the second parameter if an expectation
/// already exists for the reference.
pub async fn idempotent_insert(
    expectation: NewExpectation,
    conn: &mut SqliteConnection,
) -> Result<(PaymentExpectation, bool), ReconciliationError> {
    if let Some(existing) = fetch_expectation_by_reference(&expectation.order_reference, conn).await? {
        return Ok((existing, false));
    }
    let reference = expectation.order_reference.clone();
    match insert_expectation(expectation, conn).await {
        Ok(expectation) => {
            debug!("📝️ Expectation for {} inserted with id {}", expectation.order_reference, expectation.id);
            Ok((expectation, true))
        },
        // a concurrent registration slipped in between the fetch and the insert
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let existing = fetch_expectation_by_reference(&reference, conn)
                .await?
                .ok_or(ReconciliationError::ExpectationNotFound(reference))?;
            Ok((existing, false))
        },
        Err(e) => Err(e.into()),
    }
}

/// Inserts a new expectation using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The expectation starts out pending with `expected_amount` equal to `original_amount`; a disambiguation
/// value is attached in a separate step.
async fn insert_expectation(
    expectation: NewExpectation,
    conn: &mut SqliteConnection,
) -> Result<PaymentExpectation, sqlx::Error> {
    let expectation = sqlx::query_as(
        r#"
            INSERT INTO payment_expectations (
                order_reference,
                original_amount,
                unique_amount,
                expected_amount,
                callback_url,
                created_at,
                updated_at
            ) VALUES ($1, $2, 0, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(expectation.order_reference.as_str())
    .bind(expectation.original_amount)
    .bind(expectation.original_amount)
    .bind(expectation.callback_url)
    .bind(expectation.created_at)
    .bind(expectation.created_at)
    .fetch_one(conn)
    .await?;
    Ok(expectation)
}

/// Returns the expectation registered under the given `order_reference`
pub async fn fetch_expectation_by_reference(
    reference: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentExpectation>, sqlx::Error> {
    let expectation = sqlx::query_as("SELECT * FROM payment_expectations WHERE order_reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(expectation)
}

/// Records a reserved disambiguation value against the pending expectation for `reference`, lifting
/// `expected_amount` to `original_amount + value`. Completed expectations are left alone.
pub async fn attach_unique_amount(
    reference: &OrderRef,
    value: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<PaymentExpectation, ReconciliationError> {
    let expectation = sqlx::query_as(
        r#"
            UPDATE payment_expectations
            SET unique_amount = $1, expected_amount = original_amount + $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_reference = $3 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(value)
    .bind(value)
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ReconciliationError::ExpectationNotFound(reference.clone()))?;
    Ok(expectation)
}

/// Fetches the pending expectations waiting on exactly `amount` that were created within the trailing
/// `window`, oldest first.
pub async fn pending_candidates(
    amount: Rupiah,
    window: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentExpectation>, sqlx::Error> {
    let cutoff = Utc::now() - window;
    let candidates = sqlx::query_as(
        "SELECT * FROM payment_expectations WHERE status = 'Pending' AND expected_amount = $1 AND created_at >= $2 \
         ORDER BY created_at ASC",
    )
    .bind(amount)
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(candidates)
}

/// Transitions the pending expectation for `reference` to completed, stamping `completed_at`. Returns `None`
/// when no pending expectation exists under that reference, which is how redelivered notifications are
/// swallowed.
pub async fn complete_expectation(
    reference: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentExpectation>, sqlx::Error> {
    let completed_at = Utc::now();
    let expectation = sqlx::query_as(
        r#"
            UPDATE payment_expectations
            SET status = 'Completed', completed_at = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_reference = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(completed_at)
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(expectation)
}

/// Rolls a completed expectation back to pending and clears the completion stamp. Returns `None` when the
/// expectation was not completed.
pub async fn revert_expectation(
    reference: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentExpectation>, sqlx::Error> {
    let expectation = sqlx::query_as(
        r#"
            UPDATE payment_expectations
            SET status = 'Pending', completed_at = NULL, updated_at = CURRENT_TIMESTAMP
            WHERE order_reference = $1 AND status = 'Completed'
            RETURNING *;
        "#,
    )
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(expectation)
}

/// Fetches expectations according to criteria specified in the `ExpectationQueryFilter`
///
/// Resulting expectations are ordered by `created_at` in ascending order
pub async fn search_expectations(
    query: ExpectationQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentExpectation>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM payment_expectations
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(reference) = query.order_reference {
        where_clause.push("order_reference = ");
        where_clause.push_bind_unseparated(reference.0);
    }
    if let Some(pattern) = query.reference_like {
        where_clause.push("order_reference LIKE ");
        where_clause.push_bind_unseparated(format!("%{pattern}%"));
    }
    if let Some(amount) = query.amount {
        where_clause.push("expected_amount = ");
        where_clause.push_bind_unseparated(amount);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<PaymentExpectation>();
    let expectations = query.fetch_all(conn).await?;
    trace!("Result of search_expectations: {:?}", expectations.len());
    Ok(expectations)
}
