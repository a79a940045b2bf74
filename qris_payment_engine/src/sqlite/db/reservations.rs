use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderRef, UniqueAmountReservation},
    traits::InsertReservationResult,
};

/// Attempts to claim `value` for `reference`. The reservations table keys on the value, so a concurrent claim
/// of the same value surfaces as a unique violation and is reported as [`InsertReservationResult::ValueTaken`]
/// rather than an error.
pub async fn try_insert(
    value: &str,
    reference: &OrderRef,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<InsertReservationResult, sqlx::Error> {
    let created_at = Utc::now();
    let result = sqlx::query_as(
        r#"
            INSERT INTO unique_amount_reservations (value, order_reference, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(value)
    .bind(reference.as_str())
    .bind(created_at)
    .bind(expires_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(reservation) => Ok(InsertReservationResult::Inserted(reservation)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertReservationResult::ValueTaken),
        Err(e) => Err(e),
    }
}

/// Returns the reservation `reference` holds that has not lapsed yet, if any.
pub async fn fetch_active(
    reference: &OrderRef,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<UniqueAmountReservation>, sqlx::Error> {
    let reservation = sqlx::query_as(
        "SELECT * FROM unique_amount_reservations WHERE order_reference = $1 AND expires_at > $2 ORDER BY created_at \
         DESC LIMIT 1",
    )
    .bind(reference.as_str())
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(reservation)
}

/// Deletes reservations past their expiry, freeing their values for the next draw. Returns the number of rows
/// purged.
pub async fn purge_expired(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let purged = sqlx::query("DELETE FROM unique_amount_reservations WHERE expires_at <= $1")
        .bind(now)
        .execute(conn)
        .await?
        .rows_affected();
    if purged > 0 {
        debug!("📝️ Purged {purged} lapsed unique-amount reservation(s)");
    }
    Ok(purged)
}
