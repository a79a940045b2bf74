//! QRIS Payment Engine
//!
//! The QRIS Payment Engine turns a merchant's static QRIS code into single-use dynamic codes carrying an exact
//! payable amount, and reconciles asynchronously arriving payment notifications against the expectations it has
//! issued. This library contains the core logic for the engine. It is transport-agnostic.
//!
//! The library is divided into two main sections:
//! 1. The QR payload codec ([`mod@codec`]). A tag-length-value parser/encoder for merchant-presented QR payloads
//!    with a CRC-16 integrity trailer. The codec is pure and has no knowledge of the database.
//! 2. The reconciliation engine ([`PaymentFlowApi`] and friends). It registers payment expectations, reserves
//!    small disambiguation amounts from a bounded pool, and matches incoming payment-detected notifications to
//!    pending expectations. Specific backends (currently SQLite) implement the traits in [`mod@traits`] in order
//!    to act as a store for the engine.
//!
//! The engine also emits a `PaymentMatchedEvent` whenever a notification is accepted against an expectation.
//! A simple pub-sub hook system ([`mod@events`]) lets the surrounding service subscribe to these events and
//! deliver callbacks without coupling the engine to any transport.
pub mod codec;
pub mod db_types;
pub mod events;
pub mod helpers;
mod qpe_api;
mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use qpe_api::{
    expectation_objects,
    expectations_api::ExpectationsApi,
    payment_flow_api::{IssuedQr, MatchOutcome, PaymentFlowApi, MATCH_WINDOW},
};
pub use traits::{
    ExpectationApiError,
    ExpectationManagement,
    InsertReservationResult,
    ReconciliationDatabase,
    ReconciliationError,
    RESERVATION_TTL,
    UNIQUE_AMOUNT_POOL_SIZE,
};
