//! Interface contracts for reconciliation database backends.
//!
//! An *expectation* is a record that ties a merchant order reference to the exact amount the engine is waiting
//! to see in an incoming payment notification, together with its lifecycle state.
//!
//! The [`ReconciliationDatabase`] trait defines the write-side behaviour a backend must expose: registering
//! expectations, reserving unique disambiguation amounts, and driving the pending/completed state machine.
//!
//! The [`ExpectationManagement`] trait provides the read-side queries over expectations and reservations.
mod expectation_management;
mod reconciliation_database;

pub use expectation_management::{ExpectationApiError, ExpectationManagement};
pub use reconciliation_database::{
    InsertReservationResult,
    ReconciliationDatabase,
    ReconciliationError,
    RESERVATION_TTL,
    UNIQUE_AMOUNT_POOL_SIZE,
};
