use chrono::{DateTime, Utc};
use qpg_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::db_types::{ExpectationStatus, MatchType, PaymentExpectation};

/// The JSON body to deliver to an expectation's callback URL after a successful match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// The merchant's reference for the matched expectation
    pub order_reference: String,
    /// The amount detected in the notification
    pub amount: Rupiah,
    /// The amount the expectation was waiting for
    pub expected_amount: Rupiah,
    /// The expectation status after the match
    pub status: ExpectationStatus,
    /// How the notification was tied to the expectation
    pub match_type: MatchType,
    /// The notification text the match was made from
    pub raw_text: String,
    /// When the match was made
    pub timestamp: DateTime<Utc>,
}

impl CallbackPayload {
    /// The payload serialized for delivery to a callback endpoint.
    pub fn as_json(&self) -> String {
        serde_json::to_string(self).expect("Failed to serialize CallbackPayload")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMatchedEvent {
    pub expectation: PaymentExpectation,
    pub payload: CallbackPayload,
}

impl PaymentMatchedEvent {
    pub fn new(expectation: PaymentExpectation, amount: Rupiah, match_type: MatchType, raw_text: String) -> Self {
        let payload = CallbackPayload {
            order_reference: expectation.order_reference.as_str().to_string(),
            amount,
            expected_amount: expectation.expected_amount,
            status: expectation.status,
            match_type,
            raw_text,
            timestamp: Utc::now(),
        };
        Self { expectation, payload }
    }
}
