use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use qpg_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       OrderRef        -------------------------------------------------------
/// The merchant-side reference for an order, e.g. an invoice number. It is the unique key under which a payment
/// expectation is registered, and the needle searched for in notification text during matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderRef(pub String);

impl FromStr for OrderRef {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   ExpectationStatus   -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ExpectationStatus {
    /// The expectation has been issued and no payment has been matched against it.
    Pending,
    /// A payment notification has been matched and verified against the expectation.
    Completed,
}

impl Display for ExpectationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectationStatus::Pending => write!(f, "Pending"),
            ExpectationStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl From<String> for ExpectationStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid expectation status: {value}. But this conversion cannot fail. Defaulting to Pending");
            ExpectationStatus::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for ExpectationStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid expectation status: {s}"))),
        }
    }
}

//--------------------------------------       MatchType       -------------------------------------------------------
/// How a notification was tied to an expectation. `OrderReferenceMatch` means the order reference was found in the
/// notification text; `AmountOnlyMatch` means the detected amount matched exactly one pending expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    OrderReferenceMatch,
    AmountOnlyMatch,
}

impl Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::OrderReferenceMatch => write!(f, "order_reference_match"),
            MatchType::AmountOnlyMatch => write!(f, "amount_only_match"),
        }
    }
}

//--------------------------------------  PaymentExpectation   -------------------------------------------------------
/// A registered expectation that a payment of exactly `expected_amount` will arrive for `order_reference`.
/// Expectations are never deleted; completed records remain as an audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PaymentExpectation {
    pub id: i64,
    pub order_reference: OrderRef,
    /// The amount the merchant asked for, before any disambiguation value was added
    pub original_amount: Rupiah,
    /// The disambiguation value drawn from the reservation pool. Zero when disambiguation was not requested
    pub unique_amount: Rupiah,
    /// `original_amount + unique_amount`. This is the amount embedded in the dynamic QR payload
    pub expected_amount: Rupiah,
    /// Where the callback for this order should be delivered. Interpretation is up to the subscribed hook
    pub callback_url: Option<String>,
    pub status: ExpectationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

//--------------------------------------     NewExpectation    -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewExpectation {
    /// The merchant's reference for the order
    pub order_reference: OrderRef,
    /// The base amount payable for the order
    pub original_amount: Rupiah,
    /// An optional callback locator carried on the matched event
    pub callback_url: Option<String>,
    /// When true, a unique disambiguation amount is reserved and added to the payable amount
    pub with_unique_amount: bool,
    /// The time the order was created on the merchant side
    pub created_at: DateTime<Utc>,
}

impl NewExpectation {
    pub fn new(order_reference: OrderRef, original_amount: Rupiah) -> Self {
        Self {
            order_reference,
            original_amount,
            callback_url: None,
            with_unique_amount: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_callback_url(mut self, url: String) -> Self {
        self.callback_url = Some(url);
        self
    }

    pub fn with_unique_amount(mut self) -> Self {
        self.with_unique_amount = true;
        self
    }

    pub fn is_equivalent(&self, expectation: &PaymentExpectation) -> bool {
        self.order_reference == expectation.order_reference
            && self.original_amount == expectation.original_amount
            && self.callback_url == expectation.callback_url
    }
}

//-------------------------------------- UniqueAmountReservation -----------------------------------------------------
/// A claim on one value of the disambiguation pool. The store enforces that at most one active reservation exists
/// per value; expired rows are purged lazily on the next allocation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UniqueAmountReservation {
    /// The reserved pool value as it appears in an amount, e.g. "042"
    pub value: String,
    pub order_reference: OrderRef,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UniqueAmountReservation {
    /// The reserved value as a rupiah amount.
    pub fn amount(&self) -> Rupiah {
        let value = self.value.parse::<i64>().unwrap_or_else(|_| {
            error!("Reservation value '{}' is not numeric. The pool only issues numeric values.", self.value);
            0
        });
        Rupiah::from(value)
    }
}

//-------------------------------------- PaymentNotification   -------------------------------------------------------
/// A payment-detected event as reported by the notification source. The `amount` is kept as the raw detected
/// string; normalization happens during matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// The detected amount, verbatim, e.g. "50137" or "Rp50.137"
    pub amount: String,
    pub title: String,
    pub body: String,
    /// The expanded notification text, when the source provides one
    pub big_text: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl PaymentNotification {
    pub fn new<S: Into<String>>(amount: S, title: S, body: S) -> Self {
        Self { amount: amount.into(), title: title.into(), body: body.into(), big_text: None, received_at: Utc::now() }
    }

    pub fn with_big_text(mut self, big_text: String) -> Self {
        self.big_text = Some(big_text);
        self
    }

    /// The searchable text of the notification: title, body and expanded text joined together.
    pub fn full_text(&self) -> String {
        match &self.big_text {
            Some(big_text) => format!("{} {} {}", self.title, self.body, big_text),
            None => format!("{} {}", self.title, self.body),
        }
    }
}
