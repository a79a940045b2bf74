use std::fmt::Display;

use chrono::{DateTime, Utc};
use qpg_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ExpectationStatus, OrderRef},
    traits::ExpectationApiError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationQueryFilter {
    pub order_reference: Option<OrderRef>,
    /// A substring to match against order references
    pub reference_like: Option<String>,
    /// Matches against `expected_amount`
    pub amount: Option<Rupiah>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<ExpectationStatus>>,
}

impl ExpectationQueryFilter {
    pub fn with_order_reference(mut self, reference: OrderRef) -> Self {
        self.order_reference = Some(reference);
        self
    }

    pub fn with_reference_like(mut self, pattern: String) -> Self {
        self.reference_like = Some(pattern);
        self
    }

    pub fn with_amount(mut self, amount: Rupiah) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, ExpectationApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| ExpectationApiError::QueryError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, ExpectationApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| ExpectationApiError::QueryError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn with_status(mut self, status: ExpectationStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_reference.is_none() &&
            self.reference_like.is_none() &&
            self.amount.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for ExpectationQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(reference) = &self.order_reference {
            write!(f, "order_reference: {reference}. ")?;
        }
        if let Some(pattern) = &self.reference_like {
            write!(f, "reference like: {pattern}. ")?;
        }
        if let Some(amount) = &self.amount {
            write!(f, "amount: {amount}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}
