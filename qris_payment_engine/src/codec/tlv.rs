use qpg_common::{IDR_CURRENCY_CODE, IDR_CURRENCY_NUMERIC};
use serde::Serialize;
use std::fmt::Display;

use super::{dynamic::CodecError, COUNTRY_FIELD, PAYLOAD_FORMAT_INDICATOR, POI_DYNAMIC, POI_STATIC, TAG_AMOUNT};

const MIN_PAYLOAD_LEN: usize = 50;
const MAX_PAYLOAD_LEN: usize = 500;

/// One parsed tag-length-value field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlvField {
    pub tag: String,
    pub length: usize,
    pub value: String,
}

/// Walks the payload's field grammar and returns the fields in payload order.
///
/// The walk starts after the format indicator and stops at the first malformed length (non-numeric, or running
/// past the end of the payload) or once only the four trailing CRC hex digits remain. Malformed input therefore
/// yields a partial field list rather than an error; use [`validate`] to check well-formedness.
pub fn parse_fields(payload: &str) -> Vec<TlvField> {
    let mut fields = Vec::new();
    let mut pos = PAYLOAD_FORMAT_INDICATOR.len();
    // field headers never start inside the trailing CRC hex digits
    let reserved = payload.len().saturating_sub(4);
    while pos + 4 <= reserved {
        let Some(tag) = payload.get(pos..pos + 2) else { break };
        let Some(len_str) = payload.get(pos + 2..pos + 4) else { break };
        let Ok(length) = len_str.parse::<usize>() else { break };
        let Some(value) = payload.get(pos + 4..pos + 4 + length) else { break };
        fields.push(TlvField { tag: tag.to_string(), length, value: value.to_string() });
        pos += 4 + length;
    }
    fields
}

/// Checks the structural preconditions every payload must satisfy before it can be converted: a sane length,
/// the format-indicator prefix, and exactly one occurrence of the country field.
pub fn validate(payload: &str) -> Result<(), CodecError> {
    if payload.len() < MIN_PAYLOAD_LEN || payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::InvalidLength(payload.len()));
    }
    if !payload.starts_with(PAYLOAD_FORMAT_INDICATOR) {
        return Err(CodecError::InvalidFormatIndicator);
    }
    if payload.matches(COUNTRY_FIELD).count() != 1 {
        return Err(CodecError::MalformedCountryField);
    }
    Ok(())
}

/// Returns the transaction amount carried in the payload, or `None` when the amount field is absent.
/// A payload without an amount is a valid (static) payload, not an error.
pub fn extract_amount(payload: &str) -> Option<String> {
    parse_fields(payload).into_iter().find(|f| f.tag == TAG_AMOUNT).map(|f| f.value)
}

//--------------------------------------       PoiMode         -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiMode {
    Static,
    Dynamic,
}

impl Display for PoiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoiMode::Static => write!(f, "static"),
            PoiMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Reads the point-of-initiation field. `None` when the field is absent or carries an unknown value.
pub fn poi_mode(payload: &str) -> Option<PoiMode> {
    parse_fields(payload).into_iter().find(|f| f.tag == "01").and_then(|f| {
        let field = format!("01{:02}{}", f.length, f.value);
        if field == POI_STATIC {
            Some(PoiMode::Static)
        } else if field == POI_DYNAMIC {
            Some(PoiMode::Dynamic)
        } else {
            None
        }
    })
}

//--------------------------------------   MerchantSummary     -------------------------------------------------------
/// The informational fields of a payload folded into one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MerchantSummary {
    /// Merchant category code (tag 52)
    pub category_code: Option<String>,
    /// ISO 4217 numeric currency (tag 53)
    pub currency: Option<String>,
    /// Country code (tag 58)
    pub country: Option<String>,
    /// Merchant name (tag 59)
    pub name: Option<String>,
    /// Merchant city (tag 60)
    pub city: Option<String>,
    /// Postal code (tag 61)
    pub postal_code: Option<String>,
}

impl MerchantSummary {
    /// The alphabetic currency code when the numeric one is recognised.
    pub fn currency_code(&self) -> Option<&'static str> {
        match self.currency.as_deref() {
            Some(IDR_CURRENCY_NUMERIC) => Some(IDR_CURRENCY_CODE),
            _ => None,
        }
    }
}

pub fn merchant_summary(payload: &str) -> MerchantSummary {
    let mut summary = MerchantSummary::default();
    for field in parse_fields(payload) {
        match field.tag.as_str() {
            "52" => summary.category_code = Some(field.value),
            "53" => summary.currency = Some(field.value),
            "58" => summary.country = Some(field.value),
            "59" => summary.name = Some(field.value),
            "60" => summary.city = Some(field.value),
            "61" => summary.postal_code = Some(field.value),
            _ => {},
        }
    }
    summary
}
