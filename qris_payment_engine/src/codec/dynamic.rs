use qpg_common::Rupiah;
use thiserror::Error;

use super::{
    crc16::crc16, COUNTRY_FIELD, FEE_FIXED_PREFIX, FEE_PERCENT_PREFIX, POI_DYNAMIC, POI_STATIC, TAG_AMOUNT,
};

/// The longest amount value a payload may carry (13 characters).
const AMOUNT_MAX_LEN: usize = 13;

#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("A required input is missing: {0}")]
    MissingField(String),
    #[error("The amount must be a non-empty string of digits, but was '{0}'")]
    InvalidAmount(String),
    #[error("The payload is {0} characters long, which is outside the accepted range")]
    InvalidLength(usize),
    #[error("The payload does not start with the QR format indicator")]
    InvalidFormatIndicator,
    #[error("The payload does not contain exactly one merchant country field")]
    MalformedCountryField,
}

//--------------------------------------      ServiceFee       -------------------------------------------------------
/// A convenience-fee directive to embed next to the amount in a dynamic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFee {
    /// A fixed fee in Rupiah.
    Fixed(Rupiah),
    /// A percentage of the transaction amount, e.g. "1.5".
    Percent(String),
}

impl ServiceFee {
    /// The fee-indicator composite that precedes the fee value on the wire.
    pub fn prefix(&self) -> &'static str {
        match self {
            ServiceFee::Fixed(_) => FEE_FIXED_PREFIX,
            ServiceFee::Percent(_) => FEE_PERCENT_PREFIX,
        }
    }

    pub fn wire_value(&self) -> String {
        match self {
            ServiceFee::Fixed(amount) => amount.to_payload_string(),
            ServiceFee::Percent(pct) => pct.clone(),
        }
    }
}

/// Rewrites a static payload into a dynamic one carrying `amount` (and optionally a service fee).
///
/// The four trailing CRC hex digits are dropped, the point-of-initiation marker is flipped to dynamic (a payload
/// without the static marker is passed through unchanged), the amount field is inserted immediately before the
/// country field, and a fresh CRC is computed over the rewritten payload. Callers are expected to run
/// [`validate`][super::validate] first; the country-field split is still checked here since the reassembly
/// depends on it.
pub fn convert_to_dynamic(static_payload: &str, amount: &str, fee: Option<&ServiceFee>) -> Result<String, CodecError> {
    if static_payload.is_empty() {
        return Err(CodecError::MissingField("static payload".to_string()));
    }
    if amount.is_empty() {
        return Err(CodecError::MissingField("amount".to_string()));
    }
    if !amount.bytes().all(|b| b.is_ascii_digit()) || amount.len() > AMOUNT_MAX_LEN {
        return Err(CodecError::InvalidAmount(amount.to_string()));
    }
    // Only the hex digits are stripped, so the trailer's tag and length remain at the end of the second segment
    // and the fresh CRC lands right after them.
    let cut = static_payload.len().saturating_sub(4);
    let base = static_payload.get(..cut).ok_or(CodecError::MalformedCountryField)?;
    let base = base.replacen(POI_STATIC, POI_DYNAMIC, 1);
    let parts = base.split(COUNTRY_FIELD).collect::<Vec<&str>>();
    if parts.len() != 2 {
        return Err(CodecError::MalformedCountryField);
    }
    let mut amount_block = format!("{TAG_AMOUNT}{:02}{amount}", amount.len());
    if let Some(fee) = fee {
        let value = fee.wire_value();
        amount_block = format!("{amount_block}{}{:02}{value}", fee.prefix(), value.len());
    }
    let payload = format!("{}{amount_block}{}{}", parts[0], COUNTRY_FIELD, parts[1]);
    let crc = crc16(&payload);
    Ok(format!("{payload}{crc}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{extract_amount, poi_mode, validate, PoiMode};

    const STATIC_QR: &str = "00020101021126370014ID.EXAMPLE.WWW0215ID10200211223345204541153033605802ID5914TOKO \
                             SEJAHTERA6007JAKARTA6105101106304ABCD";

    #[test]
    fn conversion_inserts_the_amount_before_the_country_field() {
        let dynamic = convert_to_dynamic(STATIC_QR, "50000", None).unwrap();
        assert!(dynamic.contains("5405500005802ID"));
        assert_eq!(extract_amount(&dynamic).as_deref(), Some("50000"));
        assert_eq!(poi_mode(&dynamic), Some(PoiMode::Dynamic));
        assert!(validate(&dynamic).is_ok());
    }

    #[test]
    fn conversion_recomputes_the_trailing_crc() {
        let dynamic = convert_to_dynamic(STATIC_QR, "123456", None).unwrap();
        let (body, crc) = dynamic.split_at(dynamic.len() - 4);
        assert!(body.ends_with("6304"));
        assert_eq!(crc16(body), crc);
    }

    #[test]
    fn fixed_fee_follows_the_amount() {
        let fee = ServiceFee::Fixed(Rupiah::from(2500));
        let dynamic = convert_to_dynamic(STATIC_QR, "50000", Some(&fee)).unwrap();
        assert!(dynamic.contains("54055000055020256042500"));
    }

    #[test]
    fn percentage_fee_follows_the_amount() {
        let fee = ServiceFee::Percent("1.5".to_string());
        let dynamic = convert_to_dynamic(STATIC_QR, "50000", Some(&fee)).unwrap();
        assert!(dynamic.contains("54055000055020357031.5"));
    }

    #[test]
    fn missing_inputs_are_rejected() {
        assert!(matches!(convert_to_dynamic("", "50000", None), Err(CodecError::MissingField(_))));
        assert!(matches!(convert_to_dynamic(STATIC_QR, "", None), Err(CodecError::MissingField(_))));
    }

    #[test]
    fn non_digit_amounts_are_rejected() {
        assert!(matches!(convert_to_dynamic(STATIC_QR, "12a45", None), Err(CodecError::InvalidAmount(_))));
        assert!(matches!(convert_to_dynamic(STATIC_QR, "50.000", None), Err(CodecError::InvalidAmount(_))));
        assert!(matches!(convert_to_dynamic(STATIC_QR, "99999999999999", None), Err(CodecError::InvalidAmount(_))));
    }

    #[test]
    fn split_fails_without_exactly_one_country_field() {
        let none = STATIC_QR.replacen("5802ID", "5802MY", 1);
        assert!(matches!(convert_to_dynamic(&none, "50000", None), Err(CodecError::MalformedCountryField)));
        let twice = STATIC_QR.replacen("5802ID", "5802ID5802ID", 1);
        assert!(matches!(convert_to_dynamic(&twice, "50000", None), Err(CodecError::MalformedCountryField)));
    }

    #[test]
    fn payload_without_static_marker_converts_unchanged() {
        let already_dynamic = STATIC_QR.replacen("010211", "010212", 1);
        let converted = convert_to_dynamic(&already_dynamic, "747", None).unwrap();
        assert!(converted.contains("010212"));
        assert_eq!(extract_amount(&converted).as_deref(), Some("747"));
    }

    #[test]
    fn amounts_survive_a_conversion_round_trip() {
        for amount in ["1", "747", "50137", "1000000"] {
            let dynamic = convert_to_dynamic(STATIC_QR, amount, None).unwrap();
            assert_eq!(extract_amount(&dynamic).as_deref(), Some(amount));
        }
    }
}
