//! QR payload codec.
//!
//! Merchant-presented QRIS payloads are a flat tag-length-value string: a two-digit tag, a two-digit decimal
//! length, and `length` characters of value, terminated by a CRC-16 trailer over everything that precedes it.
//! This module parses, validates and rewrites those payloads. It is pure string manipulation; nothing in here
//! touches the database.
mod crc16;
mod dynamic;
mod tlv;

pub use crc16::crc16;
pub use dynamic::{convert_to_dynamic, CodecError, ServiceFee};
pub use tlv::{extract_amount, merchant_summary, parse_fields, poi_mode, validate, MerchantSummary, PoiMode, TlvField};

/// Every payload opens with this field: tag 00, length 02, value "01".
pub const PAYLOAD_FORMAT_INDICATOR: &str = "000201";
/// Point-of-initiation field marking a reusable payload: tag 01, length 02, value "11".
pub const POI_STATIC: &str = "010211";
/// Point-of-initiation field marking a single-use, amount-bound payload: tag 01, length 02, value "12".
pub const POI_DYNAMIC: &str = "010212";
/// The country-code field for Indonesian payloads: tag 58, length 02, value "ID". The amount block is spliced in
/// immediately ahead of this field, and the source format guarantees it appears exactly once.
pub const COUNTRY_FIELD: &str = "5802ID";
/// Tag of the transaction-amount field.
pub const TAG_AMOUNT: &str = "54";
/// Tag and length of the CRC trailer, included in the checksum input.
pub const CRC_PREFIX: &str = "6304";
/// Service-fee composite for a flat fee: tag 55, length 02, convenience indicator 02, then subtag 56.
pub const FEE_FIXED_PREFIX: &str = "55020256";
/// Service-fee composite for a percentage fee: tag 55, length 02, convenience indicator 03, then subtag 57.
pub const FEE_PERCENT_PREFIX: &str = "55020357";
