use anyhow::Result;
use qris_payment_engine::codec::{
    crc16,
    extract_amount,
    merchant_summary,
    parse_fields,
    poi_mode,
    validate,
    MerchantSummary,
    PoiMode,
    TlvField,
    CRC_PREFIX,
};
use serde::Serialize;

use crate::InspectParams;

#[derive(Debug, Serialize)]
struct InspectionReport {
    valid: bool,
    validation_error: Option<String>,
    mode: Option<PoiMode>,
    amount: Option<String>,
    /// `None` when the payload carries no CRC trailer at all
    crc_ok: Option<bool>,
    merchant: MerchantSummary,
    fields: Vec<TlvField>,
}

pub fn print_inspection(params: InspectParams) {
    let payload = params.payload.as_str();
    let validation_error = validate(payload).err().map(|e| e.to_string());
    let report = InspectionReport {
        valid: validation_error.is_none(),
        validation_error,
        mode: poi_mode(payload),
        amount: extract_amount(payload),
        crc_ok: crc_status(payload),
        merchant: merchant_summary(payload),
        fields: parse_fields(payload),
    };
    if params.json {
        match render_json(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("Error: {e}"),
        }
        return;
    }
    print_text_report(&report);
}

fn render_json(report: &InspectionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn crc_status(payload: &str) -> Option<bool> {
    let cut = payload.len().checked_sub(4)?;
    let body = payload.get(..cut)?;
    let trailer = payload.get(cut..)?;
    if !body.ends_with(CRC_PREFIX) {
        return None;
    }
    Some(crc16(body) == trailer)
}

fn print_text_report(report: &InspectionReport) {
    println!("----------------------------- QRIS Payload -----------------------------");
    match &report.validation_error {
        None => println!("Valid   : yes"),
        Some(reason) => println!("Valid   : no ({reason})"),
    }
    let mode = report.mode.map(|m| m.to_string()).unwrap_or_else(|| "unknown".to_string());
    println!("Mode    : {mode}");
    println!("Amount  : {}", report.amount.as_deref().unwrap_or("(none)"));
    match report.crc_ok {
        Some(true) => println!("CRC     : ok"),
        Some(false) => println!("CRC     : MISMATCH"),
        None => println!("CRC     : (no trailer)"),
    }
    let merchant = &report.merchant;
    if let Some(name) = &merchant.name {
        println!("Merchant: {name}");
    }
    if let Some(city) = &merchant.city {
        println!("City    : {city}");
    }
    if let Some(postal_code) = &merchant.postal_code {
        println!("Postal  : {postal_code}");
    }
    if let Some(country) = &merchant.country {
        println!("Country : {country}");
    }
    if let Some(category_code) = &merchant.category_code {
        println!("Category: {category_code}");
    }
    if let Some(currency) = &merchant.currency {
        match merchant.currency_code() {
            Some(code) => println!("Currency: {currency} ({code})"),
            None => println!("Currency: {currency}"),
        }
    }
    println!("Fields  :");
    for field in &report.fields {
        println!("  {} ({:02}) {}", field.tag, field.length, field.value);
    }
    println!("------------------------------------------------------------------------");
}
