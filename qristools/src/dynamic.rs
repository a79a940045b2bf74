use qpg_common::Rupiah;
use qrcode::{render::unicode, QrCode};
use qris_payment_engine::codec::{convert_to_dynamic, validate, ServiceFee};

use crate::DynamicParams;

pub fn print_dynamic(params: DynamicParams) {
    if let Err(e) = validate(&params.payload) {
        println!("Error: {e}");
        return;
    }
    let fee = build_fee(&params);
    let amount = Rupiah::from(params.amount);
    match convert_to_dynamic(&params.payload, &amount.to_payload_string(), fee.as_ref()) {
        Ok(payload) => {
            println!("---------------------------- Dynamic QRIS -----------------------------");
            println!("Amount : {amount}");
            match &fee {
                Some(ServiceFee::Fixed(fee)) => println!("Fee    : {fee}"),
                Some(ServiceFee::Percent(pct)) => println!("Fee    : {pct}%"),
                None => {},
            }
            println!("Payload: {payload}");
            if params.qr {
                println!("{}", render_qr(&payload));
            }
            println!("------------------------------------------------------------------------");
        },
        Err(e) => {
            println!("Error: {e}");
        },
    }
}

fn build_fee(params: &DynamicParams) -> Option<ServiceFee> {
    if let Some(fee) = params.fee_fixed {
        return Some(ServiceFee::Fixed(Rupiah::from(fee)));
    }
    params.fee_percent.clone().map(ServiceFee::Percent)
}

fn render_qr(payload: &str) -> String {
    QrCode::new(payload)
        .map(|code| {
            code.render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Dark)
                .light_color(unicode::Dense1x2::Light)
                .quiet_zone(false)
                .build()
        })
        .unwrap_or_default()
}
