use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use qris_payment_engine::codec::crc16;

mod dynamic;
mod inspect;

use crate::{dynamic::print_dynamic, inspect::print_inspection};

#[derive(Parser, Debug)]
#[command(version = "1.0.0")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "dynamic", about = "Convert a static QRIS payload into a single-use dynamic payload")]
    Dynamic(DynamicParams),
    #[clap(name = "inspect", about = "Parse a QRIS payload and report its fields and integrity")]
    Inspect(InspectParams),
    #[clap(name = "crc", about = "Compute the CRC-16/CCITT-FALSE checksum of a string")]
    Crc {
        /// The exact string to checksum
        input: String,
    },
}

#[derive(Debug, Args)]
pub struct DynamicParams {
    /// The merchant's static QRIS payload
    #[arg(short = 'p', long = "payload")]
    payload: String,
    /// The payable amount, in whole rupiah
    #[arg(short = 'a', long = "amount")]
    amount: i64,
    /// A flat service fee, in whole rupiah
    #[arg(short = 'f', long = "fee-fixed", conflicts_with = "fee_percent")]
    fee_fixed: Option<i64>,
    /// A percentage service fee, e.g. "1.5"
    #[arg(long = "fee-percent")]
    fee_percent: Option<String>,
    /// Render the payload as a scannable QR code in the terminal
    #[arg(short = 'q', long = "qr")]
    qr: bool,
}

#[derive(Debug, Args)]
pub struct InspectParams {
    /// The QRIS payload to inspect
    #[arg(short = 'p', long = "payload")]
    payload: String,
    /// Emit the report as JSON instead of text
    #[arg(short = 'j', long = "json")]
    json: bool,
}

fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::Dynamic(params) => print_dynamic(params),
        Command::Inspect(params) => print_inspection(params),
        Command::Crc { input } => println!("{}", crc16(&input)),
    }
}
