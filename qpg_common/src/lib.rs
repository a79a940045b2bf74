mod rupiah;

pub mod op;

pub use rupiah::{Rupiah, RupiahConversionError, IDR_CURRENCY_CODE, IDR_CURRENCY_NUMERIC};
