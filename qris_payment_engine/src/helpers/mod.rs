mod amounts;

pub use amounts::normalize_amount;
