use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const IDR_CURRENCY_CODE: &str = "IDR";
/// ISO 4217 numeric code for the Indonesian rupiah, as carried in QR currency fields.
pub const IDR_CURRENCY_NUMERIC: &str = "360";

//--------------------------------------      Rupiah         ---------------------------------------------------------
/// A whole-rupiah amount. QRIS payloads carry amounts without decimal places, so the smallest
/// representable unit is one rupiah.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Rupiah {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rupiah {}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {} is too large to convert to Rupiah", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{sign}Rp{grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The bare digit string used when embedding the amount in a QR payload.
    pub fn to_payload_string(&self) -> String {
        self.0.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Rupiah::from(0).to_string(), "Rp0");
        assert_eq!(Rupiah::from(999).to_string(), "Rp999");
        assert_eq!(Rupiah::from(50_000).to_string(), "Rp50.000");
        assert_eq!(Rupiah::from(1_234_567).to_string(), "Rp1.234.567");
        assert_eq!(Rupiah::from(-50_123).to_string(), "-Rp50.123");
    }

    #[test]
    fn arithmetic() {
        let a = Rupiah::from(50_000);
        let b = Rupiah::from(137);
        assert_eq!(a + b, Rupiah::from(50_137));
        assert_eq!(a - b, Rupiah::from(49_863));
        assert_eq!(b * 3, Rupiah::from(411));
        assert_eq!([a, b].into_iter().sum::<Rupiah>(), Rupiah::from(50_137));
        let mut c = a;
        c -= b;
        assert_eq!(c, Rupiah::from(49_863));
        assert_eq!(-b, Rupiah::from(-137));
    }

    #[test]
    fn conversion_from_u64_is_checked() {
        assert_eq!(Rupiah::try_from(42u64).unwrap(), Rupiah::from(42));
        assert!(Rupiah::try_from(u64::MAX).is_err());
    }

    #[test]
    fn payload_string_has_no_grouping() {
        assert_eq!(Rupiah::from(50_137).to_payload_string(), "50137");
    }
}
