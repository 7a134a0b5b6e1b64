use crate::{Result, SieError};
use serde::{Serialize, Serializer};

use std::fmt;
use std::str::FromStr;

/// Monetary amount stored as a whole number of cents.
///
/// Arithmetic is checked: a result outside the `i64` cent range is an
/// [`Overflow`][SieError::Overflow] error, never a wrapped value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    pub const ZERO: Decimal = Decimal(0);

    pub const fn from_cents(cents: i64) -> Self {
        Decimal(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parses `[-]whole[.fraction]`.
    ///
    /// The fraction counts hundredths: `9.5` is 950 cents. Digits past the
    /// second are only accepted when they are zeros. The fraction takes the
    /// sign written in front of the number, so `-0.50` is -50 cents.
    pub fn parse(s: &str) -> Result<Decimal> {
        let malformed = || SieError::MalformedAmount(s.to_string());

        let (whole_str, frac_str) = match s.split_once('.') {
            Some((whole, frac)) => (whole, Some(frac)),
            None => (s, None),
        };

        let whole: i64 = whole_str.parse().map_err(|_| malformed())?;
        let negative = whole_str.starts_with('-');

        let frac = match frac_str {
            None => 0,
            Some(frac) => {
                if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                let (cents, rest) = frac.split_at(frac.len().min(2));
                if rest.bytes().any(|b| b != b'0') {
                    return Err(malformed());
                }
                let value: i64 = cents.parse().map_err(|_| malformed())?;
                if cents.len() == 1 {
                    value * 10
                } else {
                    value
                }
            }
        };

        whole
            .checked_mul(100)
            .and_then(|w| {
                if negative {
                    w.checked_sub(frac)
                } else {
                    w.checked_add(frac)
                }
            })
            .map(Decimal)
            .ok_or_else(malformed)
    }

    /// Renders the amount with a fixed number of decimals.
    ///
    /// With fewer than two decimals the value is rounded half away from zero.
    pub fn to_fixed_string(self, decimals: usize) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        match decimals {
            0 => {
                let units = (abs + 50) / 100;
                if units == 0 {
                    "0".to_string()
                } else {
                    format!("{}{}", sign, units)
                }
            }
            1 => {
                let tenths = (abs + 5) / 10;
                if tenths == 0 {
                    "0.0".to_string()
                } else {
                    format!("{}{}.{}", sign, tenths / 10, tenths % 10)
                }
            }
            _ => format!(
                "{}{}.{:02}{}",
                sign,
                abs / 100,
                abs % 100,
                "0".repeat(decimals - 2)
            ),
        }
    }

    pub fn try_add(self, rhs: Decimal) -> Result<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal).ok_or(SieError::Overflow)
    }

    pub fn try_sub(self, rhs: Decimal) -> Result<Decimal> {
        self.0.checked_sub(rhs.0).map(Decimal).ok_or(SieError::Overflow)
    }

    /// Fails only for the smallest representable amount.
    pub fn try_neg(self) -> Result<Decimal> {
        self.0.checked_neg().map(Decimal).ok_or(SieError::Overflow)
    }

    pub fn try_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Result<Decimal> {
        amounts
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, amount| acc.try_add(amount))
    }

    /// Lossy conversion for presentation layers.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            f.write_str(&self.to_fixed_string(0))
        } else {
            f.write_str(&self.to_fixed_string(2))
        }
    }
}

impl FromStr for Decimal {
    type Err = SieError;

    fn from_str(s: &str) -> Result<Self> {
        Decimal::parse(s)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_fixed_string(2))
    }
}
