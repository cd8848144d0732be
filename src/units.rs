//! Fixed-point conversions for raw on-chain integers.
//!
//! Contracts return token amounts as unsigned integers scaled by the token's
//! decimals. [`DecimalAmount`] splits the least significant `decimals` digits
//! off as the fractional part.
//!
//! ```
//! use yyapr::units::DecimalAmount;
//!
//! let amount = DecimalAmount::parse("1500000000000000000", 18).unwrap();
//! assert_eq!(amount.to_f64(), 1.5);
//!
//! // shorter than the decimals count: left padded with zeros
//! let amount = DecimalAmount::parse("25", 6).unwrap();
//! assert_eq!(amount.to_string(), "0.000025");
//! ```

use std::{fmt, str::FromStr};

use alloy::primitives::U256;
use rust_decimal::Decimal;

/// A human scale quantity derived from a raw integer and a decimals count.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalAmount {
    integer: String,
    fraction: String,
    decimals: u32,
}

impl DecimalAmount {
    /// Splits `digits` into integer and fractional parts.
    ///
    /// Returns `None` when `digits` is empty or contains anything other than
    /// ASCII digits. That is "not computable", which callers must keep
    /// distinct from zero.
    #[must_use]
    pub fn parse(digits: &str, decimals: u32) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let width = decimals as usize + 1;
        let padded = format!("{digits:0>width$}");
        let (integer, fraction) = padded.split_at(padded.len() - decimals as usize);

        Some(Self {
            integer: integer.to_owned(),
            fraction: fraction.to_owned(),
            decimals,
        })
    }

    /// Converts a decoded `uint` into a decimal amount.
    #[must_use]
    pub fn from_raw(raw: U256, decimals: u32) -> Self {
        // U256 always renders as plain base 10 digits
        Self::parse(&raw.to_string(), decimals).unwrap_or_else(|| Self::zero(decimals))
    }

    fn zero(decimals: u32) -> Self {
        Self {
            integer: "0".into(),
            fraction: "0".repeat(decimals as usize),
            decimals,
        }
    }

    /// Number of fractional digits.
    #[must_use]
    pub const fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Returns the value as a float, within `f64` precision.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        // both parts are pure digits, so this cannot fail
        f64::from_str(&self.to_string()).unwrap_or(f64::NAN)
    }

    /// Returns the exact value, or `None` if it does not fit a [`Decimal`].
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str_exact(&self.to_string()).ok()
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fraction.is_empty() {
            write!(f, "{}", self.integer)
        } else {
            write!(f, "{}.{}", self.integer, self.fraction)
        }
    }
}
