//! # Money Module
//!
//! Currency metadata and the two rounding rules every split in this crate
//! is built from.
//!
//! ## Why Decimal, and Why Only Two Roundings?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE DRIFT PROBLEM                                                      │
//! │                                                                         │
//! │  100 000 VND split over 6 units:                                        │
//! │    100000 / 6 = 16666.666…  → floor → 16666                             │
//! │    16666 × 6  = 99996        → 4 VND unaccounted                        │
//! │                                                                         │
//! │  OUR SOLUTION                                                           │
//! │    • Split with floor_to()     (never over-allocate)                    │
//! │    • Track the remainder       (4 VND)                                  │
//! │    • Hand it back explicitly   (redistribute module)                    │
//! │                                                                         │
//! │  Proportional shares that are closed by a "last one absorbs" rule use  │
//! │  round_half_up() instead, because the last share corrects any drift.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use apportion_core::money::{floor_to, Currency};
//! use rust_decimal::Decimal;
//!
//! let vnd = Currency::from_code("VND").unwrap();
//! assert_eq!(vnd.minimal_unit(), Decimal::ONE);
//!
//! let unit_price = floor_to(Decimal::from(100_000) / Decimal::from(6), &vnd);
//! assert_eq!(unit_price, Decimal::from(16_666));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// =============================================================================
// Currency
// =============================================================================

/// A currency and the number of fraction digits its smallest coin carries.
///
/// The currency is threaded explicitly through every split function; nothing in
/// this crate assumes a default scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    /// ISO 4217 code, upper case.
    pub code: String,

    /// Digits after the decimal point (0 for VND, 2 for USD, 3 for KWD).
    pub fraction_digits: u32,
}

/// ISO 4217 currencies whose minor unit is not the usual two digits.
const ZERO_DIGIT_CODES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "UYI", "VND",
    "VUV", "XAF", "XOF", "XPF",
];

const THREE_DIGIT_CODES: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

const TWO_DIGIT_CODES: &[&str] = &[
    "AED", "ARS", "AUD", "BDT", "BRL", "CAD", "CHF", "CNY", "COP", "CZK", "DKK", "EGP", "EUR",
    "GBP", "HKD", "HUF", "IDR", "ILS", "INR", "KES", "KHR", "LAK", "MMK", "MXN", "MYR", "NGN",
    "NOK", "NZD", "PEN", "PHP", "PKR", "PLN", "RON", "RUB", "SAR", "SEK", "SGD", "THB", "TRY",
    "TWD", "UAH", "USD", "ZAR",
];

impl Currency {
    /// Creates a currency with an explicit number of fraction digits.
    pub fn new(code: impl Into<String>, fraction_digits: u32) -> Self {
        Currency {
            code: code.into().to_ascii_uppercase(),
            fraction_digits,
        }
    }

    /// Resolves a currency from its ISO 4217 code.
    ///
    /// ## Example
    /// ```rust
    /// use apportion_core::money::Currency;
    ///
    /// assert_eq!(Currency::from_code("usd").unwrap().fraction_digits, 2);
    /// assert_eq!(Currency::from_code("VND").unwrap().fraction_digits, 0);
    /// assert_eq!(Currency::from_code("KWD").unwrap().fraction_digits, 3);
    /// assert!(Currency::from_code("XYZ").is_err());
    /// ```
    pub fn from_code(code: &str) -> Result<Self, CoreError> {
        let upper = code.trim().to_ascii_uppercase();

        let digits = if ZERO_DIGIT_CODES.contains(&upper.as_str()) {
            0
        } else if THREE_DIGIT_CODES.contains(&upper.as_str()) {
            3
        } else if TWO_DIGIT_CODES.contains(&upper.as_str()) {
            2
        } else {
            return Err(CoreError::UnsupportedCurrency(code.to_string()));
        };

        Ok(Currency {
            code: upper,
            fraction_digits: digits,
        })
    }

    /// Returns the smallest increment of this currency: `10^-fraction_digits`.
    ///
    /// ## Example
    /// ```rust
    /// use apportion_core::money::Currency;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Currency::new("USD", 2).minimal_unit(), Decimal::new(1, 2));
    /// assert_eq!(Currency::new("VND", 0).minimal_unit(), Decimal::ONE);
    /// ```
    #[inline]
    pub fn minimal_unit(&self) -> Decimal {
        Decimal::new(1, self.fraction_digits)
    }

    /// Returns the rounding scale (number of decimal places).
    #[inline]
    pub const fn scale(&self) -> u32 {
        self.fraction_digits
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} digits)", self.code, self.fraction_digits)
    }
}

// =============================================================================
// Rounding
// =============================================================================

/// Rounds toward negative infinity at the currency scale.
///
/// Used wherever a share must never exceed its exact value.
#[inline]
pub fn floor_to(value: Decimal, currency: &Currency) -> Decimal {
    value
        .round_dp_with_strategy(currency.scale(), RoundingStrategy::ToNegativeInfinity)
        .normalize()
}

/// Rounds half away from zero at the currency scale.
#[inline]
pub fn round_half_up(value: Decimal, currency: &Currency) -> Decimal {
    value
        .round_dp_with_strategy(currency.scale(), RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Truncates `value` down to a whole multiple of `step`.
///
/// A non-positive `step` leaves the value untouched.
pub fn floor_to_multiple(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    ((value / step).floor() * step).normalize()
}

/// Sums an iterator of decimals.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().fold(Decimal::ZERO, |acc, v| acc + v)
}

// =============================================================================
// Unit Tests
// =============================================================================
