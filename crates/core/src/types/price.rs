//! Fixed-point price representation.
//!
//! Upstream product data writes unit prices two ways: as a decimal string in
//! currency units (`"19.99"`) or as an integer in minor units (`1999`).
//! [`Price`] collapses both into integer minor units when it is
//! deserialized, and always serializes back as the integer form.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of minor units in one currency unit.
const MINOR_PER_UNIT: i64 = 100;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is not a decimal number.
    #[error("invalid price {0:?}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit in minor units.
    #[error("price is out of range")]
    OutOfRange,
}

/// A non-negative amount of money, held as integer minor units (cents).
///
/// ```
/// use basket_core::Price;
///
/// let parsed = Price::parse("19.99").unwrap();
/// assert_eq!(parsed, Price::from_minor_units(1999));
/// assert_eq!(parsed.to_string(), "$19.99");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price {
    minor_units: i64,
}

impl Price {
    /// Zero.
    pub const ZERO: Self = Self { minor_units: 0 };

    /// Create a price from minor units (e.g. cents).
    #[must_use]
    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self { minor_units }
    }

    /// Create a price from an amount in currency units.
    ///
    /// Sub-cent precision is rounded half away from zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or does not fit.
    pub fn from_decimal(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let minor = amount
            .checked_mul(Decimal::from(MINOR_PER_UNIT))
            .ok_or(PriceError::OutOfRange)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(PriceError::OutOfRange)?;
        Ok(Self::from_minor_units(minor))
    }

    /// Parse a decimal string in currency units, e.g. `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a non-negative decimal.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::from_decimal(amount)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.minor_units
    }

    /// Amount in currency units.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.minor_units, 2)
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates instead of overflowing.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::from_minor_units(self.minor_units.saturating_mul(i64::from(quantity)))
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.minor_units == 0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_minor_units(self.minor_units.saturating_add(rhs.minor_units))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.amount())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.minor_units)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// Accepts a decimal string (currency units) or a number (minor units).
struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal price string or an integer amount in minor units")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        Price::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        i64::try_from(v)
            .map(Price::from_minor_units)
            .map_err(|_| E::custom(PriceError::OutOfRange))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        if v < 0 {
            return Err(E::custom(PriceError::Negative));
        }
        Ok(Price::from_minor_units(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        let minor = Decimal::from_f64(v).ok_or_else(|| E::custom(PriceError::OutOfRange))?;
        if minor.is_sign_negative() && !minor.is_zero() {
            return Err(E::custom(PriceError::Negative));
        }
        minor
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Price::from_minor_units)
            .ok_or_else(|| E::custom(PriceError::OutOfRange))
    }
}
