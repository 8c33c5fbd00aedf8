// src/models/money.rs

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use thiserror::Error;

/// Decimal places kept for every amount.
pub const SCALE: u32 = 2;

/// Largest absolute amount a `NUMERIC(12, 2)` column holds, in cents.
const MAX_CENTS: i64 = 999_999_999_999;

/// An amount of money with exactly two decimal places.
///
/// Stored as `NUMERIC(12, 2)` and written to JSON as an exact decimal
/// number (`99.99`). Parsing, JSON input and arithmetic all go through
/// [`Money::new`], so the scale and range are checked in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        let normalized = amount.normalize();
        if normalized.scale() > SCALE {
            return Err(MoneyError::TooPrecise(amount.to_string()));
        }
        if normalized.abs() > Decimal::new(MAX_CENTS, SCALE) {
            return Err(MoneyError::OutOfRange(amount.to_string()));
        }

        let mut fixed = normalized;
        fixed.rescale(SCALE);
        Ok(Money(fixed))
    }

    /// For literal amounts. `cents` must fit the column range.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, SCALE))
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Sum of two amounts, or `None` when it leaves the storable range.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0
            .checked_add(other.0)
            .and_then(|sum| Money::new(sum).ok())
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0
            .checked_sub(other.0)
            .and_then(|difference| Money::new(difference).ok())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses "12", "12.5" or "12.50". More than two decimals is rejected.
impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let amount = Decimal::from_str(s).map_err(|_| MoneyError::Invalid(s.to_string()))?;
        Money::new(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::arbitrary_precision::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::arbitrary_precision::deserialize(deserializer)?;
        Money::new(amount).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings_exactly() {
        assert_eq!("99.99".parse::<Money>().unwrap(), Money::from_cents(9999));
        assert_eq!("50".parse::<Money>().unwrap(), Money::from_cents(5000));
        assert_eq!("0.5".parse::<Money>().unwrap(), Money::from_cents(50));
        assert_eq!("1.500".parse::<Money>().unwrap(), Money::from_cents(150));
        assert!(matches!("1.234".parse::<Money>(), Err(MoneyError::TooPrecise(_))));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn json_uses_exact_decimal_numbers() {
        let money = Money::from_cents(9999);
        assert_eq!(serde_json::to_string(&money).unwrap(), "99.99");
        assert_eq!(serde_json::to_string(&Money::from_cents(5000)).unwrap(), "50.00");

        let parsed: Money = serde_json::from_str("99.99").unwrap();
        assert_eq!(parsed, money);
        let parsed: Money = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, Money::from_cents(1200));
    }

    #[test]
    fn largest_amount_survives_json() {
        let largest: Money = "9999999999.99".parse().unwrap();
        let json = serde_json::to_string(&largest).unwrap();
        assert_eq!(json, "9999999999.99");
        assert_eq!(serde_json::from_str::<Money>(&json).unwrap(), largest);

        assert!(matches!(
            "10000000000.00".parse::<Money>(),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn json_and_text_agree_on_precision() {
        assert!(serde_json::from_str::<Money>("1.239").is_err());
        assert!("1.239".parse::<Money>().is_err());
    }

    #[test]
    fn arithmetic_stays_in_range() {
        let largest: Money = "9999999999.99".parse().unwrap();
        assert_eq!(largest.checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(125)),
            Some(Money::from_cents(375))
        );
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(5000).to_string(), "50.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }
}
