//! Exact money arithmetic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A monetary amount stored as an integer count of cents.
///
/// Prices have a fixed precision of two fractional digits, so keeping
/// cents in an `i64` gives exact sums with no floating-point drift.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from a cent count.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies the amount by a quantity.
    pub fn times(&self, quantity: u32) -> Money {
        Money(self.0 * i64::from(quantity))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Error returned when parsing a decimal money string fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid money amount: {0:?}")]
pub struct MoneyParseError(pub String);

impl std::str::FromStr for Money {
    type Err = MoneyParseError;

    /// Parses a decimal string such as `"12.34"`, `"0.05"` or `"7"`.
    ///
    /// At most two fractional digits are accepted; the precision of the
    /// type is fixed, so `"1.005"` is rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MoneyParseError(s.to_string());
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (units_str, frac_str) = match body.split_once('.') {
            Some((u, f)) => (u, f),
            None => (body, ""),
        };

        if units_str.is_empty() || frac_str.len() > 2 {
            return Err(err());
        }

        let units: i64 = units_str.parse().map_err(|_| err())?;
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            let parsed: i64 = frac_str.parse().map_err(|_| err())?;
            if frac_str.len() == 1 { parsed * 10 } else { parsed }
        };

        let cents = units * 100 + frac;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_and_cents() {
        assert_eq!(Money::from_units(10).cents(), 1000);
        assert_eq!(Money::from_cents(1234).cents(), 1234);
    }

    #[test]
    fn display_two_fraction_digits() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn times_is_exact() {
        assert_eq!(Money::from_cents(1999).times(3).cents(), 5997);
    }

    #[test]
    fn sum_over_iterator() {
        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 350);
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("12.34".parse::<Money>().unwrap().cents(), 1234);
        assert_eq!("0.5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("7".parse::<Money>().unwrap().cents(), 700);
        assert_eq!("-3.10".parse::<Money>().unwrap().cents(), -310);
    }

    #[test]
    fn parse_rejects_excess_precision() {
        assert!("1.005".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(250)).unwrap();
        assert_eq!(json, "250");
    }
}
