use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

//--------------------------------------        Money        ---------------------------------------------------------
/// A monetary amount in integer cents.
///
/// All order, fee and ledger arithmetic happens in cents so that sums over thousands of rows stay exact. Amounts only
/// become floats at the presentation edge ([`Money::to_dollars`]) or when a ratio is genuinely required
/// (e.g. a fee rate).
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a float dollar amount, rounding to the nearest cent.
    pub fn from_dollars(dollars: f64) -> Self {
        if dollars.is_finite() {
            Self((dollars * 100.0).round() as i64)
        } else {
            Self(0)
        }
    }

    /// Parse a marketplace-supplied amount, treating anything unparsable as zero.
    ///
    /// Ledger exports and the Back Market API both ship numbers as strings, with empty cells and a literal `-` used
    /// for "no value". None of those may poison an aggregate sum, so this never fails.
    pub fn parse_lenient(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "-" {
            return Self(0);
        }
        trimmed.parse::<f64>().map(Self::from_dollars).unwrap_or(Self(0))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Plain decimal rendering (`123.45`) for CSV exports, without the currency symbol.
    pub fn as_decimal(&self) -> String {
        format!("{:.2}", self.to_dollars())
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0 {
            write!(f, "-${:.2}", -self.to_dollars())
        } else {
            write!(f, "${:.2}", self.to_dollars())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_is_exact_in_cents() {
        let total = Money::from_cents(29_600);
        let fees = Money::from_cents(3_551);
        assert_eq!(total - fees, Money::from_cents(26_049));
        assert_eq!(fees * 3, Money::from_cents(10_653));
        let sum: Money = [total, fees, -fees].into_iter().sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn lenient_parsing_never_fails() {
        assert_eq!(Money::parse_lenient("296.00"), Money::from_cents(29_600));
        assert_eq!(Money::parse_lenient("  15.87 "), Money::from_cents(1_587));
        assert_eq!(Money::parse_lenient("-12.50"), Money::from_cents(-1_250));
        assert_eq!(Money::parse_lenient(""), Money::ZERO);
        assert_eq!(Money::parse_lenient("-"), Money::ZERO);
        assert_eq!(Money::parse_lenient("n/a"), Money::ZERO);
        assert_eq!(Money::parse_lenient("NaN"), Money::ZERO);
    }

    #[test]
    fn display_renders_dollars() {
        assert_eq!(format!("{}", Money::from_cents(123_456)), "$1234.56");
        assert_eq!(format!("{}", Money::from_cents(-50)), "-$0.50");
        assert_eq!(Money::from_cents(950).as_decimal(), "9.50");
    }
}
