//! Money type for representing Vietnamese dong amounts.
//!
//! VND has no fractional unit in circulation, so amounts are whole dong held
//! in an `i64`. Fractional intermediate results (percent discounts) are
//! computed in `f64` and rounded half away from zero back into `Money`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A whole-dong amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero dong.
    pub const ZERO: Money = Money(0);

    /// Create a new amount in dong.
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Round a fractional amount to the nearest whole dong.
    ///
    /// ```
    /// use lila_commerce::Money;
    /// assert_eq!(Money::from_f64(1999.5), Money::new(2000));
    /// ```
    pub fn from_f64(amount: f64) -> Self {
        if amount.is_finite() {
            Self(amount.round() as i64)
        } else {
            Self::ZERO
        }
    }

    /// Get the amount in dong.
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Get the amount as a float for percentage arithmetic.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if this is zero or negative.
    pub fn is_non_positive(&self) -> bool {
        self.0 <= 0
    }

    /// Clamp negative amounts to zero.
    pub fn non_negative(self) -> Self {
        Self(self.0.max(0))
    }

    /// Subtract, saturating at zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0)).non_negative()
    }

    /// Calculate a percentage of this amount, rounded to whole dong.
    pub fn percentage(&self, percent: f64) -> Money {
        Money::from_f64(self.as_f64() * percent / 100.0)
    }

    /// Format with dot thousands separators and the dong sign
    /// (e.g. `"1.250.000 ₫"`).
    pub fn display(&self) -> String {
        format!("{} \u{20ab}", self.display_amount())
    }

    /// Format the number only (e.g. `"1.250.000"`).
    pub fn display_amount(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            format!("-{}", grouped)
        } else {
            grouped
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(Money(n)),
            Raw::Float(f) => Ok(Money::from_f64(f)),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Money::from_f64)
                .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s:?}"))),
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        Money(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_f64_rounds() {
        assert_eq!(Money::from_f64(49.4), Money::new(49));
        assert_eq!(Money::from_f64(49.5), Money::new(50));
        assert_eq!(Money::from_f64(-2.5), Money::new(-3));
        assert_eq!(Money::from_f64(f64::NAN), Money::ZERO);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(0).display(), "0 \u{20ab}");
        assert_eq!(Money::new(999).display_amount(), "999");
        assert_eq!(Money::new(1000).display_amount(), "1.000");
        assert_eq!(Money::new(1_250_000).display(), "1.250.000 \u{20ab}");
        assert_eq!(Money::new(-30_000).display_amount(), "-30.000");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(1000);
        let b = Money::new(300);
        assert_eq!(a + b, Money::new(1300));
        assert_eq!(a - b, Money::new(700));
        assert_eq!(b * 3, Money::new(900));
        assert_eq!(b.saturating_sub(a), Money::ZERO);
    }

    #[test]
    fn test_money_percentage() {
        assert_eq!(Money::new(1_000_000).percentage(20.0), Money::new(200_000));
        assert_eq!(Money::new(333).percentage(10.0), Money::new(33));
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::new(1), Money::new(2), Money::new(3)].iter().sum();
        assert_eq!(total, Money::new(6));
    }

    #[test]
    fn test_money_deserialize_lenient() {
        let m: Money = serde_json::from_str("150000").unwrap();
        assert_eq!(m, Money::new(150000));
        let m: Money = serde_json::from_str("149999.6").unwrap();
        assert_eq!(m, Money::new(150000));
        let m: Money = serde_json::from_str("\"25000\"").unwrap();
        assert_eq!(m, Money::new(25000));
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }
}
