//! Money type representing a decimal amount with a currency.
//!
//! [`Money`] carries fees, commission charges and dividend amounts before they
//! are converted into the reporting currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

use crate::REPORTING_CURRENCY;

/// An amount paired with a currency code.
///
/// # Examples
///
/// ```
/// use fifotax_core::Money;
/// use rust_decimal_macros::dec;
///
/// let fee = Money::new(dec!(1.50), "USD");
/// assert_eq!(fee.amount, dec!(1.50));
/// assert_eq!(fee.currency, "USD");
/// assert!(!fee.is_reporting_currency());
///
/// let other = Money::new(dec!(0.50), "USD");
/// let sum = &fee + &other;
/// assert_eq!(sum.amount, dec!(2.00));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The decimal quantity
    pub amount: Decimal,
    /// The currency code (e.g., "TRY", "USD")
    pub currency: String,
}

impl Money {
    /// Create a new money value.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Create a zero value in the given currency.
    #[must_use]
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Create a value in the reporting currency.
    #[must_use]
    pub fn reporting(amount: Decimal) -> Self {
        Self::new(amount, REPORTING_CURRENCY)
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Check if this value is already denominated in the reporting currency.
    #[must_use]
    pub fn is_reporting_currency(&self) -> bool {
        self.currency == REPORTING_CURRENCY
    }

    /// Convert into `target` with a rate quoted as `target` units per one unit
    /// of `self.currency`.
    #[must_use]
    pub fn convert(&self, rate: Decimal, target: &str) -> Self {
        Self::new(self.amount * rate, target)
    }

    /// Round to the given number of decimal places.
    #[must_use]
    pub fn round_dp(&self, dp: u32) -> Self {
        Self {
            amount: self.amount.round_dp(dp),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl Add for &Money {
    type Output = Money;

    fn add(self, other: &Money) -> Money {
        debug_assert_eq!(
            self.currency, other.currency,
            "Cannot add amounts with different currencies"
        );
        Money {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        }
    }
}

impl Sub for &Money {
    type Output = Money;

    fn sub(self, other: &Money) -> Money {
        debug_assert_eq!(
            self.currency, other.currency,
            "Cannot subtract amounts with different currencies"
        );
        Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        }
    }
}

impl Neg for &Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money {
            amount: -self.amount,
            currency: self.currency.clone(),
        }
    }
}

impl AddAssign<&Self> for Money {
    fn add_assign(&mut self, other: &Self) {
        debug_assert_eq!(
            self.currency, other.currency,
            "Cannot add amounts with different currencies"
        );
        self.amount += other.amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero() {
        let m = Money::zero("USD");
        assert!(m.is_zero());
        assert_eq!(m.currency, "USD");
    }

    #[test]
    fn test_reporting() {
        let m = Money::reporting(dec!(12.5));
        assert_eq!(m.currency, "TRY");
        assert!(m.is_reporting_currency());
    }

    #[test]
    fn test_convert() {
        let fee = Money::new(dec!(2.00), "USD");
        let converted = fee.convert(dec!(29.4532), "TRY");
        assert_eq!(converted.amount, dec!(58.906400));
        assert_eq!(converted.currency, "TRY");
    }

    #[test]
    fn test_add_sub_neg() {
        let a = Money::new(dec!(100.00), "TRY");
        let b = Money::new(dec!(40.00), "TRY");
        assert_eq!((&a + &b).amount, dec!(140.00));
        assert_eq!((&a - &b).amount, dec!(60.00));
        assert_eq!((-&a).amount, dec!(-100.00));
    }

    #[test]
    fn test_add_assign() {
        let mut a = Money::new(dec!(1), "TRY");
        a += &Money::new(dec!(2), "TRY");
        assert_eq!(a.amount, dec!(3));
    }

    #[test]
    fn test_display() {
        let a = Money::new(dec!(1234.56), "USD");
        assert_eq!(format!("{a}"), "1234.56 USD");
    }
}
