//! Monetary amount type for the balance ledger.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Default number of decimal places in the smallest currency unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// A currency-agnostic monetary amount with fixed-point precision.
///
/// Amounts are signed: balances use positive and negative values to encode
/// direction. Arithmetic is closed over `Amount` since the ledger carries a
/// single currency dimension.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new amount from a decimal value.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Create from a whole number of major units.
    pub fn from_major(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    /// Create from a count of minor units at the given scale.
    pub fn from_minor_units(units: i64, scale: u32) -> Self {
        Self(Decimal::new(units, scale))
    }

    /// Create from a string value.
    pub fn from_str(value: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self(value.parse()?))
    }

    /// A zero amount.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The smallest representable step at the given unit scale.
    pub fn unit(scale: u32) -> Self {
        Self(Decimal::new(1, scale))
    }

    /// Get the underlying decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Get the absolute value.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Round half-to-even to the given unit scale.
    pub fn round_to_unit(&self, scale: u32) -> Self {
        Self(self.0.round_dp(scale))
    }

    /// Truncate toward zero to the given unit scale.
    pub fn floor_to_unit(&self, scale: u32) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::ToZero),
        )
    }

    /// Check whether the amount is representable at the given unit scale.
    pub fn fits_unit(&self, scale: u32) -> bool {
        self.0.round_dp(scale) == self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Self::Output {
        Amount(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Amount) {
        self.0 += other.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, other: Amount) -> Self::Output {
        Amount(self.0 - other.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, other: Amount) {
        self.0 -= other.0;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Mul<Decimal> for Amount {
    type Output = Amount;

    fn mul(self, factor: Decimal) -> Self::Output {
        Amount(self.0 * factor)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_operations() {
        let a = Amount::from_str("100.00").unwrap();
        let b = Amount::from_str("50.00").unwrap();

        assert_eq!((a + b).value(), dec!(150));
        assert_eq!((a - b).value(), dec!(50));
        assert_eq!((-a).value(), dec!(-100));
        assert_eq!((b * dec!(2)).value(), dec!(100));
    }

    #[test]
    fn test_predicates() {
        assert!(Amount::from_major(1).is_positive());
        assert!(Amount::zero().is_zero());
        assert!(Amount::from_major(-1).is_negative());
        assert_eq!(Amount::from_major(-3).abs(), Amount::from_major(3));
    }

    #[test]
    fn test_minor_units() {
        let a = Amount::from_minor_units(12345, 2);
        assert_eq!(a.value(), dec!(123.45));
        assert_eq!(Amount::unit(2).value(), dec!(0.01));
        assert_eq!(Amount::unit(0).value(), dec!(1));
    }

    #[test]
    fn test_unit_rounding() {
        let a = Amount::new(dec!(100.339));
        assert_eq!(a.floor_to_unit(2).value(), dec!(100.33));
        assert_eq!(a.round_to_unit(2).value(), dec!(100.34));
        assert!(!a.fits_unit(2));
        assert!(a.floor_to_unit(2).fits_unit(2));
    }

    #[test]
    fn test_sum() {
        let total: Amount = [Amount::from_major(1), Amount::from_major(2)]
            .into_iter()
            .sum();
        assert_eq!(total, Amount::from_major(3));
    }
}
