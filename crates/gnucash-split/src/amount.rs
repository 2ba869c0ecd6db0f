//! Exact monetary amounts.
//!
//! GnuCash stores every quantity as a `numerator/denominator` pair. Amounts are
//! kept as arbitrary precision rationals so that summing thousands of splits
//! never drifts; rounding only happens when an amount is rendered.

use std::fmt;
use std::ops::{AddAssign, Neg};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One as _, Signed as _, Zero as _};

use crate::SplitError;

/// Rendered amounts never use fewer decimal places than this.
pub const MIN_SCALE: u32 = 2;
/// Amounts that have no finite decimal expansion are cut off here. A
/// synthesized transaction with such balances no longer sums to exactly zero.
pub const MAX_SCALE: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(BigRational);

impl Amount {
    pub fn zero() -> Self {
        Amount(BigRational::zero())
    }

    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Option<Self> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return None;
        }
        Some(Amount(BigRational::new(numerator.into(), denominator)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Number of decimal places needed to write this amount exactly, or `None`
    /// if its decimal expansion does not terminate.
    pub fn decimal_places(&self) -> Option<u32> {
        let mut denominator = self.0.denom().clone();
        let two = BigInt::from(2);
        let five = BigInt::from(5);
        let mut twos = 0;
        while (&denominator % &two).is_zero() {
            denominator /= &two;
            twos += 1;
        }
        let mut fives = 0;
        while (&denominator % &five).is_zero() {
            denominator /= &five;
            fives += 1;
        }
        denominator.is_one().then_some(twos.max(fives))
    }

    /// Power of ten this amount is rendered against.
    pub fn scale(&self) -> u32 {
        self.decimal_places().unwrap_or(MAX_SCALE).max(MIN_SCALE)
    }

    pub fn denominator(&self) -> BigInt {
        BigInt::from(10).pow(self.scale())
    }

    /// The amount multiplied by [`Amount::denominator`], truncated toward zero.
    fn scaled_numerator(&self) -> BigInt {
        (&self.0 * BigRational::from_integer(self.denominator()))
            .trunc()
            .to_integer()
    }

    /// `numerator/denominator` form used inside the ledger, e.g. `1230/100`.
    pub fn to_fraction(&self) -> String {
        format!("{}/{}", self.scaled_numerator(), self.denominator())
    }

    /// Fixed-point form used in statements, e.g. `-12.30`.
    pub fn to_decimal(&self) -> String {
        let scale = self.scale() as usize;
        let numerator = self.scaled_numerator();
        let mut digits = numerator.abs().to_string();
        if digits.len() <= scale {
            digits.insert_str(0, &"0".repeat(scale + 1 - digits.len()));
        }
        digits.insert(digits.len() - scale, '.');
        if numerator.is_negative() {
            digits.insert(0, '-');
        }
        digits
    }
}

impl FromStr for Amount {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SplitError::InvalidAmount(s.to_string());
        let (numerator, denominator) = s.trim().split_once('/').unwrap_or((s.trim(), "1"));
        let numerator = numerator.parse::<BigInt>().map_err(|_| invalid())?;
        let denominator = denominator.parse::<BigInt>().map_err(|_| invalid())?;
        Amount::new(numerator, denominator).ok_or_else(invalid)
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        self.0 += &rhs.0;
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-&self.0)
    }
}

impl<'a> std::iter::Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |mut sum, amount| {
            sum += amount;
            sum
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}
