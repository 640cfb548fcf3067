use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Serialize};

/// Fixed-point decimal with 4 decimal places, stored as a scaled integer.
///
/// Displayed with two decimals, rounded half-up on the cent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(from = "f64", into = "f64")]
pub struct Amount(i64);

impl Amount {
    pub(crate) const SCALE: i64 = 10_000;
    const CENT_UNITS: i64 = Self::SCALE / 100;

    pub const ZERO: Amount = Amount(0);
    /// One cent, the settlement and pruning threshold.
    pub const CENT: Amount = Amount(Self::CENT_UNITS);

    /// Largest magnitude accepted from user input, leaving headroom for sums.
    pub const MAX_INPUT: f64 = 1_000_000_000.0;

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    /// Like [`Amount::from_float`], but `None` for non-finite values and
    /// anything beyond [`Amount::MAX_INPUT`].
    pub fn try_from_float(value: f64) -> Option<Self> {
        (value.is_finite() && value.abs() <= Self::MAX_INPUT).then(|| Self::from_float(value))
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub fn scaled(self) -> i64 {
        self.0
    }

    pub fn to_float(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> Self {
        Amount(self.0.abs())
    }

    /// Round to the nearest cent, ties toward positive infinity.
    pub fn round_to_cent(self) -> Self {
        let cents = div_round_half_up(self.0 as i128, Self::CENT_UNITS as i128);
        Amount(cents as i64 * Self::CENT_UNITS)
    }

    /// Signed whole cents after rounding.
    pub fn cents(self) -> i64 {
        self.round_to_cent().0 / Self::CENT_UNITS
    }
}

/// `num / den` rounded half-up (ties toward positive infinity). `den` must be positive.
pub(crate) fn div_round_half_up(num: i128, den: i128) -> i128 {
    (2 * num + den).div_euclid(2 * den)
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let whole = abs / 100;
        let frac = abs % 100;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::from_float(value)
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.to_float()
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
