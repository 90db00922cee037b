use serde::{Deserialize, Serialize};
use std::{fmt, ops::Neg};

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as **integer cents**.
///
/// Every monetary figure the engine computes (income totals, allocations,
/// spend, pocket balances) is a `MoneyCents`, so results are always rounded
/// to the cent and never drift. Arithmetic is checked: an overflowing sum or
/// product surfaces as [`EngineError::InvalidAmount`] instead of wrapping.
///
/// The value is signed:
/// - positive = deposit / spend / income
/// - negative = withdrawal / refund
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }

    /// Multiplies by a whole number of occurrences (returns `None` on
    /// overflow).
    #[must_use]
    pub fn checked_times(self, occurrences: i64) -> Option<MoneyCents> {
        self.0.checked_mul(occurrences).map(MoneyCents)
    }

    /// `self + rhs`, failing with `InvalidAmount` on overflow.
    pub fn try_add(self, rhs: MoneyCents) -> ResultEngine<MoneyCents> {
        self.checked_add(rhs).ok_or_else(overflow)
    }

    /// `self - rhs`, failing with `InvalidAmount` on overflow.
    pub fn try_sub(self, rhs: MoneyCents) -> ResultEngine<MoneyCents> {
        self.checked_sub(rhs).ok_or_else(overflow)
    }

    /// Sum of `amounts`, failing with `InvalidAmount` on overflow.
    pub fn try_sum<I>(amounts: I) -> ResultEngine<MoneyCents>
    where
        I: IntoIterator<Item = MoneyCents>,
    {
        amounts
            .into_iter()
            .try_fold(MoneyCents::ZERO, MoneyCents::try_add)
    }
}

/// Largest amount, in cents, accepted for a single income, allocation,
/// transaction or goal.
pub const MAX_AMOUNT_MINOR: i64 = 10_000_000_000_000;

/// Rejects amounts whose magnitude exceeds [`MAX_AMOUNT_MINOR`].
pub(crate) fn require_in_range(amount_minor: i64, label: &str) -> ResultEngine<i64> {
    if amount_minor.unsigned_abs() > MAX_AMOUNT_MINOR.unsigned_abs() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be at most {MAX_AMOUNT_MINOR}"
        )));
    }
    Ok(amount_minor)
}

pub(crate) fn overflow() -> EngineError {
    EngineError::InvalidAmount("amount too large".to_string())
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_units_and_cents() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn sum_of_empty_iterator_is_zero() {
        let total = MoneyCents::try_sum(std::iter::empty()).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn overflowing_arithmetic_is_an_invalid_amount() {
        let max = MoneyCents::new(i64::MAX);
        assert!(matches!(
            max.try_add(MoneyCents::new(1)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            MoneyCents::new(i64::MIN).try_sub(MoneyCents::new(1)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(max.checked_times(2), None);
        assert!(matches!(
            MoneyCents::try_sum([max, MoneyCents::new(1)]),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(
            MoneyCents::try_sum([MoneyCents::new(1_00), MoneyCents::new(-25)]).unwrap(),
            MoneyCents::new(75)
        );
    }
}
