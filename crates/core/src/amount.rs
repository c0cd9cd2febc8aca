//! Amount - Non-negative decimal wrapper for monetary amounts
//!
//! Every monetary amount in CoreBank MUST be non-negative.
//! This is enforced at the type level.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Conversion rate must be positive: {0}")]
    NonPositiveRate(Decimal),

    #[error("Amount overflow during conversion")]
    Overflow,
}

/// A non-negative decimal amount for monetary operations.
///
/// # Invariant
/// The inner value is always >= 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use corebank_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
///
/// // Negative amounts are rejected
/// let negative = Amount::new(Decimal::new(-100, 0));
/// assert!(negative.is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            Err(AmountError::NegativeAmount(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create an Amount without validation.
    ///
    /// # Safety
    /// The caller MUST ensure the value is non-negative.
    /// Use only for trusted sources (e.g., deserialization from validated storage).
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Round to two decimal places (cents), half-to-even.
    ///
    /// Both settlement legs use this strategy; a mismatch between legs
    /// would break the cent-level conservation of balances.
    pub fn round_cents(&self) -> Amount {
        Amount(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Convert this amount into the reference currency (BGN).
    ///
    /// `rate_to_reference` is the currency's rate to BGN and must be positive.
    /// The result is rounded to cents.
    ///
    /// # Example
    /// ```
    /// use corebank_core::Amount;
    /// use rust_decimal::Decimal;
    ///
    /// let eur = Amount::new(Decimal::new(100, 0)).unwrap();
    /// let rate = Decimal::new(195583, 5); // 1.95583
    /// let bgn = eur.to_reference(rate).unwrap();
    /// assert_eq!(bgn.value(), Decimal::new(19558, 2)); // 195.58
    /// ```
    pub fn to_reference(&self, rate_to_reference: Decimal) -> Result<Amount, AmountError> {
        if rate_to_reference <= Decimal::ZERO {
            return Err(AmountError::NonPositiveRate(rate_to_reference));
        }
        let raw = self
            .0
            .checked_mul(rate_to_reference)
            .ok_or(AmountError::Overflow)?;
        Ok(Amount(raw).round_cents())
    }

    /// Convert a reference-currency (BGN) amount into a currency with the
    /// given rate to BGN. The result is rounded to cents.
    pub fn from_reference(
        reference: Amount,
        rate_to_reference: Decimal,
    ) -> Result<Amount, AmountError> {
        if rate_to_reference <= Decimal::ZERO {
            return Err(AmountError::NonPositiveRate(rate_to_reference));
        }
        let raw = reference
            .0
            .checked_div(rate_to_reference)
            .ok_or(AmountError::Overflow)?;
        Ok(Amount(raw).round_cents())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100)).unwrap();
        assert_eq!(amount.value(), dec!(100));
    }

    #[test]
    fn test_amount_zero() {
        let amount = Amount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let result = Amount::new(dec!(-100));
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = Amount::new(dec!(50)).unwrap();
        let b = Amount::new(dec!(100)).unwrap();
        assert!(a.checked_sub(&b).is_none());
    }

    #[test]
    fn test_to_reference_rounds_half_even() {
        // 1.005 * 1 rounds to 1.00 under half-to-even, not 1.01
        let amount = Amount::new(dec!(1.005)).unwrap();
        let bgn = amount.to_reference(dec!(1)).unwrap();
        assert_eq!(bgn.value(), dec!(1.00));

        let amount = Amount::new(dec!(1.015)).unwrap();
        let bgn = amount.to_reference(dec!(1)).unwrap();
        assert_eq!(bgn.value(), dec!(1.02));
    }

    #[test]
    fn test_to_reference_with_rate() {
        // 250 EUR at 1.95583 = 488.9575 -> 488.96 BGN
        let amount = Amount::new(dec!(250)).unwrap();
        let bgn = amount.to_reference(dec!(1.95583)).unwrap();
        assert_eq!(bgn.value(), dec!(488.96));
    }

    #[test]
    fn test_from_reference_with_rate() {
        // 488.96 BGN at rate 1.95583 = 250.0012... -> 250.00 EUR
        let bgn = Amount::new(dec!(488.96)).unwrap();
        let eur = Amount::from_reference(bgn, dec!(1.95583)).unwrap();
        assert_eq!(eur.value(), dec!(250.00));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let amount = Amount::new(dec!(10)).unwrap();
        assert!(matches!(
            amount.to_reference(Decimal::ZERO),
            Err(AmountError::NonPositiveRate(_))
        ));
        assert!(matches!(
            Amount::from_reference(amount, dec!(-1)),
            Err(AmountError::NonPositiveRate(_))
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let amount = Amount::new(dec!(123.45)).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let parsed: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, parsed);
    }
}
