//! Money types
//!
//! Domain primitives for monetary values with business rule validation.
//! Values are validated at construction time, so an invalid amount never
//! reaches a repository.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// Maximum allowed magnitude (1 trillion)
const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Maximum decimal places (currency minor units)
const MAX_SCALE: u32 = 2;

/// Errors that can occur when creating a money value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be greater than 0 (got {0})")]
    NotPositive(Decimal),

    #[error("Amount cannot be zero")]
    Zero,

    #[error("Income cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,
}

fn check_bounds(value: Decimal) -> Result<(), AmountError> {
    // Trailing zeros ("12.50") don't count against the scale limit
    if value.normalize().scale() > MAX_SCALE {
        return Err(AmountError::TooManyDecimals(value.normalize().scale()));
    }

    if value.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(AmountError::Overflow);
    }

    Ok(())
}

/// Amount is a strictly positive money value.
///
/// Used for loan principals and user-entered expenses.
///
/// # Invariants
/// - Value is always positive (>= 0.01)
/// - Maximum 2 decimal places
/// - Maximum value is 1 trillion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use budget_tracker::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(2550, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(2550, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value > 1 trillion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Neg for Amount {
    type Output = SignedAmount;

    fn neg(self) -> SignedAmount {
        SignedAmount(-self.0)
    }
}

/// SignedAmount is a non-zero money value stored on expenses.
///
/// Positive values are spend, negative values are income offsets
/// (for example a repaid lending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SignedAmount(Decimal);

impl SignedAmount {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            return Err(AmountError::Zero);
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Amount> for SignedAmount {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl TryFrom<Decimal> for SignedAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        SignedAmount::new(value)
    }
}

impl From<SignedAmount> for Decimal {
    fn from(amount: SignedAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Income is a budget's monthly income figure. Unlike Amount, Income can be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Income(Decimal);

impl Income {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for Income {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Income {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Income::new(value)
    }
}

impl From<Income> for Decimal {
    fn from(income: Income) -> Self {
        income.0
    }
}

impl fmt::Display for Income {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(Decimal::new(100, 0));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), Decimal::new(100, 0));
    }

    #[test]
    fn test_amount_zero_rejected() {
        let amount = Amount::new(Decimal::ZERO);
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = Amount::new(Decimal::new(-100, 0));
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_minimum_ok() {
        assert!(Amount::new(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_amount_too_many_decimals() {
        // 0.125 has 3 decimal places
        let amount = Amount::new(Decimal::new(125, 3));
        assert!(matches!(amount, Err(AmountError::TooManyDecimals(3))));
    }

    #[test]
    fn test_amount_trailing_zeros_ok() {
        // 12.5000 normalizes to 12.5
        assert!(Amount::new(Decimal::new(125000, 4)).is_ok());
    }

    #[test]
    fn test_amount_overflow() {
        let value = Decimal::new(100_000_000_000_001, 2);
        assert!(matches!(Amount::new(value), Err(AmountError::Overflow)));
    }

    #[test]
    fn test_amount_deserialize_from_number() {
        let amount: Amount = serde_json::from_str("250.5").unwrap();
        assert_eq!(amount.value(), Decimal::new(2505, 1));

        let zero: Result<Amount, _> = serde_json::from_str("0");
        assert!(zero.is_err());
    }

    #[test]
    fn test_negated_amount_is_income() {
        let amount = Amount::new(Decimal::new(500, 0)).unwrap();
        let signed = -amount;
        assert!(signed.value().is_sign_negative());
        assert_eq!(signed.value(), Decimal::new(-500, 0));
    }

    #[test]
    fn test_signed_amount_rejects_zero() {
        assert!(matches!(SignedAmount::new(Decimal::ZERO), Err(AmountError::Zero)));
        assert!(SignedAmount::new(Decimal::new(-1, 2)).is_ok());
    }

    #[test]
    fn test_income_allows_zero() {
        assert_eq!(Income::new(Decimal::ZERO).unwrap(), Income::zero());
        assert!(matches!(
            Income::new(Decimal::new(-1, 0)),
            Err(AmountError::Negative(_))
        ));
    }
}
