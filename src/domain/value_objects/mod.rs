//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU longer than 50 characters")]
    TooLong,
}

/// Largest price or discount amount the store accepts (1e12). Keeps every
/// cart and order sum far inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, "USD") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let amount = self.amount.checked_add(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }

    /// Subtracts `other`, never going below zero.
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount.max(Decimal::ZERO), &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Result<Money, MoneyError> {
        let amount = self.amount.checked_mul(Decimal::from(qty)).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }

    /// Rounds to two decimal places, midpoint away from zero.
    pub fn rounded(&self) -> Money {
        Money::new(self.amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero), &self.currency)
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch { left: self.currency.clone(), right: other.currency.clone() });
        }
        Ok(())
    }
}

impl Default for Money { fn default() -> Self { Self::zero("USD") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount, self.currency) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },
    #[error("amount out of range")]
    Overflow,
}

/// Quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> { self.0.checked_sub(other).map(Self) }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() {
        let sku = Sku::new(" prod-001 ").unwrap();
        assert_eq!(sku.as_str(), "PROD-001");
        assert_eq!(Sku::new("  "), Err(SkuError::Empty));
        assert_eq!(Sku::new("X".repeat(51)), Err(SkuError::TooLong));
    }

    #[test]
    fn test_sku_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<Sku>("\"\"").is_err());
        assert_eq!(serde_json::from_str::<Sku>("\"ab-1\"").unwrap().as_str(), "AB-1");
    }

    #[test]
    fn test_money_add() {
        let a = Money::usd(Decimal::new(100, 0));
        let b = Money::usd(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
        assert!(a.add(&Money::new(Decimal::ONE, "EUR")).is_err());
    }

    #[test]
    fn test_money_overflow_is_an_error() {
        let huge = Money::usd(Decimal::MAX);
        assert_eq!(huge.add(&Money::usd(Decimal::ONE)), Err(MoneyError::Overflow));
        assert_eq!(huge.multiply(2), Err(MoneyError::Overflow));
        assert_eq!(Money::usd(Decimal::new(1005, 3)).multiply(3).unwrap().rounded().amount(), Decimal::new(302, 2));
    }

    #[test]
    fn test_max_amount() {
        assert_eq!(MAX_AMOUNT, Decimal::new(1_000_000_000_000, 0));
    }

    #[test]
    fn test_money_saturating_sub_floors_at_zero() {
        let a = Money::usd(Decimal::new(50, 0));
        let b = Money::usd(Decimal::new(80, 0));
        assert_eq!(a.saturating_sub(&b).unwrap().amount(), Decimal::ZERO);
        assert_eq!(b.saturating_sub(&a).unwrap().amount(), Decimal::new(30, 0));
    }

    #[test]
    fn test_money_rounded() {
        assert_eq!(Money::usd(Decimal::new(29985, 4)).rounded().amount(), Decimal::new(300, 2));
        assert_eq!(Money::usd(Decimal::new(1005, 3)).rounded().amount(), Decimal::new(101, 2));
    }

    #[test]
    fn test_quantity() {
        let q = Quantity::new(3);
        assert_eq!(q.add(2).value(), 5);
        assert_eq!(q.subtract(4), None);
        assert!(q.subtract(3).unwrap().is_zero());
    }
}
