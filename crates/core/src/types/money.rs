//! Whole-unit money amounts.
//!
//! Prices, delivery fees and order totals are stored as `NUMERIC(10, 0)`:
//! non-negative amounts with no fractional part (the marketplace trades in
//! VND, which has no minor unit).

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors produced when constructing or combining [`Money`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount cannot be negative")]
    Negative,
    #[error("amount must be a whole number")]
    Fractional,
    #[error("amount exceeds {max} digits")]
    TooLarge { max: u32 },
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// A non-negative whole-unit amount of money.
///
/// ```
/// use foodloc_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::from(35_000)).unwrap();
/// assert_eq!(price.line_total(3).unwrap(), Money::new(Decimal::from(105_000)).unwrap());
/// assert!(Money::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Maximum number of digits (`NUMERIC(10, 0)`).
    pub const MAX_DIGITS: u32 = 10;

    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has a fractional part, or
    /// does not fit in ten digits.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        if amount.fract() != Decimal::ZERO {
            return Err(MoneyError::Fractional);
        }
        let normalized = amount.trunc();
        if normalized >= Decimal::from(10_i64.pow(Self::MAX_DIGITS)) {
            return Err(MoneyError::TooLarge {
                max: Self::MAX_DIGITS,
            });
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for quantities below one and `TooLarge` if the
    /// result overflows the column.
    pub fn line_total(self, quantity: i32) -> Result<Self, MoneyError> {
        if quantity < 1 {
            return Err(MoneyError::InvalidQuantity);
        }
        let total = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or(MoneyError::TooLarge {
                max: Self::MAX_DIGITS,
            })?;
        Self::new(total)
    }

    /// Sum of two amounts.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` if the result overflows the column.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        let total = self.0.checked_add(other.0).ok_or(MoneyError::TooLarge {
            max: Self::MAX_DIGITS,
        })?;
        Self::new(total)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Column constraints already guarantee the invariant.
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vnd(n: i64) -> Money {
        Money::new(Decimal::from(n)).unwrap()
    }

    #[test]
    fn test_rejects_negative_and_fractional() {
        assert_eq!(Money::new(Decimal::from(-5)), Err(MoneyError::Negative));
        assert_eq!(Money::new(Decimal::new(105, 1)), Err(MoneyError::Fractional));
    }

    #[test]
    fn test_accepts_trailing_zero_scale() {
        // "35000.00" arrives from clients that always send two decimals
        let m = Money::new(Decimal::new(3_500_000, 2)).unwrap();
        assert_eq!(m, vnd(35_000));
    }

    #[test]
    fn test_rejects_more_than_ten_digits() {
        assert!(matches!(
            Money::new(Decimal::from(10_000_000_000_i64)),
            Err(MoneyError::TooLarge { .. })
        ));
        assert!(Money::new(Decimal::from(9_999_999_999_i64)).is_ok());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(vnd(25_000).line_total(4).unwrap(), vnd(100_000));
        assert_eq!(vnd(25_000).line_total(0), Err(MoneyError::InvalidQuantity));
        assert_eq!(vnd(25_000).line_total(-2), Err(MoneyError::InvalidQuantity));
    }

    #[test]
    fn test_checked_add_overflow() {
        let big = vnd(9_000_000_000);
        assert!(big.checked_add(big).is_err());
        assert_eq!(vnd(1).checked_add(vnd(2)).unwrap(), vnd(3));
    }

    #[test]
    fn test_serializes_as_string() {
        assert_eq!(serde_json::to_string(&vnd(35_000)).unwrap(), "\"35000\"");
        let parsed: Money = serde_json::from_str("\"42000\"").unwrap();
        assert_eq!(parsed, vnd(42_000));
        assert!(serde_json::from_str::<Money>("\"-1\"").is_err());
    }
}
