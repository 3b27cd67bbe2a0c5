//! Exchange rates and the lookup contract used by reduction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MonetaryError, MonetaryResult};
use crate::monetary::{Currency, CurrencyPair};

/// A strictly positive conversion factor.
///
/// A rate for `from/to` is the number of `from` units worth one `to` unit:
/// `CHF/USD = 2` means 2 CHF buy 1 USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    /// The identity rate.
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// Create a rate, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    /// Create a rate for `pair`, reporting `InvalidRate` for non-positive values.
    pub fn for_pair(pair: &CurrencyPair, value: Decimal) -> MonetaryResult<Self> {
        Self::new(value).ok_or_else(|| MonetaryError::InvalidRate {
            pair: pair.clone(),
            rate: value,
        })
    }

    /// Get the underlying value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Convert an amount expressed in the source currency.
    ///
    /// Rounds to the nearest integer, midpoints away from zero. The quotient
    /// `amount * 10^scale / mantissa` is computed exactly by long division so
    /// rounding sees the true remainder.
    pub fn convert(&self, amount: i64) -> MonetaryResult<i64> {
        let divisor = self.0.mantissa().unsigned_abs();
        let dividend = u128::from(amount.unsigned_abs());
        let limit = u128::from(i64::MAX.unsigned_abs()) + 1;

        let mut quotient = dividend / divisor;
        let mut remainder = dividend % divisor;
        for _ in 0..self.0.scale() {
            // remainder < divisor < 2^96, so remainder * 10 fits in u128
            let widened = remainder * 10;
            quotient = quotient
                .checked_mul(10)
                .and_then(|q| q.checked_add(widened / divisor))
                .filter(|q| *q <= limit)
                .ok_or_else(|| MonetaryError::overflow("convert"))?;
            remainder = widened % divisor;
        }

        if remainder * 2 >= divisor {
            quotient += 1;
        }

        let magnitude =
            i128::try_from(quotient).map_err(|_| MonetaryError::overflow("convert"))?;
        let signed = if amount < 0 { -magnitude } else { magnitude };
        i64::try_from(signed).map_err(|_| MonetaryError::overflow("convert"))
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("rate must be positive, got {}", value))
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of directional exchange rates consulted during reduction.
pub trait ExchangeRates {
    /// Rate for converting `from` into `to`.
    ///
    /// Implementations must return [`Rate::ONE`] when `from == to` and
    /// `RateNotFound` when the ordered pair is unknown. No inverse is implied.
    fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate>;
}

impl<T: ExchangeRates + ?Sized> ExchangeRates for &T {
    fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        (**self).rate(from, to)
    }
}

impl<T: ExchangeRates + ?Sized> ExchangeRates for std::sync::Arc<T> {
    fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        (**self).rate(from, to)
    }
}
