//! Monetary types for Moneta.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MonetaryError, MonetaryResult};
use crate::expression::Expression;
use crate::rate::ExchangeRates;

/// An integer amount tagged with a currency.
///
/// Values are immutable: every operation returns a new instance. Equality and
/// hashing are structural over `(amount, currency)`, so equal amounts in
/// different currencies never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in whole units of the currency.
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// Create a money value. Shorthand for [`Money::new`].
pub fn money(amount: i64, currency: impl Into<Currency>) -> Money {
    Money::new(amount, currency)
}

impl Money {
    /// Create a new Money instance.
    pub fn new(amount: i64, currency: impl Into<Currency>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: impl Into<Currency>) -> Self {
        Self::new(0, currency)
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Check if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Multiply the amount, keeping the currency.
    pub fn times(&self, multiplier: i64) -> MonetaryResult<Money> {
        let amount = self
            .amount
            .checked_mul(multiplier)
            .ok_or_else(|| MonetaryError::overflow("times"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Flip the sign of the amount.
    pub fn negate(&self) -> MonetaryResult<Money> {
        let amount = self
            .amount
            .checked_neg()
            .ok_or_else(|| MonetaryError::overflow("negate"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Defer addition of `other` to this value.
    ///
    /// Nothing is converted or added here; the resulting [`Expression::Sum`]
    /// keeps both operands in their own currencies until it is reduced.
    pub fn plus(&self, other: impl Into<Expression>) -> Expression {
        Expression::from(self.clone()).plus(other)
    }

    /// Express this value in `to`.
    ///
    /// Returns an unchanged copy when already in `to`. Otherwise divides the
    /// amount by `rates.rate(currency, to)` and rounds to the nearest integer,
    /// ties away from zero.
    ///
    /// Callers normally go through `Bank::reduce` in `moneta-fx`, which pins
    /// one rate snapshot for the whole evaluation.
    pub fn reduce<R>(&self, rates: &R, to: &Currency) -> MonetaryResult<Money>
    where
        R: ExchangeRates + ?Sized,
    {
        if &self.currency == to {
            return Ok(self.clone());
        }

        let rate = rates.rate(&self.currency, to)?;
        let amount = rate.convert(self.amount)?;
        Ok(Money::new(amount, to.clone()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl FromStr for Money {
    type Err = MonetaryError;

    /// Parses `"10 CHF"` or `"10:CHF"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s
            .split(|c: char| c.is_whitespace() || c == ':')
            .filter(|part| !part.is_empty());

        let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(MonetaryError::InvalidAmount(s.to_string()));
        };

        let amount = amount
            .parse::<i64>()
            .map_err(|_| MonetaryError::InvalidAmount(amount.to_string()))?;
        Ok(Money::new(amount, Currency::parse(code)?))
    }
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    ///
    /// The code is upper-cased but otherwise unchecked; use [`Currency::parse`]
    /// for untrusted input.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Create a currency from a three-letter code.
    pub fn parse(code: &str) -> MonetaryResult<Self> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MonetaryError::InvalidCurrency(code.to_string()));
        }
        Ok(Self::new(code))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn chf() -> Self {
        Self::new("CHF")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = MonetaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&Currency> for Currency {
    fn from(c: &Currency) -> Self {
        c.clone()
    }
}

/// An ordered currency pair. `CHF/USD` and `USD/CHF` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted.
    pub from: Currency,
    /// Currency being converted into.
    pub to: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(from: impl Into<Currency>, to: impl Into<Currency>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Whether both sides are the same currency.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}
