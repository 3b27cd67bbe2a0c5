//! Error types for Moneta value operations.

use crate::CurrencyPair;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while building or reducing monetary expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonetaryError {
    /// No conversion is registered for the ordered pair and it is not an identity.
    #[error("No exchange rate registered for {pair}")]
    RateNotFound { pair: CurrencyPair },

    /// A rate was zero or negative at registration time.
    #[error("Invalid rate {rate} for {pair}: rates must be positive")]
    InvalidRate { pair: CurrencyPair, rate: Decimal },

    /// Integer amount arithmetic left the representable range.
    #[error("Amount overflow during {operation}")]
    Overflow { operation: &'static str },

    /// Currency code is not three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Amount text could not be parsed.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}

impl MonetaryError {
    pub(crate) fn overflow(operation: &'static str) -> Self {
        MonetaryError::Overflow { operation }
    }

    /// Get error code for reporting layers.
    pub fn error_code(&self) -> &'static str {
        match self {
            MonetaryError::RateNotFound { .. } => "RATE_NOT_FOUND",
            MonetaryError::InvalidRate { .. } => "INVALID_RATE",
            MonetaryError::Overflow { .. } => "OVERFLOW",
            MonetaryError::InvalidCurrency(_) => "INVALID_CURRENCY",
            MonetaryError::InvalidAmount(_) => "INVALID_AMOUNT",
        }
    }

    /// The currency pair involved, if the failure concerns one.
    pub fn pair(&self) -> Option<&CurrencyPair> {
        match self {
            MonetaryError::RateNotFound { pair } | MonetaryError::InvalidRate { pair, .. } => {
                Some(pair)
            }
            _ => None,
        }
    }
}

/// Result type alias for monetary operations.
pub type MonetaryResult<T> = std::result::Result<T, MonetaryError>;
