//! Moneta FX Bank
//!
//! Registry of directional exchange rates and the entry point for reducing
//! money expressions to a single currency.
//!
//! # Example
//!
//! ```rust
//! use moneta_common::{money, Currency};
//! use moneta_fx::Bank;
//! use rust_decimal::Decimal;
//!
//! let bank = Bank::new();
//! bank.add_rate("CHF", "USD", Decimal::TWO)?;
//!
//! let sum = money(5, "USD").plus(money(10, "CHF"));
//! assert_eq!(bank.reduce(&sum, &Currency::usd())?, money(10, "USD"));
//! # Ok::<(), moneta_common::MonetaryError>(())
//! ```

pub mod bank;
pub mod config;
pub mod error;

#[cfg(test)]
mod properties;

pub use bank::{Bank, FrozenBank, RateTable};
pub use config::{BankConfig, RateEntry, RateSheet};
pub use error::{FxError, FxResult};
