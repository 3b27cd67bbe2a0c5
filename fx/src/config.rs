//! Bank configuration and rate-sheet loading.

use std::path::{Path, PathBuf};

use moneta_common::{Currency, MonetaryResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bank::Bank;
use crate::error::{FxError, FxResult};

/// One directional rate in a rate sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Currency being converted.
    pub from: String,
    /// Currency being converted into.
    pub to: String,
    /// Units of `from` per one unit of `to`.
    pub rate: Decimal,
}

/// A set of rates used to populate a bank at startup.
///
/// ```json
/// { "rates": [ { "from": "CHF", "to": "USD", "rate": "2" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSheet {
    pub rates: Vec<RateEntry>,
}

impl RateSheet {
    /// Parse a rate sheet from JSON.
    pub fn from_json(json: &str) -> FxResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a rate sheet file.
    pub fn load(path: impl AsRef<Path>) -> FxResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FxError::RateSheetIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Register every entry with `bank`, stopping at the first invalid one.
    pub fn apply(&self, bank: &Bank) -> MonetaryResult<()> {
        for entry in &self.rates {
            let from = Currency::parse(&entry.from)?;
            let to = Currency::parse(&entry.to)?;
            bank.add_rate(from, to, entry.rate)?;
        }
        Ok(())
    }
}

impl Bank {
    /// Build a bank populated from a rate sheet.
    pub fn from_rate_sheet(sheet: &RateSheet) -> MonetaryResult<Self> {
        let bank = Bank::new();
        sheet.apply(&bank)?;
        info!(rates = bank.len(), "Loaded rate sheet");
        Ok(bank)
    }
}

/// Bank configuration.
#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Rate sheet to load at startup.
    pub rate_sheet_path: Option<PathBuf>,
    /// Log level.
    pub log_level: String,
    /// Emit logs as JSON.
    pub json_logs: bool,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            rate_sheet_path: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl BankConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MONETA_RATE_SHEET") {
            if !path.is_empty() {
                config.rate_sheet_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(json) = std::env::var("MONETA_JSON_LOGS") {
            config.json_logs = matches!(json.as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        if let Some(path) = &self.rate_sheet_path {
            if path.as_os_str().is_empty() {
                return Err("Rate sheet path cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Build the bank described by this configuration.
    ///
    /// Without a rate sheet the bank starts empty.
    pub fn build_bank(&self) -> FxResult<Bank> {
        self.validate().map_err(FxError::Configuration)?;

        match &self.rate_sheet_path {
            Some(path) => Ok(Bank::from_rate_sheet(&RateSheet::load(path)?)?),
            None => Ok(Bank::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneta_common::{money, CurrencyPair, Expression, MonetaryError};
    use rust_decimal_macros::dec;
    use std::io::Write;

    const SHEET: &str = r#"{
        "rates": [
            { "from": "CHF", "to": "USD", "rate": "2" },
            { "from": "eur", "to": "usd", "rate": "0.5" }
        ]
    }"#;

    #[test]
    fn test_parse_rate_sheet() {
        let sheet = RateSheet::from_json(SHEET).unwrap();

        assert_eq!(sheet.rates.len(), 2);
        assert_eq!(sheet.rates[1].rate, dec!(0.5));
    }

    #[test]
    fn test_bank_from_rate_sheet() {
        let bank = Bank::from_rate_sheet(&RateSheet::from_json(SHEET).unwrap()).unwrap();

        assert_eq!(bank.len(), 2);
        assert!(bank.contains(&CurrencyPair::new("EUR", "USD")));

        let sum = money(5, "USD").plus(money(10, "CHF"));
        assert_eq!(bank.reduce(&sum, &Currency::usd()).unwrap(), money(10, "USD"));
    }

    #[test]
    fn test_rate_sheet_rejects_non_positive_rate() {
        let sheet = RateSheet {
            rates: vec![RateEntry {
                from: "CHF".to_string(),
                to: "USD".to_string(),
                rate: dec!(0),
            }],
        };

        assert!(matches!(
            Bank::from_rate_sheet(&sheet),
            Err(MonetaryError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_rate_sheet_rejects_bad_currency() {
        let sheet = RateSheet {
            rates: vec![RateEntry {
                from: "FRANCS".to_string(),
                to: "USD".to_string(),
                rate: dec!(2),
            }],
        };

        assert!(matches!(
            Bank::from_rate_sheet(&sheet),
            Err(MonetaryError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_malformed_rate_sheet() {
        assert!(matches!(
            RateSheet::from_json("{ \"rates\": 3 }"),
            Err(FxError::RateSheetFormat(_))
        ));
    }

    #[test]
    fn test_load_rate_sheet_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SHEET.as_bytes()).unwrap();

        let config = BankConfig {
            rate_sheet_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let bank = config.build_bank().unwrap();

        let francs = Expression::from(money(10, "CHF"));
        assert_eq!(bank.reduce(&francs, &Currency::usd()).unwrap(), money(5, "USD"));
    }

    #[test]
    fn test_missing_rate_sheet_file() {
        let config = BankConfig {
            rate_sheet_path: Some(PathBuf::from("/nonexistent/moneta/rates.json")),
            ..Default::default()
        };

        assert!(matches!(
            config.build_bank(),
            Err(FxError::RateSheetIo { .. })
        ));
    }

    #[test]
    fn test_default_config() {
        let config = BankConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.build_bank().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = BankConfig::default();
        config.log_level = "  ".to_string();
        assert!(config.validate().is_err());
        assert!(matches!(
            config.build_bank(),
            Err(FxError::Configuration(_))
        ));
    }
}
