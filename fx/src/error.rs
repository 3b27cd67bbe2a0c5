//! FX bank error types.

use std::path::PathBuf;

use moneta_common::MonetaryError;
use thiserror::Error;

/// Errors raised while configuring or loading a bank.
#[derive(Debug, Error)]
pub enum FxError {
    /// Rate registration or reduction failed.
    #[error(transparent)]
    Monetary(#[from] MonetaryError),

    /// Rate sheet could not be read.
    #[error("Failed to read rate sheet {path}: {source}")]
    RateSheetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rate sheet is not valid JSON or has the wrong shape.
    #[error("Malformed rate sheet: {0}")]
    RateSheetFormat(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
