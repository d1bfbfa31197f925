use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreadthError {
    // Structural problem with the price table or a calculator argument.
    // Fatal for the run: nothing is written after this.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    // A single ticker could not be fetched. The table builder absorbs these.
    #[error("Price fetch error: {0}")]
    FetchError(String),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl From<reqwest::Error> for BreadthError {
    fn from(err: reqwest::Error) -> Self {
        BreadthError::FetchError(err.to_string())
    }
}

impl From<serde_json::Error> for BreadthError {
    fn from(err: serde_json::Error) -> Self {
        BreadthError::ConfigError(format!("Invalid JSON: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, BreadthError>;
