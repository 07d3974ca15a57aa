//! Error types for market data access

use thiserror::Error;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// History window string could not be parsed
    #[error("Invalid history window: {0}")]
    InvalidWindow(String),

    /// A price bar failed validation
    #[error("Invalid price bar: {0}")]
    InvalidBar(String),

    /// A price series failed validation
    #[error("Invalid price series for {symbol}: {reason}")]
    InvalidSeries {
        symbol: String,
        reason: String,
    },

    /// Rate limit exceeded for a provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimited {
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantage(String),

    /// Provider configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;
