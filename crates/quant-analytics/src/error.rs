//! Error types for analytics operations

use quant_data::MarketDataError;
use thiserror::Error;

/// Analytics specific errors
///
/// Numeric degeneracies (a zero-variance series making a ratio undefined)
/// are deliberately not errors; they surface as `None` fields in the
/// produced report.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Price history missing or empty for a requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Malformed request parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Return target unreachable by any sampled portfolio
    #[error("Return target {target} not reached by any of {sampled} sampled portfolios")]
    UnsatisfiableConstraint {
        target: f64,
        sampled: usize,
    },

    /// Background computation task failed
    #[error("Analytics task failed: {0}")]
    Task(String),
}

/// Result type alias for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Convert market data errors at the crate seam
///
/// A provider failure of any flavor means the data is unavailable from the
/// analytics engine's point of view; only window parse failures map to
/// invalid input.
impl From<MarketDataError> for AnalyticsError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::DataUnavailable { symbol, reason } => {
                AnalyticsError::DataUnavailable { symbol, reason }
            },
            MarketDataError::InvalidWindow(value) => {
                AnalyticsError::InvalidInput(format!("invalid history window: {value}"))
            },
            other => AnalyticsError::DataUnavailable {
                symbol: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyticsError::InvalidInput("weights must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: weights must be positive");

        let err = AnalyticsError::UnsatisfiableConstraint {
            target: 0.4,
            sampled: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "Return target 0.4 not reached by any of 10000 sampled portfolios"
        );
    }

    #[test]
    fn test_data_errors_convert() {
        let err: AnalyticsError = MarketDataError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "empty response".to_string(),
        }
        .into();
        assert!(matches!(err, AnalyticsError::DataUnavailable { .. }));

        let err: AnalyticsError = MarketDataError::InvalidWindow("soon".to_string()).into();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));

        let err: AnalyticsError = MarketDataError::YahooFinance("500".to_string()).into();
        assert!(matches!(err, AnalyticsError::DataUnavailable { .. }));
    }
}
