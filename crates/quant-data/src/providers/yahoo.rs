//! Yahoo Finance price history provider

use crate::bar::{PriceBar, PriceSeries};
use crate::error::{MarketDataError, Result};
use crate::provider::PriceHistoryProvider;
use crate::window::Window;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// Price history provider backed by the Yahoo Finance API
#[derive(Debug, Clone)]
pub struct YahooProvider {}

impl YahooProvider {
    /// Create a new Yahoo Finance provider
    pub fn new() -> Self {
        Self {}
    }

    async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<yahoo::Quote>> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| MarketDataError::YahooFinance(e.to_string()))?;

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| MarketDataError::YahooFinance(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| MarketDataError::YahooFinance(format!("Invalid end timestamp: {e}")))?;

        let response = connector
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| MarketDataError::YahooFinance(e.to_string()))?;

        response
            .quotes()
            .map_err(|e| MarketDataError::YahooFinance(e.to_string()))
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooProvider {
    async fn history(&self, symbol: &str, window: Window) -> Result<PriceSeries> {
        let end = Utc::now();
        let start = window.start_from(end);

        let mut quotes = self.fetch_quotes(symbol, start, end).await?;
        quotes.sort_by_key(|q| q.timestamp);
        quotes.dedup_by_key(|q| q.timestamp);

        let mut bars = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let Some(date) = DateTime::from_timestamp(quote.timestamp as i64, 0) else {
                tracing::warn!(symbol, timestamp = quote.timestamp, "skipping quote with bad timestamp");
                continue;
            };
            match PriceBar::new(date, quote.open, quote.high, quote.low, quote.close, quote.volume)
            {
                Ok(bar) => bars.push(bar),
                Err(err) => {
                    tracing::warn!(symbol, %err, "skipping malformed quote");
                }
            }
        }

        if bars.is_empty() {
            return Err(MarketDataError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no usable quotes in window {window}"),
            });
        }

        PriceSeries::new(symbol, bars)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}
