//! Alpha Vantage price history provider

use crate::bar::{PriceBar, PriceSeries};
use crate::error::{MarketDataError, Result};
use crate::provider::PriceHistoryProvider;
use crate::window::Window;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Free-tier request budget per minute
const DEFAULT_RATE_LIMIT: u32 = 5;

/// Compact responses cover roughly the last 100 trading days
const COMPACT_SPAN_DAYS: i64 = 100;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Price history provider backed by the Alpha Vantage API
#[derive(Debug, Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with API key and rate limit
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (default: 5 for free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(rate_limit)
                .unwrap_or_else(|| NonZeroU32::new(DEFAULT_RATE_LIMIT).expect("non-zero")),
        );
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            rate_limiter,
        }
    }

    /// Create from environment variable ALPHA_VANTAGE_API_KEY with default rate limit
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            MarketDataError::Config(
                "ALPHA_VANTAGE_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::new(api_key, DEFAULT_RATE_LIMIT))
    }

    async fn fetch_daily(&self, symbol: &str, window: Window) -> Result<serde_json::Value> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let outputsize = if window.num_days() > COMPACT_SPAN_DAYS {
            "full"
        } else {
            "compact"
        };

        let mut params = HashMap::new();
        params.insert("function", "TIME_SERIES_DAILY");
        params.insert("symbol", symbol);
        params.insert("outputsize", outputsize);
        params.insert("apikey", &self.api_key);

        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(MarketDataError::AlphaVantage(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;

        // Check for API error messages
        if let Some(error) = data.get("Error Message") {
            return Err(MarketDataError::AlphaVantage(error.to_string()));
        }

        if data.get("Note").is_some() {
            return Err(MarketDataError::RateLimited {
                provider: "Alpha Vantage".to_string(),
            });
        }

        Ok(data)
    }
}

fn parse_field(values: &serde_json::Value, key: &str) -> Option<f64> {
    values.get(key)?.as_str()?.parse().ok()
}

fn parse_bar(date_str: &str, values: &serde_json::Value) -> Option<PriceBar> {
    let date: DateTime<Utc> = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    let open = parse_field(values, "1. open")?;
    let high = parse_field(values, "2. high")?;
    let low = parse_field(values, "3. low")?;
    let close = parse_field(values, "4. close")?;
    let volume: u64 = values.get("5. volume")?.as_str()?.parse().ok()?;

    PriceBar::new(date, open, high, low, close, volume).ok()
}

#[async_trait]
impl PriceHistoryProvider for AlphaVantageProvider {
    async fn history(&self, symbol: &str, window: Window) -> Result<PriceSeries> {
        let data = self.fetch_daily(symbol, window).await?;

        let series = data.get("Time Series (Daily)").ok_or_else(|| {
            MarketDataError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no daily time series in response".to_string(),
            }
        })?;

        let mut bars = Vec::new();
        if let Some(obj) = series.as_object() {
            for (date_str, values) in obj {
                match parse_bar(date_str, values) {
                    Some(bar) => bars.push(bar),
                    None => {
                        tracing::warn!(symbol, date = %date_str, "skipping malformed daily row");
                    }
                }
            }
        }
        bars.sort_by_key(|b| b.date);

        // The API always returns its full compact/full span; trim client-side
        let start = window.start_from(Utc::now());
        bars.retain(|b| b.date >= start);

        if bars.is_empty() {
            return Err(MarketDataError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no usable daily rows in window {window}"),
            });
        }

        PriceSeries::new(symbol, bars)
    }
}
