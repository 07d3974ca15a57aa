//! In-memory price history provider for tests and offline runs

use crate::bar::PriceSeries;
use crate::error::{MarketDataError, Result};
use crate::provider::PriceHistoryProvider;
use crate::window::Window;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Provider answering from preloaded series
///
/// Requests are served by slicing the stored series to the trailing window,
/// so one long fixture can back requests for several window lengths.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    series: RwLock<HashMap<String, PriceSeries>>,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider preloaded with the given series
    pub fn with_series(series: impl IntoIterator<Item = PriceSeries>) -> Self {
        let map = series
            .into_iter()
            .map(|s| (s.symbol().to_string(), s))
            .collect();
        Self {
            series: RwLock::new(map),
        }
    }

    /// Load or replace the series for its symbol
    pub async fn load(&self, series: PriceSeries) {
        let mut map = self.series.write().await;
        map.insert(series.symbol().to_string(), series);
    }
}

#[async_trait]
impl PriceHistoryProvider for MemoryProvider {
    async fn history(&self, symbol: &str, window: Window) -> Result<PriceSeries> {
        let map = self.series.read().await;
        let series = map
            .get(symbol)
            .ok_or_else(|| MarketDataError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "symbol not loaded".to_string(),
            })?;
        Ok(series.trailing(window))
    }
}
