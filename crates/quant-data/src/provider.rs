//! Price history provider abstraction

use crate::bar::PriceSeries;
use crate::error::Result;
use crate::window::Window;
use async_trait::async_trait;

/// Source of historical price series
///
/// Implementations own fetching, caching and retrying; consumers ask once
/// per request and treat any failure as the data being unavailable.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Fetch the trailing price history for `symbol` over `window`
    async fn history(&self, symbol: &str, window: Window) -> Result<PriceSeries>;
}
