//! Market data access for the quant analytics engine
//!
//! This crate owns the data boundary: validated price-series domain types,
//! history-window parsing, and async providers that fetch daily bars from
//! live sources or serve them from fixtures. It includes:
//!
//! - `PriceBar` / `PriceSeries`: validated, immutable daily price history
//! - `Window`: trailing history windows parsed from strings like `"6mo"`
//! - `PriceHistoryProvider`: the async provider trait the analytics engine
//!   consumes
//! - `YahooProvider` / `AlphaVantageProvider`: live data sources
//! - `MemoryProvider`: preloaded fixture provider for tests and offline runs
//! - `CachingProvider`: TTL caching decorator over any provider
//!
//! # Example
//!
//! ```rust,ignore
//! use quant_data::{CachingProvider, PriceHistoryProvider, Window, YahooProvider};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = CachingProvider::new(YahooProvider::new(), Duration::from_secs(300));
//!     let series = provider.history("AAPL", "6mo".parse::<Window>()?).await?;
//!     println!("{} bars, last close {}", series.len(), series.last_close());
//!     Ok(())
//! }
//! ```

pub mod bar;
pub mod cache;
pub mod error;
pub mod provider;
pub mod providers;
pub mod window;

// Re-export main types for convenience
pub use bar::{PriceBar, PriceSeries};
pub use cache::CachingProvider;
pub use error::{MarketDataError, Result};
pub use provider::PriceHistoryProvider;
pub use providers::{AlphaVantageProvider, MemoryProvider, YahooProvider};
pub use window::Window;
