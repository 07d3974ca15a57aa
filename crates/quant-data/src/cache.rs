//! Caching decorator for price history providers

use crate::bar::PriceSeries;
use crate::error::Result;
use crate::provider::PriceHistoryProvider;
use crate::window::Window;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for price history requests
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: String,
    window: Window,
}

/// Provider decorator that caches fetched series for a fixed TTL
///
/// Wraps any inner provider and implements the provider trait itself, so it
/// can be layered in front of a live client transparently.
pub struct CachingProvider<P> {
    inner: P,
    cache: Arc<RwLock<TimedCache<CacheKey, PriceSeries>>>,
}

impl<P> CachingProvider<P>
where
    P: PriceHistoryProvider,
{
    /// Wrap `inner` with a cache of the given TTL
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }
}

#[async_trait]
impl<P> PriceHistoryProvider for CachingProvider<P>
where
    P: PriceHistoryProvider,
{
    async fn history(&self, symbol: &str, window: Window) -> Result<PriceSeries> {
        let key = CacheKey {
            symbol: symbol.to_string(),
            window,
        };

        // Try to get from cache first
        let cached = {
            let mut cache = self.cache.write().await;
            cache.cache_get(&key).cloned()
        };
        if let Some(series) = cached {
            tracing::debug!(symbol, %window, "price history cache hit");
            return Ok(series);
        }
        tracing::debug!(symbol, %window, "price history cache miss");

        let series = self.inner.history(symbol, window).await?;

        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, series.clone());

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::PriceBar;
    use crate::error::MarketDataError;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how many times the inner fetch actually runs
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceHistoryProvider for CountingProvider {
        async fn history(&self, symbol: &str, _window: Window) -> Result<PriceSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "MISSING" {
                return Err(MarketDataError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "not found".to_string(),
                });
            }
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let bars = (0..5)
                .map(|n| {
                    PriceBar::new(
                        start + chrono::Duration::days(n),
                        100.0,
                        100.0,
                        100.0,
                        100.0,
                        1_000,
                    )
                    .unwrap()
                })
                .collect();
            PriceSeries::new(symbol, bars)
        }
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let provider = CachingProvider::new(CountingProvider::new(), Duration::from_secs(60));

        let first = provider.history("AAPL", Window::months(1)).await.unwrap();
        let second = provider.history("AAPL", Window::months(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.inner.calls(), 1);
        assert_eq!(provider.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_windows_are_distinct_entries() {
        let provider = CachingProvider::new(CountingProvider::new(), Duration::from_secs(60));

        provider.history("AAPL", Window::months(1)).await.unwrap();
        provider.history("AAPL", Window::months(3)).await.unwrap();

        assert_eq!(provider.inner.calls(), 2);
        assert_eq!(provider.len().await, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let provider = CachingProvider::new(CountingProvider::new(), Duration::from_secs(60));

        assert!(provider.history("MISSING", Window::months(1)).await.is_err());
        assert!(provider.history("MISSING", Window::months(1)).await.is_err());

        assert_eq!(provider.inner.calls(), 2);
        assert!(provider.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear() {
        let provider = CachingProvider::new(CountingProvider::new(), Duration::from_secs(60));
        provider.history("AAPL", Window::months(1)).await.unwrap();
        assert_eq!(provider.len().await, 1);

        provider.clear().await;
        assert!(provider.is_empty().await);
    }
}
