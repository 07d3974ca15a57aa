//! Validated price bar and price series types

use crate::error::{MarketDataError, Result};
use crate::window::Window;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single daily price bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Create a validated price bar
    ///
    /// Prices must be finite and non-negative, `high >= low`, and both
    /// `open` and `close` must lie within `[low, high]`.
    pub fn new(
        date: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self> {
        for (name, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MarketDataError::InvalidBar(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if high < low {
            return Err(MarketDataError::InvalidBar(format!(
                "high {high} is below low {low}"
            )));
        }
        if open < low || open > high || close < low || close > high {
            return Err(MarketDataError::InvalidBar(format!(
                "open {open} / close {close} outside [{low}, {high}]"
            )));
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// An ordered, non-empty series of daily price bars for one symbol
///
/// Construction enforces the invariants every consumer relies on: at least
/// one bar, and strictly increasing dates. Bars are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a validated price series
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(MarketDataError::InvalidSeries {
                symbol,
                reason: "series contains no bars".to_string(),
            });
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(MarketDataError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "bar dates must be strictly increasing ({} then {})",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; the constructor rejects empty series
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// High prices in date order
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Low prices in date order
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Bar dates in order
    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn last_bar(&self) -> &PriceBar {
        // Invariant: bars is non-empty
        &self.bars[self.bars.len() - 1]
    }

    pub fn last_close(&self) -> f64 {
        self.last_bar().close
    }

    pub fn last_date(&self) -> DateTime<Utc> {
        self.last_bar().date
    }

    /// The trailing sub-series covered by `window`, measured back from the
    /// last bar's date. The last bar always qualifies, so the result is
    /// never empty.
    pub fn trailing(&self, window: Window) -> Self {
        let start = window.start_from(self.last_date());
        let bars: Vec<PriceBar> = self
            .bars
            .iter()
            .filter(|b| b.date >= start)
            .copied()
            .collect();
        Self {
            symbol: self.symbol.clone(),
            bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i64::from(n))
    }

    fn bar(n: u32, close: f64) -> PriceBar {
        PriceBar::new(day(n), close, close, close, close, 1_000).unwrap()
    }

    #[test]
    fn test_bar_rejects_negative_close() {
        let result = PriceBar::new(day(0), 1.0, 1.0, -1.0, -1.0, 0);
        assert!(matches!(result, Err(MarketDataError::InvalidBar(_))));
    }

    #[test]
    fn test_bar_rejects_inverted_range() {
        let result = PriceBar::new(day(0), 5.0, 4.0, 5.0, 5.0, 0);
        assert!(matches!(result, Err(MarketDataError::InvalidBar(_))));
    }

    #[test]
    fn test_bar_rejects_close_outside_range() {
        let result = PriceBar::new(day(0), 5.0, 6.0, 4.0, 7.0, 0);
        assert!(matches!(result, Err(MarketDataError::InvalidBar(_))));
    }

    #[test]
    fn test_bar_rejects_nan() {
        let result = PriceBar::new(day(0), f64::NAN, 1.0, 1.0, 1.0, 0);
        assert!(matches!(result, Err(MarketDataError::InvalidBar(_))));
    }

    #[test]
    fn test_series_rejects_empty() {
        let result = PriceSeries::new("AAPL", vec![]);
        assert!(matches!(result, Err(MarketDataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_series_rejects_unordered_dates() {
        let result = PriceSeries::new("AAPL", vec![bar(1, 10.0), bar(0, 11.0)]);
        assert!(matches!(result, Err(MarketDataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let result = PriceSeries::new("AAPL", vec![bar(1, 10.0), bar(1, 11.0)]);
        assert!(matches!(result, Err(MarketDataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_series_accessors() {
        let series =
            PriceSeries::new("AAPL", vec![bar(0, 10.0), bar(1, 11.0), bar(2, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert!((series.last_close() - 12.0).abs() < f64::EPSILON);
        assert_eq!(series.last_date(), day(2));
    }

    #[test]
    fn test_trailing_window_slices_from_last_date() {
        let bars: Vec<PriceBar> = (0..10).map(|n| bar(n, 10.0 + f64::from(n))).collect();
        let series = PriceSeries::new("AAPL", bars).unwrap();

        let recent = series.trailing(Window::days(3));
        assert_eq!(recent.len(), 4); // last date minus 3 days, inclusive
        assert_eq!(recent.closes(), vec![16.0, 17.0, 18.0, 19.0]);

        let all = series.trailing(Window::max());
        assert_eq!(all.len(), 10);
    }
}
