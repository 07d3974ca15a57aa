//! Period-over-period return series derived from price history

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use quant_data::PriceSeries;
use serde::Serialize;
use std::collections::HashMap;

/// Daily simple returns for one symbol, one element shorter than the price
/// series it was derived from. Each return is dated by the later bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    symbol: String,
    dates: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compute daily simple returns: `r[i] = close[i] / close[i-1] - 1`
///
/// Needs at least 2 bars; fewer is a data-availability failure, not an
/// empty result.
pub fn daily_returns(series: &PriceSeries) -> Result<ReturnSeries> {
    if series.len() < 2 {
        return Err(AnalyticsError::DataUnavailable {
            symbol: series.symbol().to_string(),
            reason: format!("need at least 2 bars to compute returns, got {}", series.len()),
        });
    }

    let bars = series.bars();
    let mut dates = Vec::with_capacity(bars.len() - 1);
    let mut values = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        dates.push(pair[1].date);
        values.push(pair[1].close / pair[0].close - 1.0);
    }

    Ok(ReturnSeries {
        symbol: series.symbol().to_string(),
        dates,
        values,
    })
}

/// Joint return history of several symbols, aligned on common dates
///
/// Columns follow the order of the input series. Dates present in only some
/// of the series are dropped, mirroring an inner join on the date index.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReturns {
    symbols: Vec<String>,
    dates: Vec<DateTime<Utc>>,
    matrix: DMatrix<f64>,
}

impl AlignedReturns {
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    /// Return matrix with one row per common date and one column per symbol
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn num_observations(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_assets(&self) -> usize {
        self.matrix.ncols()
    }

    /// One symbol's aligned return column
    pub fn column(&self, asset: usize) -> Vec<f64> {
        self.matrix.column(asset).iter().copied().collect()
    }
}

/// Align several price series on their common dates and compute the joint
/// daily return matrix.
///
/// Fails with `DataUnavailable` if the series share fewer than 2 dates (no
/// return can be formed from the intersection).
pub fn aligned_returns(series: &[PriceSeries]) -> Result<AlignedReturns> {
    let symbols: Vec<String> = series.iter().map(|s| s.symbol().to_string()).collect();
    if series.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "at least one price series is required".to_string(),
        ));
    }

    // Intersect on dates, keeping the first series' order
    let mut common: Vec<DateTime<Utc>> = series[0].dates();
    let close_maps: Vec<HashMap<DateTime<Utc>, f64>> = series
        .iter()
        .map(|s| s.bars().iter().map(|b| (b.date, b.close)).collect())
        .collect();
    common.retain(|d| close_maps.iter().all(|m| m.contains_key(d)));

    if common.len() < 2 {
        return Err(AnalyticsError::DataUnavailable {
            symbol: symbols.join(","),
            reason: format!(
                "series share only {} common dates, need at least 2",
                common.len()
            ),
        });
    }

    let rows = common.len() - 1;
    let cols = series.len();
    let matrix = DMatrix::from_fn(rows, cols, |row, col| {
        let prev = close_maps[col][&common[row]];
        let next = close_maps[col][&common[row + 1]];
        next / prev - 1.0
    });

    Ok(AlignedReturns {
        symbols,
        dates: common[1..].to_vec(),
        matrix,
    })
}
