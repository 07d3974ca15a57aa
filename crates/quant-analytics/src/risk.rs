//! Volatility, drawdown and tail-risk assessment

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::returns::{aligned_returns, daily_returns};
use crate::stats;
use nalgebra::DVector;
use quant_data::{PriceSeries, Window};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk assessment request; exactly one of `ticker` or `tickers`+`weights`
/// must be supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Raw exposure per ticker, applied as given without renormalization
    #[serde(default)]
    pub weights: Vec<f64>,
    #[serde(default = "default_window")]
    pub window: Window,
}

fn default_window() -> Window {
    Window::years(1)
}

impl RiskRequest {
    pub fn single(ticker: impl Into<String>) -> Self {
        Self {
            ticker: Some(ticker.into()),
            tickers: Vec::new(),
            weights: Vec::new(),
            window: default_window(),
        }
    }

    pub fn portfolio(
        tickers: impl IntoIterator<Item = impl Into<String>>,
        weights: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            ticker: None,
            tickers: tickers.into_iter().map(Into::into).collect(),
            weights: weights.into_iter().collect(),
            window: default_window(),
        }
    }

    /// Symbols whose price history the assessment needs, in request order
    pub fn symbols(&self) -> Vec<String> {
        match &self.ticker {
            Some(ticker) => vec![ticker.clone()],
            None => self.tickers.clone(),
        }
    }
}

/// Which input shape produced the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskScope {
    Single,
    Portfolio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolatilityLevel {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SharpeLevel {
    Excellent,
    Good,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawdownLevel {
    Severe,
    Moderate,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Volatility cut-offs differ by scope; the remaining buckets are shared
struct VolatilityThresholds {
    high: f64,
    moderate: f64,
}

const SINGLE_VOL_THRESHOLDS: VolatilityThresholds = VolatilityThresholds {
    high: 0.30,
    moderate: 0.15,
};

const PORTFOLIO_VOL_THRESHOLDS: VolatilityThresholds = VolatilityThresholds {
    high: 0.25,
    moderate: 0.12,
};

impl VolatilityLevel {
    fn bucket(volatility: f64, thresholds: &VolatilityThresholds) -> Self {
        if volatility > thresholds.high {
            Self::High
        } else if volatility > thresholds.moderate {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl SharpeLevel {
    fn bucket(sharpe: Option<f64>) -> Self {
        match sharpe {
            Some(s) if s > 1.0 => Self::Excellent,
            Some(s) if s > 0.5 => Self::Good,
            _ => Self::Poor,
        }
    }
}

impl DrawdownLevel {
    fn bucket(max_drawdown: f64) -> Self {
        let magnitude = max_drawdown.abs();
        if magnitude > 0.20 {
            Self::Severe
        } else if magnitude > 0.10 {
            Self::Moderate
        } else {
            Self::Minimal
        }
    }
}

impl RiskLevel {
    fn overall(volatility: VolatilityLevel, drawdown: DrawdownLevel) -> Self {
        if volatility == VolatilityLevel::High || drawdown == DrawdownLevel::Severe {
            Self::High
        } else if volatility == VolatilityLevel::Moderate || drawdown == DrawdownLevel::Moderate {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Numeric risk metrics, annualized where applicable
#[derive(Debug, Clone, Serialize)]
pub struct RiskMetrics {
    pub annualized_volatility: f64,
    /// `None` when the return series has zero variance
    pub sharpe_ratio: Option<f64>,
    /// Worst peak-to-trough decline of the cumulative curve, always <= 0
    pub max_drawdown: f64,
    /// Empirical 5th percentile of daily returns
    pub value_at_risk_95: f64,
    /// Sensitivity to the benchmark; omitted when the benchmark is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
}

/// Qualitative buckets derived from the metrics
#[derive(Debug, Clone, Serialize)]
pub struct RiskBreakdown {
    pub volatility: VolatilityLevel,
    pub sharpe: SharpeLevel,
    pub drawdown: DrawdownLevel,
    pub overall: RiskLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub scope: RiskScope,
    pub symbols: Vec<String>,
    pub window: Window,
    pub metrics: RiskMetrics,
    pub qualitative: RiskBreakdown,
}

/// Single-asset and portfolio risk assessor
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    config: AnalyticsConfig,
}

impl RiskAssessor {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Reject malformed request shapes before any data is fetched
    pub fn validate(&self, request: &RiskRequest) -> Result<RiskScope> {
        match (&request.ticker, request.tickers.is_empty()) {
            (Some(_), false) => Err(AnalyticsError::InvalidInput(
                "provide either a single ticker or a weighted basket, not both".to_string(),
            )),
            (Some(ticker), true) => {
                if ticker.trim().is_empty() {
                    return Err(AnalyticsError::InvalidInput(
                        "ticker symbol must not be blank".to_string(),
                    ));
                }
                if !request.weights.is_empty() {
                    return Err(AnalyticsError::InvalidInput(
                        "weights do not apply to a single-ticker assessment".to_string(),
                    ));
                }
                Ok(RiskScope::Single)
            },
            (None, true) => Err(AnalyticsError::InvalidInput(
                "a ticker or a weighted basket is required".to_string(),
            )),
            (None, false) => {
                if request.tickers.iter().any(|t| t.trim().is_empty()) {
                    return Err(AnalyticsError::InvalidInput(
                        "ticker symbols must not be blank".to_string(),
                    ));
                }
                if request.weights.len() != request.tickers.len() {
                    return Err(AnalyticsError::InvalidInput(format!(
                        "got {} weights for {} tickers",
                        request.weights.len(),
                        request.tickers.len()
                    )));
                }
                if request.weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
                    return Err(AnalyticsError::InvalidInput(
                        "weights must be finite and positive".to_string(),
                    ));
                }
                Ok(RiskScope::Portfolio)
            },
        }
    }

    /// Assess risk over the given price series, one per requested symbol in
    /// request order. The benchmark series feeds the beta estimate and is
    /// only consulted for single-asset requests.
    pub fn assess(
        &self,
        request: &RiskRequest,
        series: &[PriceSeries],
        benchmark: Option<&PriceSeries>,
    ) -> Result<RiskReport> {
        let scope = self.validate(request)?;
        let symbols = request.symbols();
        if series.len() != symbols.len() {
            return Err(AnalyticsError::InvalidInput(format!(
                "expected {} price series, got {}",
                symbols.len(),
                series.len()
            )));
        }

        match scope {
            RiskScope::Single => self.assess_single(request, &series[0], benchmark),
            RiskScope::Portfolio => self.assess_portfolio(request, series),
        }
    }

    fn assess_single(
        &self,
        request: &RiskRequest,
        series: &PriceSeries,
        benchmark: Option<&PriceSeries>,
    ) -> Result<RiskReport> {
        let returns = daily_returns(series)?;
        let values = returns.values();

        let mean = stats::mean(values);
        let std = stats::sample_std(values);
        let annual_factor = self.config.trading_days.sqrt();
        let volatility = std * annual_factor;
        // The single-asset ratio carries no risk-free subtraction
        let sharpe = if std > f64::EPSILON {
            Some(mean / std * annual_factor)
        } else {
            None
        };

        let beta = benchmark.and_then(|bench| compute_beta(series, bench));
        let metrics = RiskMetrics {
            annualized_volatility: volatility,
            sharpe_ratio: sharpe,
            max_drawdown: stats::max_drawdown(values),
            value_at_risk_95: stats::percentile(values, 5.0),
            beta,
        };

        Ok(self.report(RiskScope::Single, request, metrics, &SINGLE_VOL_THRESHOLDS))
    }

    fn assess_portfolio(&self, request: &RiskRequest, series: &[PriceSeries]) -> Result<RiskReport> {
        let aligned = aligned_returns(series)?;
        let w = DVector::from_column_slice(&request.weights);

        // Weighted daily portfolio returns with the weights as given
        let portfolio_returns: Vec<f64> = (aligned.matrix() * &w).iter().copied().collect();

        let covariance = stats::sample_covariance_matrix(aligned.matrix()) * self.config.trading_days;
        let volatility = stats::portfolio_volatility(&w, &covariance);
        let sharpe = if volatility > f64::EPSILON {
            let annual_return = stats::mean(&portfolio_returns) * self.config.trading_days;
            Some((annual_return - self.config.risk_free_rate) / volatility)
        } else {
            None
        };

        let metrics = RiskMetrics {
            annualized_volatility: volatility,
            sharpe_ratio: sharpe,
            max_drawdown: stats::max_drawdown(&portfolio_returns),
            value_at_risk_95: stats::percentile(&portfolio_returns, 5.0),
            beta: None,
        };

        Ok(self.report(
            RiskScope::Portfolio,
            request,
            metrics,
            &PORTFOLIO_VOL_THRESHOLDS,
        ))
    }

    fn report(
        &self,
        scope: RiskScope,
        request: &RiskRequest,
        metrics: RiskMetrics,
        thresholds: &VolatilityThresholds,
    ) -> RiskReport {
        let volatility = VolatilityLevel::bucket(metrics.annualized_volatility, thresholds);
        let sharpe = SharpeLevel::bucket(metrics.sharpe_ratio);
        let drawdown = DrawdownLevel::bucket(metrics.max_drawdown);
        let qualitative = RiskBreakdown {
            volatility,
            sharpe,
            drawdown,
            overall: RiskLevel::overall(volatility, drawdown),
        };

        RiskReport {
            scope,
            symbols: request.symbols(),
            window: request.window,
            metrics,
            qualitative,
        }
    }
}

/// Beta against a benchmark over date-aligned daily returns. `None` is a
/// reporting decision, never an error: misaligned histories or a flat
/// benchmark simply omit the field.
fn compute_beta(asset: &PriceSeries, benchmark: &PriceSeries) -> Option<f64> {
    let aligned = match aligned_returns(&[asset.clone(), benchmark.clone()]) {
        Ok(aligned) => aligned,
        Err(err) => {
            tracing::warn!(
                benchmark = benchmark.symbol(),
                error = %err,
                "skipping beta, could not align benchmark returns"
            );
            return None;
        },
    };

    let asset_returns = aligned.column(0);
    let benchmark_returns = aligned.column(1);
    let benchmark_variance = stats::sample_variance(&benchmark_returns);
    if benchmark_variance <= f64::EPSILON {
        tracing::warn!(
            benchmark = benchmark.symbol(),
            "skipping beta, benchmark variance is zero"
        );
        return None;
    }

    Some(stats::sample_covariance(&asset_returns, &benchmark_returns) / benchmark_variance)
}
