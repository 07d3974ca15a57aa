//! Monte-Carlo portfolio optimization

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::returns::aligned_returns;
use crate::stats;
use nalgebra::{DMatrix, DVector};
use quant_data::{PriceSeries, Window};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Volatility below this is treated as zero and makes the Sharpe ratio
/// undefined for that candidate.
const ZERO_VOL_EPS: f64 = 1e-12;

/// Risk appetite driving candidate selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskPreference {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for RiskPreference {
    type Err = std::convert::Infallible;

    /// Lenient by contract: anything that is not "low" or "high" selects
    /// the medium policy.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        })
    }
}

impl fmt::Display for RiskPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Selection policy the optimizer ended up applying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    #[serde(rename = "Minimum Volatility")]
    MinimumVolatility,
    #[serde(rename = "Maximum Sharpe Ratio")]
    MaximumSharpe,
    #[serde(rename = "Maximum Return")]
    MaximumReturn,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumVolatility => write!(f, "Minimum Volatility"),
            Self::MaximumSharpe => write!(f, "Maximum Sharpe Ratio"),
            Self::MaximumReturn => write!(f, "Maximum Return"),
        }
    }
}

/// Portfolio optimization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub tickers: Vec<String>,
    #[serde(default)]
    pub risk_preference: RiskPreference,
    /// Minimum annualized return required under the `high` preference
    #[serde(default)]
    pub return_target: Option<f64>,
    #[serde(default = "default_window")]
    pub window: Window,
    /// Upper bound for any single weight, in (0, 1]
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    /// Explicit seed for reproducible sampling; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_window() -> Window {
    Window::years(5)
}

fn default_max_weight() -> f64 {
    1.0
}

impl OptimizationRequest {
    /// Request with default window (5y), medium preference and no cap
    pub fn new(tickers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tickers: tickers.into_iter().map(Into::into).collect(),
            risk_preference: RiskPreference::default(),
            return_target: None,
            window: default_window(),
            max_weight: default_max_weight(),
            seed: None,
        }
    }
}

/// One ticker's share of the selected portfolio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetWeight {
    pub ticker: String,
    pub weight: f64,
}

/// A (return, volatility) point on the sampled frontier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrontierPoint {
    pub expected_return: f64,
    pub volatility: f64,
}

/// Landmark portfolios over the sampled candidate pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficientFrontier {
    pub min_volatility: FrontierPoint,
    pub max_sharpe: FrontierPoint,
    pub max_return: FrontierPoint,
}

/// Selected portfolio plus frontier landmarks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub strategy: Strategy,
    pub risk_preference: RiskPreference,
    pub weights: Vec<AssetWeight>,
    pub expected_annual_return: f64,
    pub expected_annual_volatility: f64,
    /// `None` when the selected candidate has zero volatility
    pub sharpe_ratio: Option<f64>,
    pub frontier: EfficientFrontier,
}

#[derive(Debug, Clone)]
struct Candidate {
    weights: Vec<f64>,
    expected_return: f64,
    volatility: f64,
    sharpe: Option<f64>,
}

impl Candidate {
    fn frontier_point(&self) -> FrontierPoint {
        FrontierPoint {
            expected_return: self.expected_return,
            volatility: self.volatility,
        }
    }
}

/// Monte-Carlo portfolio optimizer
///
/// Samples random candidate weight vectors against the annualized joint
/// return statistics and selects one per the requested risk preference.
#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    config: AnalyticsConfig,
}

impl PortfolioOptimizer {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Validate a request without touching price data
    pub fn validate(&self, request: &OptimizationRequest) -> Result<()> {
        if request.tickers.is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "at least one ticker is required".to_string(),
            ));
        }
        if request.tickers.iter().any(|t| t.trim().is_empty()) {
            return Err(AnalyticsError::InvalidInput(
                "ticker symbols must not be blank".to_string(),
            ));
        }
        if let Some(target) = request.return_target {
            if !target.is_finite() {
                return Err(AnalyticsError::InvalidInput(
                    "return_target must be finite".to_string(),
                ));
            }
        }
        if !request.max_weight.is_finite()
            || request.max_weight <= 0.0
            || request.max_weight > 1.0
        {
            return Err(AnalyticsError::InvalidInput(format!(
                "max_weight must be in (0, 1], got {}",
                request.max_weight
            )));
        }
        // The cap must leave room for a full allocation
        let capacity = request.max_weight * request.tickers.len() as f64;
        if capacity < 1.0 - self.config.weight_tolerance {
            return Err(AnalyticsError::InvalidInput(format!(
                "max_weight {} cannot allocate a full portfolio across {} tickers",
                request.max_weight,
                request.tickers.len()
            )));
        }

        Ok(())
    }

    /// Optimize over the given price series, one per requested ticker in
    /// request order.
    pub fn optimize(
        &self,
        request: &OptimizationRequest,
        series: &[PriceSeries],
    ) -> Result<OptimizationResult> {
        self.validate(request)?;
        if series.len() != request.tickers.len() {
            return Err(AnalyticsError::InvalidInput(format!(
                "expected {} price series, got {}",
                request.tickers.len(),
                series.len()
            )));
        }

        let aligned = aligned_returns(series)?;
        let mu = stats::column_means(aligned.matrix()) * self.config.trading_days;
        let cov = stats::sample_covariance_matrix(aligned.matrix()) * self.config.trading_days;

        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let candidates = self.generate_candidates(&mut rng, &mu, &cov, request);
        if candidates.is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "candidate_samples must be greater than 0".to_string(),
            ));
        }
        tracing::debug!(
            samples = candidates.len(),
            assets = request.tickers.len(),
            "sampled candidate portfolios"
        );

        let frontier = EfficientFrontier {
            min_volatility: best_by(&candidates, |c, best| c.volatility < best.volatility)
                .frontier_point(),
            max_sharpe: best_by(&candidates, |c, best| c.sharpe > best.sharpe).frontier_point(),
            max_return: best_by(&candidates, |c, best| {
                c.expected_return > best.expected_return
            })
            .frontier_point(),
        };

        let (selected, strategy) = match request.risk_preference {
            RiskPreference::Low => (
                best_by(&candidates, |c, best| c.volatility < best.volatility),
                Strategy::MinimumVolatility,
            ),
            RiskPreference::High => {
                let selected = if let Some(target) = request.return_target {
                    let eligible: Vec<&Candidate> = candidates
                        .iter()
                        .filter(|c| c.expected_return >= target)
                        .collect();
                    if eligible.is_empty() {
                        return Err(AnalyticsError::UnsatisfiableConstraint {
                            target,
                            sampled: candidates.len(),
                        });
                    }
                    let mut best = eligible[0];
                    for c in &eligible[1..] {
                        if c.expected_return > best.expected_return {
                            best = c;
                        }
                    }
                    best
                } else {
                    best_by(&candidates, |c, best| {
                        c.expected_return > best.expected_return
                    })
                };
                (selected, Strategy::MaximumReturn)
            },
            RiskPreference::Medium => (
                // Option ranks None below any value, so degenerate
                // candidates never win unless every candidate is degenerate
                best_by(&candidates, |c, best| c.sharpe > best.sharpe),
                Strategy::MaximumSharpe,
            ),
        };

        let weights = request
            .tickers
            .iter()
            .zip(&selected.weights)
            .map(|(ticker, weight)| AssetWeight {
                ticker: ticker.clone(),
                weight: *weight,
            })
            .collect();

        Ok(OptimizationResult {
            strategy,
            risk_preference: request.risk_preference,
            weights,
            expected_annual_return: selected.expected_return,
            expected_annual_volatility: selected.volatility,
            sharpe_ratio: selected.sharpe,
            frontier,
        })
    }

    fn generate_candidates(
        &self,
        rng: &mut StdRng,
        mu: &DVector<f64>,
        cov: &DMatrix<f64>,
        request: &OptimizationRequest,
    ) -> Vec<Candidate> {
        let n_assets = request.tickers.len();
        let mut candidates = Vec::with_capacity(self.config.candidate_samples);
        for _ in 0..self.config.candidate_samples {
            let weights = sample_weights(
                rng,
                n_assets,
                request.max_weight,
                self.config.weight_tolerance,
            );
            let w = DVector::from_vec(weights.clone());
            let expected_return = mu.dot(&w);
            let volatility = stats::portfolio_volatility(&w, cov);
            let sharpe = if volatility > ZERO_VOL_EPS {
                Some((expected_return - self.config.risk_free_rate) / volatility)
            } else {
                None
            };
            candidates.push(Candidate {
                weights,
                expected_return,
                volatility,
                sharpe,
            });
        }
        candidates
    }
}

/// First candidate that no later candidate strictly beats
fn best_by<F>(candidates: &[Candidate], better: F) -> &Candidate
where
    F: Fn(&Candidate, &Candidate) -> bool,
{
    let mut best = &candidates[0];
    for candidate in &candidates[1..] {
        if better(candidate, best) {
            best = candidate;
        }
    }
    best
}

/// Draw one weight vector: uniform draws normalized to sum 1, with any
/// excess over `cap` moved onto the remaining headroom in a single pro-rata
/// pass. Feasibility (`cap * n >= 1`) guarantees the excess always fits.
fn sample_weights(rng: &mut StdRng, n: usize, cap: f64, tolerance: f64) -> Vec<f64> {
    let mut weights: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
    let total: f64 = weights.iter().sum();
    if total <= tolerance {
        let equal = 1.0 / n as f64;
        weights.iter_mut().for_each(|w| *w = equal);
    } else {
        weights.iter_mut().for_each(|w| *w /= total);
    }

    if cap < 1.0 {
        let mut excess = 0.0;
        let mut headroom = 0.0;
        for w in &weights {
            if *w > cap {
                excess += *w - cap;
            } else {
                headroom += cap - *w;
            }
        }
        if excess > 0.0 && headroom > 0.0 {
            let scale = excess / headroom;
            for w in &mut weights {
                if *w > cap {
                    *w = cap;
                } else {
                    *w += (cap - *w) * scale;
                }
            }
        }
        for w in &mut weights {
            if *w > cap {
                *w = cap;
            }
        }
    }

    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use quant_data::PriceBar;

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i64::from(n))
    }

    fn series_from_returns(symbol: &str, start: f64, returns: &[f64]) -> PriceSeries {
        let mut closes = vec![start];
        for r in returns {
            let next = closes[closes.len() - 1] * (1.0 + r);
            closes.push(next);
        }
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar::new(day(i as u32), *c, *c, *c, *c, 1_000).unwrap())
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    fn cycle_returns(cycle: &[f64], len: usize, phase: usize) -> Vec<f64> {
        (0..len).map(|i| cycle[(i + phase) % cycle.len()]).collect()
    }

    /// Two assets with identical return distributions but shifted phase:
    /// equal means, equal variances, correlation strictly between -1 and 1.
    fn symmetric_pair() -> Vec<PriceSeries> {
        let cycle = [0.02, 0.0, -0.01];
        vec![
            series_from_returns("T1", 100.0, &cycle_returns(&cycle, 30, 0)),
            series_from_returns("T2", 80.0, &cycle_returns(&cycle, 30, 1)),
        ]
    }

    fn optimizer(samples: usize) -> PortfolioOptimizer {
        let config = AnalyticsConfig::builder()
            .candidate_samples(samples)
            .build()
            .unwrap();
        PortfolioOptimizer::new(config)
    }

    #[test]
    fn test_sample_weights_sum_and_cap() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let weights = sample_weights(&mut rng, 3, 0.6, 1e-6);
            let total: f64 = weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-6);
            for w in &weights {
                assert!(*w >= 0.0);
                assert!(*w <= 0.6 + 1e-6);
            }
        }
    }

    #[test]
    fn test_sample_weights_tight_cap() {
        // cap * n barely over 1; everything gets pushed close to the cap
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let weights = sample_weights(&mut rng, 2, 0.51, 1e-6);
            let total: f64 = weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-6);
            assert!(weights.iter().all(|w| *w <= 0.51 + 1e-6));
        }
    }

    #[test]
    fn test_validate_rejects_empty_tickers() {
        let request = OptimizationRequest::new(Vec::<String>::new());
        let result = optimizer(100).validate(&request);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_bad_max_weight() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.max_weight = 0.0;
        assert!(optimizer(100).validate(&request).is_err());

        request.max_weight = 1.5;
        assert!(optimizer(100).validate(&request).is_err());
    }

    #[test]
    fn test_validate_rejects_infeasible_cap() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.max_weight = 0.3; // 2 * 0.3 < 1, cannot sum to 1
        let result = optimizer(100).validate(&request);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_selected_weights_sum_to_one() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.seed = Some(42);
        request.max_weight = 0.7;
        let result = optimizer(2_000).optimize(&request, &symmetric_pair()).unwrap();

        let total: f64 = result.weights.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-6);
        for w in &result.weights {
            assert!(w.weight <= 0.7 + 1e-6);
        }
    }

    #[test]
    fn test_low_preference_picks_pool_minimum_volatility() {
        let series = symmetric_pair();
        let opt = optimizer(1_000);
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.risk_preference = RiskPreference::Low;
        request.seed = Some(9);

        let result = opt.optimize(&request, &series).unwrap();
        assert_eq!(result.strategy, Strategy::MinimumVolatility);

        // Regenerate the identical candidate pool and check dominance
        let aligned = aligned_returns(&series).unwrap();
        let mu = stats::column_means(aligned.matrix()) * opt.config.trading_days;
        let cov = stats::sample_covariance_matrix(aligned.matrix()) * opt.config.trading_days;
        let mut rng = StdRng::seed_from_u64(9);
        let pool = opt.generate_candidates(&mut rng, &mu, &cov, &request);

        for candidate in &pool {
            assert!(result.expected_annual_volatility <= candidate.volatility + 1e-12);
        }
        assert_eq!(
            result.frontier.min_volatility.volatility,
            result.expected_annual_volatility
        );
    }

    #[test]
    fn test_medium_preference_on_symmetric_assets_is_balanced() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.seed = Some(4);
        let result = optimizer(10_000)
            .optimize(&request, &symmetric_pair())
            .unwrap();

        assert_eq!(result.strategy, Strategy::MaximumSharpe);
        // Equal statistics make 50/50 optimal; sampling lands near it
        for w in &result.weights {
            assert!((w.weight - 0.5).abs() < 0.05, "weight {} off", w.weight);
        }
        assert!(result.sharpe_ratio.is_some());
    }

    #[test]
    fn test_high_preference_with_reachable_target() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.risk_preference = RiskPreference::High;
        request.return_target = Some(0.1);
        request.seed = Some(5);

        let result = optimizer(2_000).optimize(&request, &symmetric_pair()).unwrap();
        assert_eq!(result.strategy, Strategy::MaximumReturn);
        assert!(result.expected_annual_return >= 0.1);
    }

    #[test]
    fn test_high_preference_with_unreachable_target() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.risk_preference = RiskPreference::High;
        request.return_target = Some(50.0); // 5000% annualized
        request.seed = Some(5);

        let result = optimizer(2_000).optimize(&request, &symmetric_pair());
        match result {
            Err(AnalyticsError::UnsatisfiableConstraint { target, sampled }) => {
                assert!((target - 50.0).abs() < f64::EPSILON);
                assert_eq!(sampled, 2_000);
            },
            other => panic!("expected UnsatisfiableConstraint, got {other:?}"),
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.seed = Some(77);
        let opt = optimizer(1_000);
        let series = symmetric_pair();

        let a = opt.optimize(&request, &series).unwrap();
        let b = opt.optimize(&request, &series).unwrap();
        assert_eq!(a, b);

        request.seed = Some(78);
        let c = opt.optimize(&request, &series).unwrap();
        assert!(
            a.weights
                .iter()
                .zip(&c.weights)
                .any(|(x, y)| (x.weight - y.weight).abs() > 1e-9)
        );
    }

    #[test]
    fn test_degenerate_history_reports_null_sharpe() {
        // Constant closes: zero variance everywhere, volatility 0
        let flat = vec![
            series_from_returns("T1", 100.0, &[0.0; 20]),
            series_from_returns("T2", 50.0, &[0.0; 20]),
        ];
        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.seed = Some(1);

        let result = optimizer(500).optimize(&request, &flat).unwrap();
        assert!(result.sharpe_ratio.is_none());
        assert!(result.expected_annual_volatility.abs() < 1e-12);
    }

    #[test]
    fn test_risk_preference_parsing_is_lenient() {
        assert_eq!("low".parse::<RiskPreference>().unwrap(), RiskPreference::Low);
        assert_eq!(
            "HIGH".parse::<RiskPreference>().unwrap(),
            RiskPreference::High
        );
        assert_eq!(
            "aggressive".parse::<RiskPreference>().unwrap(),
            RiskPreference::Medium
        );
        assert_eq!("".parse::<RiskPreference>().unwrap(), RiskPreference::Medium);
    }

    #[test]
    fn test_series_count_must_match_tickers() {
        let request = OptimizationRequest::new(["T1", "T2"]);
        let series = symmetric_pair();
        let result = optimizer(100).optimize(&request, &series[..1]);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }
}
