//! Scenario-driven stochastic price simulation

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::returns::daily_returns;
use crate::stats;
use chrono::{DateTime, Utc};
use quant_data::{PriceSeries, Window};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro scenario shaping drift, shock width and liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Baseline,
    RateHike,
    BullMarket,
    BearMarket,
    MarketCrash,
}

/// Fixed per-scenario parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioSpec {
    pub volatility_factor: f64,
    pub sentiment_bias: f64,
    pub liquidity_factor: f64,
}

impl Scenario {
    pub fn spec(&self) -> ScenarioSpec {
        match self {
            Self::Baseline => ScenarioSpec {
                volatility_factor: 1.0,
                sentiment_bias: 0.0,
                liquidity_factor: 1.0,
            },
            Self::RateHike => ScenarioSpec {
                volatility_factor: 1.2,
                sentiment_bias: -0.1,
                liquidity_factor: 0.8,
            },
            Self::BullMarket => ScenarioSpec {
                volatility_factor: 1.1,
                sentiment_bias: 0.2,
                liquidity_factor: 1.2,
            },
            Self::BearMarket => ScenarioSpec {
                volatility_factor: 1.4,
                sentiment_bias: -0.3,
                liquidity_factor: 0.7,
            },
            Self::MarketCrash => ScenarioSpec {
                volatility_factor: 2.0,
                sentiment_bias: -0.5,
                liquidity_factor: 0.4,
            },
        }
    }
}

impl FromStr for Scenario {
    type Err = std::convert::Infallible;

    /// Unrecognized names fall back to the baseline scenario
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "rate_hike" => Self::RateHike,
            "bull_market" => Self::BullMarket,
            "bear_market" => Self::BearMarket,
            "market_crash" => Self::MarketCrash,
            _ => Self::Baseline,
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::RateHike => write!(f, "rate_hike"),
            Self::BullMarket => write!(f, "bull_market"),
            Self::BearMarket => write!(f, "bear_market"),
            Self::MarketCrash => write!(f, "market_crash"),
        }
    }
}

/// Scenario simulation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub tickers: Vec<String>,
    #[serde(default)]
    pub scenario: Scenario,
    /// Simulated market participants; reported as-is, never sampled
    #[serde(default = "default_agent_count")]
    pub agent_count: usize,
    /// Steps per path; the configured default applies when absent
    #[serde(default)]
    pub time_steps: Option<usize>,
    #[serde(default = "default_window")]
    pub window: Window,
    /// Explicit seed for reproducible paths; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_agent_count() -> usize {
    1_000
}

fn default_window() -> Window {
    Window::months(6)
}

impl SimulationRequest {
    pub fn new(tickers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tickers: tickers.into_iter().map(Into::into).collect(),
            scenario: Scenario::default(),
            agent_count: default_agent_count(),
            time_steps: None,
            window: default_window(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

/// Deterministic behavioral notes derived from the scenario and the trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraderBehavior {
    pub value_investors: String,
    pub momentum_traders: String,
    pub day_traders: String,
    pub institutions: String,
}

impl TraderBehavior {
    fn derive(spec: &ScenarioSpec, current_price: f64, average_projected: f64, volatility_projection: f64) -> Self {
        let value_investors = if average_projected < current_price {
            "accumulating while projections sit below current levels".to_string()
        } else {
            "waiting for a better entry point".to_string()
        };
        let momentum_traders = if average_projected > current_price {
            "following the projected upward move".to_string()
        } else {
            "rotating out ahead of the projected decline".to_string()
        };
        let day_traders = if volatility_projection >= 2.5 {
            "trading heavily on wide intraday swings".to_string()
        } else if volatility_projection >= 1.0 {
            "active across normal intraday ranges".to_string()
        } else {
            "scalping narrow ranges on light volatility".to_string()
        };
        let institutions = if spec.sentiment_bias > 0.0 {
            "adding exposure in line with positive sentiment".to_string()
        } else if spec.sentiment_bias < 0.0 {
            "trimming exposure against negative sentiment".to_string()
        } else {
            "rebalancing around neutral sentiment".to_string()
        };

        Self {
            value_investors,
            momentum_traders,
            day_traders,
            institutions,
        }
    }
}

/// Simulation outcome for one ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSimulation {
    pub ticker: String,
    pub current_price: f64,
    /// Each path starts at `current_price` and has `time_steps + 1` points
    pub price_paths: Vec<Vec<f64>>,
    pub average_projected_price: f64,
    pub price_range: PriceRange,
    pub probability_of_increase: f64,
    /// Scaled daily volatility under the scenario, as a percentage
    pub volatility_projection: f64,
    pub liquidity_impact: String,
    pub scenario_impact: String,
    pub trader_behavior: TraderBehavior,
}

/// Full scenario report across all requested tickers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub parameters: ScenarioSpec,
    pub agent_count: usize,
    pub time_steps: usize,
    pub generated_at: DateTime<Utc>,
    pub tickers: Vec<TickerSimulation>,
}

/// Stochastic price-path simulator over a fixed scenario catalogue
#[derive(Debug, Clone)]
pub struct MarketScenarioSimulator {
    config: AnalyticsConfig,
}

impl MarketScenarioSimulator {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, request: &SimulationRequest) -> Result<()> {
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
        if request.agent_count == 0 {
            return Err(AnalyticsError::InvalidInput(
                "agent_count must be positive".to_string(),
            ));
        }
        if request.time_steps == Some(0) {
            return Err(AnalyticsError::InvalidInput(
                "time_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Simulate the scenario over the given price series, one per requested
    /// ticker in request order.
    pub fn simulate(
        &self,
        request: &SimulationRequest,
        series: &[PriceSeries],
    ) -> Result<ScenarioReport> {
        self.validate(request)?;
        if series.len() != request.tickers.len() {
            return Err(AnalyticsError::InvalidInput(format!(
                "expected {} price series, got {}",
                request.tickers.len(),
                series.len()
            )));
        }

        let spec = request.scenario.spec();
        let time_steps = request.time_steps.unwrap_or(self.config.default_time_steps);
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut tickers = Vec::with_capacity(request.tickers.len());
        for (ticker, history) in request.tickers.iter().zip(series) {
            tickers.push(self.simulate_ticker(ticker, history, &spec, time_steps, &mut rng)?);
        }
        tracing::debug!(
            scenario = %request.scenario,
            tickers = tickers.len(),
            time_steps,
            "simulated scenario paths"
        );

        Ok(ScenarioReport {
            scenario: request.scenario,
            parameters: spec,
            agent_count: request.agent_count,
            time_steps,
            generated_at: Utc::now(),
            tickers,
        })
    }

    fn simulate_ticker(
        &self,
        ticker: &str,
        history: &PriceSeries,
        spec: &ScenarioSpec,
        time_steps: usize,
        rng: &mut StdRng,
    ) -> Result<TickerSimulation> {
        let returns = daily_returns(history)?;
        let daily_volatility = stats::sample_std(returns.values());
        let current_price = history.last_close();

        // Drift and shock width are fixed per ticker, scaled off the last
        // close rather than the running path price
        let drift = spec.sentiment_bias * current_price * 0.01;
        let shock_sigma = daily_volatility * spec.volatility_factor * current_price * 0.01;
        let shocks = Normal::new(0.0, shock_sigma)
            .map_err(|e| AnalyticsError::InvalidInput(format!("invalid shock width: {e}")))?;

        let mut price_paths = Vec::with_capacity(self.config.simulation_paths);
        for _ in 0..self.config.simulation_paths {
            let mut path = Vec::with_capacity(time_steps + 1);
            path.push(current_price);
            let mut price = current_price;
            for _ in 0..time_steps {
                let shock = shocks.sample(rng);
                price = (price * (1.0 + drift + shock)).max(0.01);
                path.push(price);
            }
            price_paths.push(path);
        }

        let finals: Vec<f64> = price_paths.iter().map(|p| p[p.len() - 1]).collect();
        let average_projected_price = stats::mean(&finals);
        let low = finals.iter().copied().fold(f64::INFINITY, f64::min);
        let high = finals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let gains = finals.iter().filter(|f| **f > current_price).count();
        let probability_of_increase = gains as f64 / finals.len() as f64;

        let volatility_projection = daily_volatility * spec.volatility_factor * 100.0;
        let liquidity_impact = format!(
            "{:.1}% wider spreads expected",
            (1.0 - spec.liquidity_factor) * 100.0
        );
        let scenario_impact = format!(
            "{:.1}% scenario bias applied",
            spec.sentiment_bias * 100.0
        );
        let trader_behavior = TraderBehavior::derive(
            spec,
            current_price,
            average_projected_price,
            volatility_projection,
        );

        Ok(TickerSimulation {
            ticker: ticker.to_string(),
            current_price,
            price_paths,
            average_projected_price,
            price_range: PriceRange { low, high },
            probability_of_increase,
            volatility_projection,
            liquidity_impact,
            scenario_impact,
            trader_behavior,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quant_data::PriceBar;

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap() + chrono::Duration::days(i64::from(n))
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar::new(day(i as u32), *c, *c, *c, *c, 2_000).unwrap())
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    fn flat_series(symbol: &str, price: f64, bars: usize) -> PriceSeries {
        series(symbol, &vec![price; bars])
    }

    fn simulator() -> MarketScenarioSimulator {
        MarketScenarioSimulator::new(AnalyticsConfig::default())
    }

    fn crash_request(steps: usize) -> SimulationRequest {
        let mut request = SimulationRequest::new(["T1"]);
        request.scenario = Scenario::MarketCrash;
        request.time_steps = Some(steps);
        request.seed = Some(21);
        request
    }

    #[test]
    fn test_scenario_parsing_is_lenient() {
        assert_eq!("market_crash".parse::<Scenario>().unwrap(), Scenario::MarketCrash);
        assert_eq!("Bull_Market".parse::<Scenario>().unwrap(), Scenario::BullMarket);
        assert_eq!("sideways".parse::<Scenario>().unwrap(), Scenario::Baseline);
        assert_eq!("".parse::<Scenario>().unwrap(), Scenario::Baseline);
    }

    #[test]
    fn test_scenario_catalogue() {
        let crash = Scenario::MarketCrash.spec();
        assert!((crash.volatility_factor - 2.0).abs() < f64::EPSILON);
        assert!((crash.sentiment_bias - (-0.5)).abs() < f64::EPSILON);
        assert!((crash.liquidity_factor - 0.4).abs() < f64::EPSILON);

        let baseline = Scenario::Baseline.spec();
        assert!(baseline.sentiment_bias.abs() < f64::EPSILON);
        assert!((baseline.volatility_factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_paths_start_at_current_price_with_full_length() {
        let report = simulator()
            .simulate(&crash_request(20), &[flat_series("T1", 100.0, 10)])
            .unwrap();

        let sim = &report.tickers[0];
        assert_eq!(sim.price_paths.len(), 5);
        for path in &sim.price_paths {
            assert_eq!(path.len(), 21);
            assert!((path[0] - 100.0).abs() < f64::EPSILON);
            assert!(path.iter().all(|p| *p >= 0.01));
        }
    }

    #[test]
    fn test_crash_on_flat_series_halves_each_step() {
        // Zero volatility leaves only the drift: -0.5 * 100 * 0.01 per step
        let report = simulator()
            .simulate(&crash_request(20), &[flat_series("T1", 100.0, 10)])
            .unwrap();

        let sim = &report.tickers[0];
        for path in &sim.price_paths {
            assert!((path[1] - 50.0).abs() < 1e-9);
            assert!((path[2] - 25.0).abs() < 1e-9);
            // The floor catches the path once halving goes below a cent
            assert!((path[20] - 0.01).abs() < f64::EPSILON);
        }
        assert!(sim.probability_of_increase.abs() < f64::EPSILON);
        assert!(sim.price_range.high <= 100.0);
    }

    #[test]
    fn test_bull_drift_on_flat_series_always_gains() {
        let mut request = crash_request(10);
        request.scenario = Scenario::BullMarket;

        let report = simulator()
            .simulate(&request, &[flat_series("T1", 100.0, 10)])
            .unwrap();
        let sim = &report.tickers[0];
        // Drift +0.2% of 100 per step with no shock
        assert!((sim.probability_of_increase - 1.0).abs() < f64::EPSILON);
        assert!(sim.average_projected_price > 100.0);
        assert!(sim.price_range.low > 100.0);
    }

    #[test]
    fn test_unknown_scenario_matches_baseline() {
        let mut named: SimulationRequest = crash_request(10);
        named.scenario = "no_such_scenario".parse().unwrap();
        let mut baseline = crash_request(10);
        baseline.scenario = Scenario::Baseline;

        let history = flat_series("T1", 100.0, 10);
        let a = simulator().simulate(&named, &[history.clone()]).unwrap();
        let b = simulator().simulate(&baseline, &[history]).unwrap();
        assert_eq!(a.tickers, b.tickers);
        assert_eq!(a.parameters, b.parameters);
    }

    #[test]
    fn test_same_seed_reproduces_paths() {
        let history = series("T1", &[100.0, 104.0, 99.0, 103.0, 101.0]);
        let request = crash_request(15);

        let a = simulator().simulate(&request, &[history.clone()]).unwrap();
        let b = simulator().simulate(&request, &[history.clone()]).unwrap();
        assert_eq!(a.tickers, b.tickers);

        let mut reseeded = crash_request(15);
        reseeded.seed = Some(22);
        let c = simulator().simulate(&reseeded, &[history]).unwrap();
        assert_ne!(a.tickers[0].price_paths, c.tickers[0].price_paths);
    }

    #[test]
    fn test_volatility_projection_scales_with_factor() {
        // Returns are exactly [0.1, -0.1]: daily sigma = sqrt(0.02)
        let history = series("T1", &[100.0, 110.0, 99.0]);
        let report = simulator().simulate(&crash_request(5), &[history]).unwrap();

        let expected = (0.02f64).sqrt() * 2.0 * 100.0;
        let sim = &report.tickers[0];
        assert!((sim.volatility_projection - expected).abs() < 1e-9);
        assert_eq!(sim.liquidity_impact, "60.0% wider spreads expected");
        assert_eq!(sim.scenario_impact, "-50.0% scenario bias applied");
    }

    #[test]
    fn test_trader_behavior_follows_trend_and_sentiment() {
        let crash = Scenario::MarketCrash.spec();
        let behavior = TraderBehavior::derive(&crash, 100.0, 40.0, 3.0);
        assert!(behavior.value_investors.contains("accumulating"));
        assert!(behavior.momentum_traders.contains("decline"));
        assert!(behavior.day_traders.contains("heavily"));
        assert!(behavior.institutions.contains("trimming"));

        let bull = Scenario::BullMarket.spec();
        let behavior = TraderBehavior::derive(&bull, 100.0, 120.0, 0.5);
        assert!(behavior.value_investors.contains("waiting"));
        assert!(behavior.momentum_traders.contains("upward"));
        assert!(behavior.day_traders.contains("narrow"));
        assert!(behavior.institutions.contains("adding"));
    }

    #[test]
    fn test_report_carries_request_metadata() {
        let mut request = crash_request(8);
        request.agent_count = 250;
        let report = simulator()
            .simulate(&request, &[flat_series("T1", 50.0, 10)])
            .unwrap();

        assert_eq!(report.agent_count, 250);
        assert_eq!(report.time_steps, 8);
        assert_eq!(report.scenario, Scenario::MarketCrash);
        assert_eq!(report.tickers[0].ticker, "T1");
    }

    #[test]
    fn test_default_time_steps_come_from_config() {
        let mut request = crash_request(1);
        request.time_steps = None;
        let report = simulator()
            .simulate(&request, &[flat_series("T1", 50.0, 10)])
            .unwrap();
        assert_eq!(report.time_steps, 30);
        assert_eq!(report.tickers[0].price_paths[0].len(), 31);
    }

    #[test]
    fn test_validation_rejects_malformed_requests() {
        let sim = simulator();

        let empty = SimulationRequest::new(Vec::<String>::new());
        assert!(matches!(
            sim.validate(&empty),
            Err(AnalyticsError::InvalidInput(_))
        ));

        let mut zero_steps = SimulationRequest::new(["T1"]);
        zero_steps.time_steps = Some(0);
        assert!(sim.validate(&zero_steps).is_err());

        let mut no_agents = SimulationRequest::new(["T1"]);
        no_agents.agent_count = 0;
        assert!(sim.validate(&no_agents).is_err());

        let request = SimulationRequest::new(["T1", "T2"]);
        let result = sim.simulate(&request, &[flat_series("T1", 100.0, 10)]);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_single_bar_history_is_data_unavailable() {
        let result = simulator().simulate(&crash_request(5), &[flat_series("T1", 100.0, 1)]);
        assert!(matches!(
            result,
            Err(AnalyticsError::DataUnavailable { .. })
        ));
    }
}
