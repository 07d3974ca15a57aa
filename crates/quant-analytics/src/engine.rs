//! Async facade over the analytics components
//!
//! The engine owns the provider boundary: every operation validates its
//! request, fetches all needed history up front, then hands the pure
//! computation to a blocking worker so request handling stays responsive.

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::optimizer::{OptimizationRequest, OptimizationResult, PortfolioOptimizer};
use crate::risk::{RiskAssessor, RiskReport, RiskRequest, RiskScope};
use crate::signals::{SignalRequest, SignalSet, TechnicalSignalEngine};
use crate::simulation::{MarketScenarioSimulator, ScenarioReport, SimulationRequest};
use quant_data::{PriceHistoryProvider, PriceSeries, Window};
use std::sync::Arc;

/// Entry point for all four analytics operations
pub struct AnalyticsEngine {
    provider: Arc<dyn PriceHistoryProvider>,
    config: AnalyticsConfig,
    optimizer: PortfolioOptimizer,
    risk: RiskAssessor,
    signals: TechnicalSignalEngine,
    simulator: MarketScenarioSimulator,
}

impl AnalyticsEngine {
    pub fn new(provider: Arc<dyn PriceHistoryProvider>, config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            optimizer: PortfolioOptimizer::new(config.clone()),
            risk: RiskAssessor::new(config.clone()),
            signals: TechnicalSignalEngine::new(),
            simulator: MarketScenarioSimulator::new(config.clone()),
            provider,
            config,
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Monte-Carlo portfolio optimization over the requested tickers
    pub async fn optimize_portfolio(
        &self,
        request: OptimizationRequest,
    ) -> Result<OptimizationResult> {
        self.optimizer.validate(&request)?;
        tracing::info!(
            tickers = ?request.tickers,
            preference = %request.risk_preference,
            "optimizing portfolio"
        );

        let series = self.fetch_all(&request.tickers, request.window).await?;
        let optimizer = self.optimizer.clone();
        tokio::task::spawn_blocking(move || optimizer.optimize(&request, &series))
            .await
            .map_err(|e| AnalyticsError::Task(e.to_string()))?
    }

    /// Single-asset or portfolio risk assessment
    pub async fn assess_risk(&self, request: RiskRequest) -> Result<RiskReport> {
        let scope = self.risk.validate(&request)?;
        let symbols = request.symbols();
        tracing::info!(symbols = ?symbols, scope = ?scope, "assessing risk");

        let series = self.fetch_all(&symbols, request.window).await?;
        // The benchmark is opportunistic; losing it costs the beta field only
        let benchmark = match scope {
            RiskScope::Single => self.fetch_benchmark(request.window).await,
            RiskScope::Portfolio => None,
        };

        let assessor = self.risk.clone();
        tokio::task::spawn_blocking(move || assessor.assess(&request, &series, benchmark.as_ref()))
            .await
            .map_err(|e| AnalyticsError::Task(e.to_string()))?
    }

    /// Technical indicator signals for one ticker
    pub async fn compute_signals(&self, request: SignalRequest) -> Result<SignalSet> {
        self.signals.validate(&request)?;
        tracing::info!(ticker = %request.ticker, indicators = ?request.indicators, "computing signals");

        let history = self.provider.history(&request.ticker, request.window).await?;
        let engine = self.signals;
        tokio::task::spawn_blocking(move || engine.compute(&request, &history))
            .await
            .map_err(|e| AnalyticsError::Task(e.to_string()))?
    }

    /// Stochastic scenario simulation over the requested tickers
    pub async fn simulate_scenario(&self, request: SimulationRequest) -> Result<ScenarioReport> {
        self.simulator.validate(&request)?;
        tracing::info!(
            tickers = ?request.tickers,
            scenario = %request.scenario,
            "simulating scenario"
        );

        let series = self.fetch_all(&request.tickers, request.window).await?;
        let simulator = self.simulator.clone();
        tokio::task::spawn_blocking(move || simulator.simulate(&request, &series))
            .await
            .map_err(|e| AnalyticsError::Task(e.to_string()))?
    }

    /// Fetch every symbol's history concurrently, failing on the first error
    async fn fetch_all(&self, symbols: &[String], window: Window) -> Result<Vec<PriceSeries>> {
        let fetches = symbols
            .iter()
            .map(|symbol| self.provider.history(symbol, window));
        let series = futures::future::try_join_all(fetches).await?;
        Ok(series)
    }

    async fn fetch_benchmark(&self, window: Window) -> Option<PriceSeries> {
        match self
            .provider
            .history(&self.config.benchmark_symbol, window)
            .await
        {
            Ok(series) => Some(series),
            Err(err) => {
                tracing::warn!(
                    benchmark = %self.config.benchmark_symbol,
                    error = %err,
                    "benchmark history unavailable, beta will be omitted"
                );
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::RiskPreference;
    use crate::signals::{Indicator, Recommendation, SignalDirection};
    use crate::simulation::Scenario;
    use chrono::{DateTime, TimeZone, Utc};
    use quant_data::{MarketDataError, MemoryProvider, PriceBar};

    mockall::mock! {
        Provider {}

        #[async_trait::async_trait]
        impl PriceHistoryProvider for Provider {
            async fn history(&self, symbol: &str, window: Window) -> quant_data::Result<PriceSeries>;
        }
    }

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i64::from(n))
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar::new(day(i as u32), *c, *c, *c, *c, 8_000).unwrap())
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    fn wavy_closes(start: f64, len: usize, phase: usize) -> Vec<f64> {
        let cycle = [0.02, 0.0, -0.01];
        let mut closes = vec![start];
        for i in 0..len {
            let r = cycle[(i + phase) % cycle.len()];
            closes.push(closes[i] * (1.0 + r));
        }
        closes
    }

    fn engine_over(provider: MemoryProvider) -> AnalyticsEngine {
        let config = AnalyticsConfig::builder()
            .candidate_samples(500)
            .build()
            .unwrap();
        AnalyticsEngine::new(Arc::new(provider), config).unwrap()
    }

    #[tokio::test]
    async fn test_optimize_portfolio_end_to_end() {
        let provider = MemoryProvider::with_series([
            series("T1", &wavy_closes(100.0, 30, 0)),
            series("T2", &wavy_closes(80.0, 30, 1)),
        ]);
        let engine = engine_over(provider);

        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.seed = Some(3);
        request.risk_preference = RiskPreference::Low;
        let result = engine.optimize_portfolio(request).await.unwrap();

        assert_eq!(result.weights.len(), 2);
        let total: f64 = result.weights.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(result.expected_annual_volatility >= 0.0);
    }

    #[tokio::test]
    async fn test_missing_symbol_is_data_unavailable() {
        let provider = MemoryProvider::with_series([series("T1", &wavy_closes(100.0, 30, 0))]);
        let engine = engine_over(provider);

        let mut request = OptimizationRequest::new(["T1", "T2"]);
        request.seed = Some(3);
        let result = engine.optimize_portfolio(request).await;
        match result {
            Err(AnalyticsError::DataUnavailable { symbol, .. }) => assert_eq!(symbol, "T2"),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_risk_report_without_benchmark_omits_beta() {
        // No ^GSPC series loaded: the fetch fails and beta is dropped
        let provider = MemoryProvider::with_series([series("T1", &wavy_closes(100.0, 30, 0))]);
        let engine = engine_over(provider);

        let report = engine.assess_risk(RiskRequest::single("T1")).await.unwrap();
        assert!(report.metrics.beta.is_none());
        assert!(report.metrics.annualized_volatility >= 0.0);
        assert!(report.metrics.max_drawdown <= 0.0);
    }

    #[tokio::test]
    async fn test_risk_report_with_benchmark_computes_beta() {
        let provider = MemoryProvider::with_series([
            series("T1", &wavy_closes(100.0, 30, 0)),
            series("^GSPC", &wavy_closes(4000.0, 30, 0)),
        ]);
        let engine = engine_over(provider);

        let report = engine.assess_risk(RiskRequest::single("T1")).await.unwrap();
        // Identical return series against the benchmark: beta is 1
        let beta = report.metrics.beta.unwrap();
        assert!((beta - 1.0).abs() < 1e-9, "beta {beta}");
    }

    #[tokio::test]
    async fn test_portfolio_risk_skips_benchmark_fetch() {
        let mut provider = MockProvider::new();
        provider
            .expect_history()
            .withf(|symbol, _| symbol == "T1" || symbol == "T2")
            .returning(|symbol, _| {
                let closes = wavy_closes(100.0, 30, 0);
                Ok(series(symbol, &closes))
            });
        // No expectation for ^GSPC: a benchmark fetch would panic the mock

        let engine = AnalyticsEngine::new(Arc::new(provider), AnalyticsConfig::default()).unwrap();
        let request = RiskRequest::portfolio(["T1", "T2"], [0.5, 0.5]);
        let report = engine.assess_risk(request).await.unwrap();
        assert!(report.metrics.beta.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_propagates_with_kind() {
        let mut provider = MockProvider::new();
        provider.expect_history().returning(|symbol, _| {
            Err(MarketDataError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "upstream outage".to_string(),
            })
        });

        let engine = AnalyticsEngine::new(Arc::new(provider), AnalyticsConfig::default()).unwrap();
        let result = engine.compute_signals(SignalRequest::new("T1")).await;
        assert!(matches!(
            result,
            Err(AnalyticsError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_compute_signals_end_to_end() {
        let mut closes = vec![100.0, 117.0, 114.0];
        closes.extend(std::iter::repeat(114.0).take(12));
        let provider = MemoryProvider::with_series([series("T1", &closes)]);
        let engine = engine_over(provider);

        let mut request = SignalRequest::new("T1");
        request.indicators = vec![Indicator::Rsi];
        let set = engine.compute_signals(request).await.unwrap();

        assert_eq!(set.recommendation, Recommendation::StrongSell);
        assert_eq!(set.signals[0].direction, SignalDirection::Sell);
    }

    #[tokio::test]
    async fn test_simulate_scenario_end_to_end() {
        let provider = MemoryProvider::with_series([series("T1", &[100.0; 10])]);
        let engine = engine_over(provider);

        let mut request = SimulationRequest::new(["T1"]);
        request.scenario = Scenario::MarketCrash;
        request.time_steps = Some(6);
        request.seed = Some(11);
        let report = engine.simulate_scenario(request).await.unwrap();

        assert_eq!(report.tickers.len(), 1);
        let sim = &report.tickers[0];
        assert_eq!(sim.price_paths.len(), 5);
        assert!((sim.price_paths[0][1] - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_fetching() {
        // The mock has no expectations, so any fetch would panic
        let provider = MockProvider::new();
        let engine = AnalyticsEngine::new(Arc::new(provider), AnalyticsConfig::default()).unwrap();

        let result = engine
            .optimize_portfolio(OptimizationRequest::new(Vec::<String>::new()))
            .await;
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }
}
