//! Quantitative analytics over historical price series
//!
//! Four pure components cover the core analyses:
//!
//! - [`PortfolioOptimizer`]: Monte-Carlo candidate sampling with selection
//!   by risk preference plus efficient-frontier landmarks
//! - [`RiskAssessor`]: volatility, Sharpe, drawdown, VaR and beta with
//!   qualitative bucketing, for one asset or a weighted basket
//! - [`TechnicalSignalEngine`]: SMA/RSI/MACD/Bollinger/ADX rule tables
//!   aggregated into one recommendation
//! - [`MarketScenarioSimulator`]: stochastic price paths under a fixed
//!   macro-scenario catalogue
//!
//! [`AnalyticsEngine`] fronts all four behind a
//! [`PriceHistoryProvider`](quant_data::PriceHistoryProvider), fetching each
//! request's history once and running the numeric work on blocking tasks.
//!
//! ```ignore
//! use quant_analytics::{AnalyticsConfig, AnalyticsEngine, OptimizationRequest};
//! use quant_data::YahooProvider;
//! use std::sync::Arc;
//!
//! let engine = AnalyticsEngine::new(Arc::new(YahooProvider::new()), AnalyticsConfig::default())?;
//! let result = engine
//!     .optimize_portfolio(OptimizationRequest::new(["AAPL", "MSFT", "NVDA"]))
//!     .await?;
//! println!("{} -> {:?}", result.strategy, result.weights);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod returns;
pub mod risk;
pub mod signals;
pub mod simulation;
mod stats;

pub use config::{AnalyticsConfig, AnalyticsConfigBuilder};
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
pub use optimizer::{
    EfficientFrontier, OptimizationRequest, OptimizationResult, PortfolioOptimizer, RiskPreference,
};
pub use returns::{ReturnSeries, daily_returns};
pub use risk::{RiskAssessor, RiskReport, RiskRequest, RiskScope};
pub use signals::{
    Indicator, Recommendation, SignalRequest, SignalSet, TechnicalSignalEngine,
};
pub use simulation::{
    MarketScenarioSimulator, Scenario, ScenarioReport, SimulationRequest,
};
