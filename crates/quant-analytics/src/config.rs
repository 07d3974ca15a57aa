//! Configuration for analytics operations

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the analytics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Annual risk-free rate used in Sharpe ratios
    pub risk_free_rate: f64,

    /// Trading days per year used for annualization
    pub trading_days: f64,

    /// Number of random candidate portfolios the optimizer samples
    pub candidate_samples: usize,

    /// Number of independent price paths per simulated ticker
    pub simulation_paths: usize,

    /// Default number of simulation steps when a request omits it
    pub default_time_steps: usize,

    /// Benchmark symbol used for beta (broad market index)
    pub benchmark_symbol: String,

    /// Floating tolerance for weight-sum checks
    pub weight_tolerance: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            trading_days: 252.0,
            candidate_samples: 10_000,
            simulation_paths: 5,
            default_time_steps: 30,
            benchmark_symbol: "^GSPC".to_string(),
            weight_tolerance: 1e-6,
        }
    }
}

impl AnalyticsConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalyticsConfigBuilder {
        AnalyticsConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(AnalyticsError::InvalidInput(
                "risk_free_rate must be finite".to_string(),
            ));
        }
        if !self.trading_days.is_finite() || self.trading_days <= 0.0 {
            return Err(AnalyticsError::InvalidInput(
                "trading_days must be positive".to_string(),
            ));
        }
        if self.candidate_samples == 0 {
            return Err(AnalyticsError::InvalidInput(
                "candidate_samples must be greater than 0".to_string(),
            ));
        }
        if self.simulation_paths == 0 {
            return Err(AnalyticsError::InvalidInput(
                "simulation_paths must be greater than 0".to_string(),
            ));
        }
        if self.default_time_steps == 0 {
            return Err(AnalyticsError::InvalidInput(
                "default_time_steps must be greater than 0".to_string(),
            ));
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "benchmark_symbol must not be empty".to_string(),
            ));
        }
        if !self.weight_tolerance.is_finite() || self.weight_tolerance <= 0.0 {
            return Err(AnalyticsError::InvalidInput(
                "weight_tolerance must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for AnalyticsConfig
#[derive(Debug, Default)]
pub struct AnalyticsConfigBuilder {
    risk_free_rate: Option<f64>,
    trading_days: Option<f64>,
    candidate_samples: Option<usize>,
    simulation_paths: Option<usize>,
    default_time_steps: Option<usize>,
    benchmark_symbol: Option<String>,
    weight_tolerance: Option<f64>,
}

impl AnalyticsConfigBuilder {
    /// Set the annual risk-free rate
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }

    /// Set the trading days per year
    pub fn trading_days(mut self, days: f64) -> Self {
        self.trading_days = Some(days);
        self
    }

    /// Set the optimizer candidate sample count
    pub fn candidate_samples(mut self, samples: usize) -> Self {
        self.candidate_samples = Some(samples);
        self
    }

    /// Set the number of simulation paths per ticker
    pub fn simulation_paths(mut self, paths: usize) -> Self {
        self.simulation_paths = Some(paths);
        self
    }

    /// Set the default simulation step count
    pub fn default_time_steps(mut self, steps: usize) -> Self {
        self.default_time_steps = Some(steps);
        self
    }

    /// Set the beta benchmark symbol
    pub fn benchmark_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.benchmark_symbol = Some(symbol.into());
        self
    }

    /// Set the weight-sum floating tolerance
    pub fn weight_tolerance(mut self, tolerance: f64) -> Self {
        self.weight_tolerance = Some(tolerance);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalyticsConfig> {
        let defaults = AnalyticsConfig::default();

        let config = AnalyticsConfig {
            risk_free_rate: self.risk_free_rate.unwrap_or(defaults.risk_free_rate),
            trading_days: self.trading_days.unwrap_or(defaults.trading_days),
            candidate_samples: self.candidate_samples.unwrap_or(defaults.candidate_samples),
            simulation_paths: self.simulation_paths.unwrap_or(defaults.simulation_paths),
            default_time_steps: self.default_time_steps.unwrap_or(defaults.default_time_steps),
            benchmark_symbol: self.benchmark_symbol.unwrap_or(defaults.benchmark_symbol),
            weight_tolerance: self.weight_tolerance.unwrap_or(defaults.weight_tolerance),
        };

        config.validate()?;
        Ok(config)
    }
}
