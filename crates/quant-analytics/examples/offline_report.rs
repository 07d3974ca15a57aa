//! Offline analytics walkthrough over synthetic price fixtures
//!
//! Run with: cargo run --example offline_report -p quant-analytics

use chrono::{DateTime, TimeZone, Utc};
use quant_analytics::optimizer::RiskPreference;
use quant_analytics::risk::RiskRequest;
use quant_analytics::signals::SignalRequest;
use quant_analytics::simulation::{Scenario, SimulationRequest};
use quant_analytics::{AnalyticsConfig, AnalyticsEngine, OptimizationRequest};
use quant_data::{MemoryProvider, PriceBar, PriceSeries};
use std::sync::Arc;

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap() + chrono::Duration::days(i64::from(n))
}

/// Deterministic daily closes built from a repeating return cycle
fn fixture(symbol: &str, start: f64, cycle: &[f64], bars: usize) -> PriceSeries {
    let mut close = start;
    let mut series = Vec::with_capacity(bars);
    for i in 0..bars {
        if i > 0 {
            close *= 1.0 + cycle[(i - 1) % cycle.len()];
        }
        let high = close * 1.01;
        let low = close * 0.99;
        series.push(PriceBar::new(day(i as u32), close, high, low, close, 1_000_000).unwrap());
    }
    PriceSeries::new(symbol, series).unwrap()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let provider = MemoryProvider::with_series([
        fixture("ALPHA", 100.0, &[0.012, -0.004, 0.006, -0.002], 90),
        fixture("BETA", 60.0, &[-0.002, 0.009, -0.005, 0.011], 90),
        fixture("GAMMA", 240.0, &[0.004, 0.004, -0.013, 0.008], 90),
        fixture("^GSPC", 5_000.0, &[0.005, -0.001, 0.002, 0.001], 90),
    ]);
    let engine = AnalyticsEngine::new(Arc::new(provider), AnalyticsConfig::default())?;

    println!("=== Portfolio optimization ===");
    let mut optimization = OptimizationRequest::new(["ALPHA", "BETA", "GAMMA"]);
    optimization.risk_preference = RiskPreference::Medium;
    optimization.max_weight = 0.6;
    optimization.seed = Some(7);
    let portfolio = engine.optimize_portfolio(optimization).await?;
    println!("strategy: {}", portfolio.strategy);
    for asset in &portfolio.weights {
        println!("  {:<6} {:.1}%", asset.ticker, asset.weight * 100.0);
    }
    println!(
        "expected return {:.2}%, volatility {:.2}%",
        portfolio.expected_annual_return * 100.0,
        portfolio.expected_annual_volatility * 100.0
    );

    println!("\n=== Single-asset risk ===");
    let mut risk = RiskRequest::single("ALPHA");
    risk.window = "60d".parse()?;
    let report = engine.assess_risk(risk).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    println!("\n=== Technical signals ===");
    let signals = engine.compute_signals(SignalRequest::new("BETA")).await?;
    println!("{}", signals.summary);
    for signal in &signals.signals {
        println!(
            "  [{:?} {:?}] {}: {}",
            signal.strength, signal.direction, signal.indicator, signal.description
        );
    }

    println!("\n=== Scenario simulation ===");
    let mut simulation = SimulationRequest::new(["ALPHA", "GAMMA"]);
    simulation.scenario = Scenario::BearMarket;
    simulation.time_steps = Some(10);
    simulation.seed = Some(42);
    let scenario = engine.simulate_scenario(simulation).await?;
    for sim in &scenario.tickers {
        println!(
            "{}: {:.2} -> {:.2} avg (p(gain) {:.0}%), {}",
            sim.ticker,
            sim.current_price,
            sim.average_projected_price,
            sim.probability_of_increase * 100.0,
            sim.liquidity_impact
        );
    }

    Ok(())
}
