//! Rule-based technical signal generation
//!
//! Indicators are computed independently over one price history; each may
//! emit at most one directional signal via its rule table, and the signals
//! are then scored into a single recommendation.

mod indicators;
mod rules;

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use quant_data::{PriceSeries, Window};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SMA_SHORT: usize = 20;
const SMA_MEDIUM: usize = 50;
const SMA_LONG: usize = 200;
const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_WIDTH: f64 = 2.0;
const ADX_PERIOD: usize = 14;

/// Supported technical indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Indicator {
    Sma,
    Rsi,
    Macd,
    Bb,
    Adx,
}

impl Indicator {
    /// Parse a comma-separated indicator list such as `"sma,rsi,macd"`
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',').map(|part| part.trim().parse()).collect()
    }
}

impl FromStr for Indicator {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(Self::Sma),
            "rsi" => Ok(Self::Rsi),
            "macd" => Ok(Self::Macd),
            "bb" => Ok(Self::Bb),
            "adx" => Ok(Self::Adx),
            other => Err(AnalyticsError::InvalidInput(format!(
                "unknown indicator: {other}"
            ))),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sma => write!(f, "SMA"),
            Self::Rsi => write!(f, "RSI"),
            Self::Macd => write!(f, "MACD"),
            Self::Bb => write!(f, "BB"),
            Self::Adx => write!(f, "ADX"),
        }
    }
}

/// Signal generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    pub ticker: String,
    #[serde(default = "default_indicators")]
    pub indicators: Vec<Indicator>,
    #[serde(default = "default_window")]
    pub window: Window,
}

fn default_indicators() -> Vec<Indicator> {
    vec![Indicator::Sma, Indicator::Rsi, Indicator::Macd, Indicator::Bb]
}

fn default_window() -> Window {
    Window::months(6)
}

impl SignalRequest {
    /// Request with the default indicator set (SMA, RSI, MACD, BB) over 6mo
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            indicators: default_indicators(),
            window: default_window(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStrength {
    Moderate,
    Strong,
}

/// One directional signal emitted by one indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub indicator: Indicator,
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "STRONG_BUY"),
            Self::Buy => write!(f, "BUY"),
            Self::Hold => write!(f, "HOLD"),
            Self::Sell => write!(f, "SELL"),
            Self::StrongSell => write!(f, "STRONG_SELL"),
        }
    }
}

/// Signal counts by direction and strength
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    pub strong_buy: u32,
    pub moderate_buy: u32,
    pub strong_sell: u32,
    pub moderate_sell: u32,
}

impl SignalCounts {
    fn tally(signals: &[Signal]) -> Self {
        let mut counts = Self::default();
        for signal in signals {
            match (signal.direction, signal.strength) {
                (SignalDirection::Buy, SignalStrength::Strong) => counts.strong_buy += 1,
                (SignalDirection::Buy, SignalStrength::Moderate) => counts.moderate_buy += 1,
                (SignalDirection::Sell, SignalStrength::Strong) => counts.strong_sell += 1,
                (SignalDirection::Sell, SignalStrength::Moderate) => counts.moderate_sell += 1,
            }
        }
        counts
    }

    /// Strong signals count double
    pub fn buy_score(&self) -> u32 {
        2 * self.strong_buy + self.moderate_buy
    }

    pub fn sell_score(&self) -> u32 {
        2 * self.strong_sell + self.moderate_sell
    }
}

/// Trend-strength bucket read off the ADX level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Weak,
    Moderate,
    Strong,
    Extreme,
}

impl TrendStrength {
    fn bucket(adx: f64) -> Self {
        if adx < 25.0 {
            Self::Weak
        } else if adx < 50.0 {
            Self::Moderate
        } else if adx < 75.0 {
            Self::Strong
        } else {
            Self::Extreme
        }
    }
}

/// Moving-average levels; a window longer than the history has no value
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MovingAverageReading {
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RsiReading {
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BollingerReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Band width relative to the middle band
    pub width: f64,
    /// Position of the last price inside the band; 0 when the band is flat
    pub percent_b: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdxReading {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub trend: TrendStrength,
}

/// Last-bar indicator levels, reported whether or not a signal fired.
/// A field stays `None` when its indicator was not requested or the
/// history is too short for it.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IndicatorReadings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_averages: Option<MovingAverageReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<RsiReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx: Option<AdxReading>,
}

/// Full signal report for one ticker
#[derive(Debug, Clone, Serialize)]
pub struct SignalSet {
    pub ticker: String,
    pub as_of: DateTime<Utc>,
    pub last_price: f64,
    pub readings: IndicatorReadings,
    pub signals: Vec<Signal>,
    pub counts: SignalCounts,
    pub recommendation: Recommendation,
    pub summary: String,
}

/// Technical signal engine over a single price history
#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalSignalEngine;

impl TechnicalSignalEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, request: &SignalRequest) -> Result<()> {
        if request.ticker.trim().is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "ticker symbol must not be blank".to_string(),
            ));
        }
        if request.indicators.is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "at least one indicator is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Compute the requested indicators and the aggregate recommendation.
    /// Indicators whose warm-up exceeds the history contribute neither a
    /// reading nor a signal; with no signals at all the result is HOLD.
    pub fn compute(&self, request: &SignalRequest, series: &PriceSeries) -> Result<SignalSet> {
        self.validate(request)?;

        let closes = series.closes();
        let n = closes.len();
        let last_price = series.last_close();

        let mut readings = IndicatorReadings::default();
        let mut signals = Vec::new();
        let mut seen: Vec<Indicator> = Vec::new();
        for indicator in &request.indicators {
            if seen.contains(indicator) {
                continue;
            }
            seen.push(*indicator);
            match indicator {
                Indicator::Sma => {
                    self.apply_sma(&closes, last_price, &mut readings, &mut signals);
                },
                Indicator::Rsi => {
                    self.apply_rsi(&closes, &mut readings, &mut signals);
                },
                Indicator::Macd => {
                    self.apply_macd(&closes, &mut readings, &mut signals);
                },
                Indicator::Bb => {
                    self.apply_bollinger(&closes, last_price, &mut readings, &mut signals);
                },
                Indicator::Adx => {
                    let highs = series.highs();
                    let lows = series.lows();
                    self.apply_adx(&highs, &lows, &closes, &mut readings, &mut signals);
                },
            }
        }

        let counts = SignalCounts::tally(&signals);
        let recommendation = recommend(counts.buy_score(), counts.sell_score());
        let summary = format!(
            "{}: {} buy / {} sell signals across {} indicators, recommendation {}",
            request.ticker,
            counts.strong_buy + counts.moderate_buy,
            counts.strong_sell + counts.moderate_sell,
            seen.len(),
            recommendation
        );
        tracing::debug!(
            ticker = %request.ticker,
            bars = n,
            signals = signals.len(),
            recommendation = %recommendation,
            "computed technical signals"
        );

        Ok(SignalSet {
            ticker: request.ticker.clone(),
            as_of: series.last_date(),
            last_price,
            readings,
            signals,
            counts,
            recommendation,
            summary,
        })
    }

    fn apply_sma(
        &self,
        closes: &[f64],
        last_price: f64,
        readings: &mut IndicatorReadings,
        signals: &mut Vec<Signal>,
    ) {
        let n = closes.len();
        let sma_20 = indicators::rolling_mean(closes, SMA_SHORT);
        let sma_50 = indicators::rolling_mean(closes, SMA_MEDIUM);
        let sma_200 = indicators::rolling_mean(closes, SMA_LONG);

        readings.moving_averages = Some(MovingAverageReading {
            sma_20: sma_20[n - 1],
            sma_50: sma_50[n - 1],
            sma_200: sma_200[n - 1],
        });

        // Cross detection needs the 50 and 200 averages on two bars
        if n < 2 {
            return;
        }
        let (Some(sma_50_now), Some(sma_50_prev), Some(sma_200_now), Some(sma_200_prev)) =
            (sma_50[n - 1], sma_50[n - 2], sma_200[n - 1], sma_200[n - 2])
        else {
            return;
        };
        let context = rules::SmaContext {
            price: last_price,
            sma_50: sma_50_now,
            sma_50_prev,
            sma_200: sma_200_now,
            sma_200_prev,
        };
        push_signal(signals, Indicator::Sma, rules::evaluate(rules::SMA_RULES, &context));
    }

    fn apply_rsi(
        &self,
        closes: &[f64],
        readings: &mut IndicatorReadings,
        signals: &mut Vec<Signal>,
    ) {
        let series = indicators::rsi(closes, RSI_PERIOD);
        let Some(Some(value)) = series.last().copied() else {
            return;
        };
        readings.rsi = Some(RsiReading { value });
        push_signal(
            signals,
            Indicator::Rsi,
            rules::evaluate(rules::RSI_RULES, &rules::RsiContext { value }),
        );
    }

    fn apply_macd(
        &self,
        closes: &[f64],
        readings: &mut IndicatorReadings,
        signals: &mut Vec<Signal>,
    ) {
        let n = closes.len();
        if n < 2 {
            return;
        }
        let lines = indicators::macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let macd_now = lines.macd[n - 1];
        let signal_now = lines.signal[n - 1];
        readings.macd = Some(MacdReading {
            macd: macd_now,
            signal: signal_now,
            histogram: macd_now - signal_now,
        });

        let context = rules::MacdContext {
            macd: macd_now,
            macd_prev: lines.macd[n - 2],
            signal: signal_now,
            signal_prev: lines.signal[n - 2],
        };
        push_signal(signals, Indicator::Macd, rules::evaluate(rules::MACD_RULES, &context));
    }

    fn apply_bollinger(
        &self,
        closes: &[f64],
        last_price: f64,
        readings: &mut IndicatorReadings,
        signals: &mut Vec<Signal>,
    ) {
        let n = closes.len();
        let middles = indicators::rolling_mean(closes, BOLLINGER_PERIOD);
        let stds = indicators::rolling_sample_std(closes, BOLLINGER_PERIOD);
        let (Some(middle), Some(std)) = (middles[n - 1], stds[n - 1]) else {
            return;
        };

        let upper = middle + BOLLINGER_WIDTH * std;
        let lower = middle - BOLLINGER_WIDTH * std;
        let band = upper - lower;
        let width = if middle != 0.0 { band / middle } else { 0.0 };
        let percent_b = if band > 0.0 {
            (last_price - lower) / band
        } else {
            0.0
        };
        readings.bollinger = Some(BollingerReading {
            upper,
            middle,
            lower,
            width,
            percent_b,
        });

        let context = rules::BollingerContext {
            price: last_price,
            upper,
            lower,
        };
        push_signal(
            signals,
            Indicator::Bb,
            rules::evaluate(rules::BOLLINGER_RULES, &context),
        );
    }

    fn apply_adx(
        &self,
        highs: &[f64],
        lows: &[f64],
        closes: &[f64],
        readings: &mut IndicatorReadings,
        signals: &mut Vec<Signal>,
    ) {
        let Some(index) = indicators::adx(highs, lows, closes, ADX_PERIOD) else {
            return;
        };
        readings.adx = Some(AdxReading {
            adx: index.adx,
            plus_di: index.plus_di,
            minus_di: index.minus_di,
            trend: TrendStrength::bucket(index.adx),
        });

        let context = rules::AdxContext {
            adx: index.adx,
            plus_di: index.plus_di,
            minus_di: index.minus_di,
        };
        push_signal(signals, Indicator::Adx, rules::evaluate(rules::ADX_RULES, &context));
    }
}

fn push_signal(signals: &mut Vec<Signal>, indicator: Indicator, draft: Option<rules::SignalDraft>) {
    if let Some(draft) = draft {
        signals.push(Signal {
            indicator,
            direction: draft.direction,
            strength: draft.strength,
            description: draft.description,
        });
    }
}

/// Score the counted signals into one recommendation. A lone buy signal is
/// a STRONG_BUY because any positive score beats a doubled zero.
fn recommend(buy_score: u32, sell_score: u32) -> Recommendation {
    if buy_score > 2 * sell_score {
        Recommendation::StrongBuy
    } else if buy_score > sell_score {
        Recommendation::Buy
    } else if sell_score > 2 * buy_score {
        Recommendation::StrongSell
    } else if sell_score > buy_score {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}
