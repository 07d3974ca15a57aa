//! Indicator arithmetic over raw price vectors
//!
//! Every function returns values aligned index-for-index with its input;
//! entries that fall inside an estimator's warm-up span are `None`.

/// Rolling mean over a trailing window
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 >= period {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            } else {
                None
            }
        })
        .collect()
}

/// Rolling mean that treats any `None` inside the window as poisoning the
/// whole window, the way NaN propagates through a rolling estimator.
pub(crate) fn rolling_mean_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mut sum = 0.0;
            for value in window {
                sum += (*value)?;
            }
            Some(sum / period as f64)
        })
        .collect()
}

/// Rolling sample standard deviation (n - 1 denominator)
pub(crate) fn rolling_sample_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let ss: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
            Some((ss / (period - 1) as f64).sqrt())
        })
        .collect()
}

/// Exponential moving average seeded from the first observation:
/// `y[0] = x[0]`, `y[i] = alpha * x[i] + (1 - alpha) * y[i-1]`,
/// `alpha = 2 / (span + 1)`.
pub(crate) fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            out.push(*value);
        } else {
            out.push(alpha * value + (1.0 - alpha) * out[i - 1]);
        }
    }
    out
}

/// Relative strength index from rolling-mean average gains and losses.
///
/// A window with gains and no losses reads 100; a fully flat window has no
/// defined value. The first `period` entries are warm-up.
pub(crate) fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut gains = Vec::with_capacity(n.saturating_sub(1));
    let mut losses = Vec::with_capacity(n.saturating_sub(1));
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    let mut out = vec![None; n];
    for i in period..n {
        let (Some(gain), Some(loss)) = (avg_gains[i - 1], avg_losses[i - 1]) else {
            continue;
        };
        out[i] = if loss == 0.0 {
            if gain == 0.0 {
                None
            } else {
                Some(100.0)
            }
        } else {
            let rs = gain / loss;
            Some(100.0 - 100.0 / (1.0 + rs))
        };
    }
    out
}

/// MACD line, signal line and histogram, full length
pub(crate) struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub(crate) fn macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> MacdSeries {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&macd, signal_span);
    MacdSeries { macd, signal }
}

/// Average directional index with its directional components
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DirectionalIndex {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// ADX over true-range and directional-movement chains smoothed with
/// rolling means. Needs `2 * period` bars before the first value exists;
/// a range-less (flat) history never produces one.
pub(crate) fn adx(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Option<DirectionalIndex> {
    let n = closes.len();
    if n < 2 * period || highs.len() != n || lows.len() != n {
        return None;
    }

    // All chains are aligned to bar index 1..n
    let mut true_range = Vec::with_capacity(n - 1);
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    for i in 1..n {
        let range = highs[i] - lows[i];
        let high_gap = (highs[i] - closes[i - 1]).abs();
        let low_gap = (lows[i] - closes[i - 1]).abs();
        true_range.push(range.max(high_gap).max(low_gap));

        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    let atr = rolling_mean(&true_range, period);
    let smooth_plus = rolling_mean(&plus_dm, period);
    let smooth_minus = rolling_mean(&minus_dm, period);

    let len = true_range.len();
    let mut plus_di = vec![None; len];
    let mut minus_di = vec![None; len];
    let mut dx = vec![None; len];
    for i in 0..len {
        let (Some(atr_i), Some(p), Some(m)) = (atr[i], smooth_plus[i], smooth_minus[i]) else {
            continue;
        };
        if atr_i <= 0.0 {
            continue;
        }
        let p_di = 100.0 * p / atr_i;
        let m_di = 100.0 * m / atr_i;
        plus_di[i] = Some(p_di);
        minus_di[i] = Some(m_di);
        if p_di + m_di > 0.0 {
            dx[i] = Some(100.0 * (p_di - m_di).abs() / (p_di + m_di));
        }
    }

    let adx = rolling_mean_opt(&dx, period);
    match (adx[len - 1], plus_di[len - 1], minus_di[len - 1]) {
        (Some(adx), Some(plus_di), Some(minus_di)) => Some(DirectionalIndex {
            adx,
            plus_di,
            minus_di,
        }),
        _ => None,
    }
}
