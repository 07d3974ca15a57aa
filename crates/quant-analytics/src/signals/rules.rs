//! Ordered signal rules, evaluated top to bottom with first match winning
//!
//! Each indicator owns a rule table over a small context struct, so every
//! threshold can be exercised on its own without price fixtures.

use super::{SignalDirection, SignalStrength};

pub(crate) struct SmaContext {
    pub price: f64,
    pub sma_50: f64,
    pub sma_50_prev: f64,
    pub sma_200: f64,
    pub sma_200_prev: f64,
}

pub(crate) struct RsiContext {
    pub value: f64,
}

pub(crate) struct MacdContext {
    pub macd: f64,
    pub macd_prev: f64,
    pub signal: f64,
    pub signal_prev: f64,
}

pub(crate) struct BollingerContext {
    pub price: f64,
    pub upper: f64,
    pub lower: f64,
}

pub(crate) struct AdxContext {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// One row of a rule table
pub(crate) struct Rule<C> {
    pub predicate: fn(&C) -> bool,
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub description: fn(&C) -> String,
}

/// Direction, strength and rendered description of a matched rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignalDraft {
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub description: String,
}

pub(crate) fn evaluate<C>(rules: &[Rule<C>], context: &C) -> Option<SignalDraft> {
    rules
        .iter()
        .find(|rule| (rule.predicate)(context))
        .map(|rule| SignalDraft {
            direction: rule.direction,
            strength: rule.strength,
            description: (rule.description)(context),
        })
}

pub(crate) const SMA_RULES: &[Rule<SmaContext>] = &[
    Rule {
        predicate: |c| c.sma_50_prev <= c.sma_200_prev && c.sma_50 > c.sma_200,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Strong,
        description: |_| "50-day SMA crossed above the 200-day SMA (golden cross)".to_string(),
    },
    Rule {
        predicate: |c| c.sma_50_prev >= c.sma_200_prev && c.sma_50 < c.sma_200,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Strong,
        description: |_| "50-day SMA crossed below the 200-day SMA (death cross)".to_string(),
    },
    Rule {
        predicate: |c| c.price > c.sma_50 && c.sma_50 > c.sma_200,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Moderate,
        description: |_| "price is holding above the 50-day and 200-day SMAs".to_string(),
    },
    Rule {
        predicate: |c| c.price < c.sma_50 && c.sma_50 < c.sma_200,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Moderate,
        description: |_| "price is trading below the 50-day and 200-day SMAs".to_string(),
    },
];

pub(crate) const RSI_RULES: &[Rule<RsiContext>] = &[
    Rule {
        predicate: |c| c.value > 80.0,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Strong,
        description: |c| format!("RSI at {:.1} is deeply overbought", c.value),
    },
    Rule {
        predicate: |c| c.value > 70.0,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Moderate,
        description: |c| format!("RSI at {:.1} is overbought", c.value),
    },
    Rule {
        predicate: |c| c.value < 20.0,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Strong,
        description: |c| format!("RSI at {:.1} is deeply oversold", c.value),
    },
    Rule {
        predicate: |c| c.value < 30.0,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Moderate,
        description: |c| format!("RSI at {:.1} is oversold", c.value),
    },
];

// Unlike the SMA cross, the crossover requires the lines to have been
// strictly apart on the previous bar; a tie resolves to the position rules.
pub(crate) const MACD_RULES: &[Rule<MacdContext>] = &[
    Rule {
        predicate: |c| c.macd_prev < c.signal_prev && c.macd > c.signal,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Strong,
        description: |_| "MACD crossed above its signal line".to_string(),
    },
    Rule {
        predicate: |c| c.macd_prev > c.signal_prev && c.macd < c.signal,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Strong,
        description: |_| "MACD crossed below its signal line".to_string(),
    },
    Rule {
        predicate: |c| c.macd > c.signal,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Moderate,
        description: |_| "MACD is running above its signal line".to_string(),
    },
    Rule {
        predicate: |c| c.macd < c.signal,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Moderate,
        description: |_| "MACD is running below its signal line".to_string(),
    },
];

pub(crate) const BOLLINGER_RULES: &[Rule<BollingerContext>] = &[
    Rule {
        predicate: |c| c.price > c.upper,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Moderate,
        description: |_| "price closed above the upper Bollinger band".to_string(),
    },
    Rule {
        predicate: |c| c.price < c.lower,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Moderate,
        description: |_| "price closed below the lower Bollinger band".to_string(),
    },
];

pub(crate) const ADX_RULES: &[Rule<AdxContext>] = &[
    Rule {
        predicate: |c| c.adx > 25.0 && c.plus_di > c.minus_di && c.adx < 50.0,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Moderate,
        description: |c| format!("ADX {:.1} confirms an upward trend", c.adx),
    },
    Rule {
        predicate: |c| c.adx > 25.0 && c.plus_di > c.minus_di,
        direction: SignalDirection::Buy,
        strength: SignalStrength::Strong,
        description: |c| format!("ADX {:.1} confirms a powerful upward trend", c.adx),
    },
    Rule {
        predicate: |c| c.adx > 25.0 && c.minus_di > c.plus_di && c.adx < 50.0,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Moderate,
        description: |c| format!("ADX {:.1} confirms a downward trend", c.adx),
    },
    Rule {
        predicate: |c| c.adx > 25.0 && c.minus_di > c.plus_di,
        direction: SignalDirection::Sell,
        strength: SignalStrength::Strong,
        description: |c| format!("ADX {:.1} confirms a powerful downward trend", c.adx),
    },
];
