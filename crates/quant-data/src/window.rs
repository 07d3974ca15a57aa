//! History window parsing and arithmetic

use crate::error::MarketDataError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trailing history window, parsed from period strings such as
/// `"30d"`, `"6mo"`, `"1y"` or `"max"`.
///
/// Month and year windows use calendar-day approximations (30 and 365 days)
/// so that the same string always selects the same span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Window {
    Days(u32),
    Months(u32),
    Years(u32),
    Max,
}

impl Window {
    /// Window of `n` calendar days
    pub fn days(n: u32) -> Self {
        Self::Days(n)
    }

    /// Window of `n` months (30 days each)
    pub fn months(n: u32) -> Self {
        Self::Months(n)
    }

    /// Window of `n` years (365 days each)
    pub fn years(n: u32) -> Self {
        Self::Years(n)
    }

    /// The entire available history (~100 years)
    pub fn max() -> Self {
        Self::Max
    }

    /// Length of the window in calendar days
    pub fn num_days(&self) -> i64 {
        match self {
            Self::Days(n) => i64::from(*n),
            Self::Months(n) => i64::from(*n) * 30,
            Self::Years(n) => i64::from(*n) * 365,
            Self::Max => 36500,
        }
    }

    /// Start of the window, counting back from `end`
    pub fn start_from(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        end - Duration::days(self.num_days())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n}d"),
            Self::Months(n) => write!(f, "{n}mo"),
            Self::Years(n) => write!(f, "{n}y"),
            Self::Max => write!(f, "max"),
        }
    }
}

impl FromStr for Window {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }

        // Order matters: "mo" must be tried before "d"/"y" suffixes
        let (digits, ctor): (&str, fn(u32) -> Self) = if let Some(n) = value.strip_suffix("mo") {
            (n, Self::Months)
        } else if let Some(n) = value.strip_suffix('d') {
            (n, Self::Days)
        } else if let Some(n) = value.strip_suffix('y') {
            (n, Self::Years)
        } else {
            return Err(MarketDataError::InvalidWindow(value.to_string()));
        };

        let n: u32 = digits
            .parse()
            .map_err(|_| MarketDataError::InvalidWindow(value.to_string()))?;
        if n == 0 {
            return Err(MarketDataError::InvalidWindow(value.to_string()));
        }
        Ok(ctor(n))
    }
}

impl TryFrom<String> for Window {
    type Error = MarketDataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Window> for String {
    fn from(window: Window) -> Self {
        window.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_windows() {
        assert_eq!("30d".parse::<Window>().unwrap(), Window::days(30));
        assert_eq!("6mo".parse::<Window>().unwrap(), Window::months(6));
        assert_eq!("1y".parse::<Window>().unwrap(), Window::years(1));
        assert_eq!("max".parse::<Window>().unwrap(), Window::max());
        assert_eq!("MAX".parse::<Window>().unwrap(), Window::max());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Window>().is_err());
        assert!("6 months".parse::<Window>().is_err());
        assert!("mo".parse::<Window>().is_err());
        assert!("-1y".parse::<Window>().is_err());
        assert!("0d".parse::<Window>().is_err());
        assert!("1w".parse::<Window>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["5d", "3mo", "2y", "max"] {
            let window: Window = s.parse().unwrap();
            assert_eq!(window.to_string(), s);
            assert_eq!(window.to_string().parse::<Window>().unwrap(), window);
        }
    }

    #[test]
    fn test_num_days() {
        assert_eq!(Window::days(7).num_days(), 7);
        assert_eq!(Window::months(6).num_days(), 180);
        assert_eq!(Window::years(2).num_days(), 730);
    }

    #[test]
    fn test_serde_as_string() {
        let window = Window::months(6);
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, "\"6mo\"");
        let back: Window = serde_json::from_str(&json).unwrap();
        assert_eq!(back, window);
    }
}
