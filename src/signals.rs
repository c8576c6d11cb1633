//! Buy / sell / neutral classification of indicator readings
//!
//! Classifiers are pure functions of the latest values. No history of past
//! signals is kept and there is no hysteresis.

use serde::{Deserialize, Serialize};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

const KDJ_HIGH: f64 = 80.0;
const KDJ_LOW: f64 = 20.0;
const SCORE_THRESHOLD: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Neutral,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short average above long is bullish. Equal averages read as Sell.
pub fn ma_cross(short: Option<f64>, long: Option<f64>) -> Signal {
    match (short, long) {
        (Some(s), Some(l)) if s > l => Signal::Buy,
        (Some(_), Some(_)) => Signal::Sell,
        _ => Signal::Neutral,
    }
}

pub fn rsi_signal(rsi: Option<f64>) -> Signal {
    match rsi {
        Some(v) if v < RSI_OVERSOLD => Signal::Buy,
        Some(v) if v > RSI_OVERBOUGHT => Signal::Sell,
        _ => Signal::Neutral,
    }
}

/// Rising value is Buy, anything else Sell. Neutral without a predecessor.
pub fn momentum(current: Option<f64>, previous: Option<f64>) -> Signal {
    match (current, previous) {
        (Some(c), Some(p)) if c > p => Signal::Buy,
        (Some(_), Some(_)) => Signal::Sell,
        _ => Signal::Neutral,
    }
}

pub fn macd_cross(dif: Option<f64>, dea: Option<f64>) -> Signal {
    ma_cross(dif, dea)
}

/// Close below the lower band is Buy, above the upper band Sell.
pub fn band_position(close: Option<f64>, lower: Option<f64>, upper: Option<f64>) -> Signal {
    match (close, lower, upper) {
        (Some(c), Some(l), _) if c < l => Signal::Buy,
        (Some(c), _, Some(u)) if c > u => Signal::Sell,
        _ => Signal::Neutral,
    }
}

/// Latest readings feeding the composite vote
#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalInputs {
    pub close: Option<f64>,
    pub dif: Option<f64>,
    pub dea: Option<f64>,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub rsi: Option<f64>,
    /// Bollinger middle band (the 20-bar SMA by default)
    pub middle: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Composite vote across MACD, KDJ, RSI, price vs average and band position.
///
/// Undefined readings abstain. A score of at least 2 is Buy, at most -2 Sell.
pub fn technical_score(inputs: &TechnicalInputs) -> (i32, Signal) {
    let mut score = 0;

    if let (Some(dif), Some(dea)) = (inputs.dif, inputs.dea) {
        score += if dif > dea { 1 } else { -1 };
    }

    if let (Some(k), Some(d)) = (inputs.k, inputs.d) {
        if k > d && k < KDJ_HIGH {
            score += 1;
        } else if k < d && k > KDJ_LOW {
            score -= 1;
        }
    }

    match rsi_signal(inputs.rsi) {
        Signal::Buy => score += 1,
        Signal::Sell => score -= 1,
        Signal::Neutral => {}
    }

    if let (Some(close), Some(middle)) = (inputs.close, inputs.middle) {
        score += if close > middle { 1 } else { -1 };
    }

    match band_position(inputs.close, inputs.lower, inputs.upper) {
        Signal::Buy => score += 1,
        Signal::Sell => score -= 1,
        Signal::Neutral => {}
    }

    let signal = if score >= SCORE_THRESHOLD {
        Signal::Buy
    } else if score <= -SCORE_THRESHOLD {
        Signal::Sell
    } else {
        Signal::Neutral
    };
    (score, signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ma_cross() {
        assert_eq!(ma_cross(Some(11.0), Some(10.0)), Signal::Buy);
        assert_eq!(ma_cross(Some(9.0), Some(10.0)), Signal::Sell);
        assert_eq!(ma_cross(Some(10.0), Some(10.0)), Signal::Sell);
        assert_eq!(ma_cross(None, Some(10.0)), Signal::Neutral);
    }

    #[test]
    fn test_rsi_thresholds() {
        assert_eq!(rsi_signal(Some(29.9)), Signal::Buy);
        assert_eq!(rsi_signal(Some(30.0)), Signal::Neutral);
        assert_eq!(rsi_signal(Some(70.0)), Signal::Neutral);
        assert_eq!(rsi_signal(Some(70.1)), Signal::Sell);
        assert_eq!(rsi_signal(None), Signal::Neutral);
    }

    #[test]
    fn test_momentum() {
        assert_eq!(momentum(Some(60.0), Some(55.0)), Signal::Buy);
        assert_eq!(momentum(Some(50.0), Some(55.0)), Signal::Sell);
        assert_eq!(momentum(Some(50.0), None), Signal::Neutral);
    }

    #[test]
    fn test_band_position() {
        assert_eq!(band_position(Some(8.0), Some(9.0), Some(11.0)), Signal::Buy);
        assert_eq!(band_position(Some(12.0), Some(9.0), Some(11.0)), Signal::Sell);
        assert_eq!(band_position(Some(10.0), Some(9.0), Some(11.0)), Signal::Neutral);
        assert_eq!(band_position(Some(10.0), None, None), Signal::Neutral);
    }

    #[test]
    fn test_technical_score_all_bullish() {
        let inputs = TechnicalInputs {
            close: Some(8.0),
            dif: Some(0.5),
            dea: Some(0.2),
            k: Some(40.0),
            d: Some(30.0),
            rsi: Some(25.0),
            middle: Some(7.0),
            lower: Some(9.0),
            upper: Some(12.0),
        };
        assert_eq!(technical_score(&inputs), (5, Signal::Buy));
    }

    #[test]
    fn test_technical_score_undefined_abstains() {
        assert_eq!(technical_score(&TechnicalInputs::default()), (0, Signal::Neutral));
    }

    #[test]
    fn test_technical_score_bearish() {
        let inputs = TechnicalInputs {
            close: Some(10.0),
            dif: Some(-0.1),
            dea: Some(0.0),
            middle: Some(11.0),
            ..Default::default()
        };
        assert_eq!(technical_score(&inputs), (-2, Signal::Sell));
    }

    #[test]
    fn test_signal_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"buy\"");
    }
}
