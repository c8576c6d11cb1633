//! Trend summary of the latest window: direction, strength, support and resistance

use serde::Serialize;

use super::helpers::index_correlation;
use crate::indicators::trailing_mean;
use crate::{Period, Ratio, Trend, OHLCV};

/// Discount applied to MA20 support once price has fallen through it
const MA_SUPPORT_DISCOUNT: f64 = 0.95;
/// Premium applied to MA20 resistance once price has risen through it
const MA_RESISTANCE_PREMIUM: f64 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    /// |correlation| of close against time over the window, 0 for a flat window
    pub strength: f64,
    pub price_change_pct: f64,
    /// Lowest low of the window
    pub support: f64,
    /// Highest high of the window
    pub resistance: f64,
    pub ma_support: f64,
    pub ma_resistance: f64,
    pub ma5: f64,
    pub ma20: f64,
    /// Falls back to MA20 with fewer than 60 bars
    pub ma60: f64,
}

/// Summarise the last `period` bars. `None` with fewer bars than `period`.
///
/// The direction compares the window's first and last close against
/// `threshold` (a fraction, so 0.05 means 5%).
pub fn analyze_trend<T: OHLCV>(bars: &[T], period: Period, threshold: Ratio) -> Option<TrendAnalysis> {
    let p = period.get();
    if bars.len() < p {
        return None;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
    let recent = &bars[bars.len() - p..];
    let recent_closes = &closes[closes.len() - p..];

    let first = *recent_closes.first()?;
    let last = *recent_closes.last()?;
    let price_change_pct = if first != 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };
    let limit = threshold.get() * 100.0;
    let trend = if price_change_pct > limit {
        Trend::Up
    } else if price_change_pct < -limit {
        Trend::Down
    } else {
        Trend::Sideways
    };

    let strength = index_correlation(recent_closes).map_or(0.0, f64::abs);
    let support = recent.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
    let resistance = recent.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);

    let ma5 = trailing_mean(&closes, 5)?;
    let ma20 = trailing_mean(&closes, 20)?;
    let ma60 = if closes.len() >= 60 {
        trailing_mean(&closes, 60)?
    } else {
        ma20
    };

    let ma_support = if last > ma20 {
        ma20
    } else {
        ma20 * MA_SUPPORT_DISCOUNT
    };
    let ma_resistance = if last < ma20 {
        ma20
    } else {
        ma20 * MA_RESISTANCE_PREMIUM
    };

    Some(TrendAnalysis {
        trend,
        strength,
        price_change_pct,
        support,
        resistance,
        ma_support,
        ma_resistance,
        ma5,
        ma20,
        ma60,
    })
}
