//! Volume analysis: relative volume, volume trend and price/volume agreement

use serde::Serialize;

use super::trailing_mean;
use crate::{Direction, Period, OHLCV};

/// Ratio above which the latest volume counts as expanding
pub const VOLUME_EXPANSION: f64 = 1.2;
/// Ratio below which the latest volume counts as contracting
pub const VOLUME_CONTRACTION: f64 = 0.8;

const SHORT_VOLUME_WINDOW: usize = 5;
const LONG_VOLUME_WINDOW: usize = 20;

/// Direction of trading activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeAnalysis {
    pub avg_volume: f64,
    pub current_volume: f64,
    /// Latest volume relative to the average (1.0 when the average is zero)
    pub volume_ratio: f64,
    pub volume_trend: VolumeTrend,
    /// Whether volume confirms or contradicts the latest price move
    pub price_volume: Direction,
}

/// Analyse the last `period` bars. `None` with fewer bars than `period`.
pub fn analyze_volume<T: OHLCV>(bars: &[T], period: Period) -> Option<VolumeAnalysis> {
    let p = period.get();
    if bars.len() < p {
        return None;
    }

    let volumes: Vec<f64> = bars.iter().map(|b| b.volume()).collect();
    let avg_volume = trailing_mean(&volumes, p)?;
    let current_volume = *volumes.last()?;
    let volume_ratio = if avg_volume > 0.0 {
        current_volume / avg_volume
    } else {
        1.0
    };

    let short = trailing_mean(&volumes, SHORT_VOLUME_WINDOW)?;
    let long = trailing_mean(&volumes, LONG_VOLUME_WINDOW)?;
    let volume_trend = if short > long {
        VolumeTrend::Increasing
    } else if short < long {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    };

    let price_change = match bars {
        [.., prev, last] => last.close() - prev.close(),
        _ => 0.0,
    };
    let price_volume = match (price_change, volume_ratio) {
        (c, r) if c > 0.0 && r > VOLUME_EXPANSION => Direction::Bullish,
        (c, r) if c > 0.0 && r < VOLUME_CONTRACTION => Direction::Bearish,
        (c, r) if c < 0.0 && r > VOLUME_EXPANSION => Direction::Bearish,
        (c, r) if c < 0.0 && r < VOLUME_CONTRACTION => Direction::Bullish,
        _ => Direction::Neutral,
    };

    Some(VolumeAnalysis {
        avg_volume,
        current_volume,
        volume_ratio,
        volume_trend,
        price_volume,
    })
}
