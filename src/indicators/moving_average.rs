//! Simple and exponential moving averages

use super::IndicatorSeries;
use crate::{Period, OHLCV};

/// Arithmetic mean of the trailing `period` values, inclusive of each index.
pub fn sma(values: &[f64], period: Period) -> IndicatorSeries {
    let p = period.get();
    let mut out = vec![None; values.len()];
    if p > values.len() {
        return out;
    }
    for (offset, window) in values.windows(p).enumerate() {
        out[offset + p - 1] = Some(window.iter().sum::<f64>() / p as f64);
    }
    out
}

/// SMA of the closing prices.
pub fn sma_close<T: OHLCV>(bars: &[T], period: Period) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
    sma(&closes, period)
}

/// Exponential moving average seeded with the SMA of the first `period` values.
pub fn ema(values: &[f64], period: Period) -> IndicatorSeries {
    let p = period.get();
    let mut out = vec![None; values.len()];
    if p > values.len() {
        return out;
    }

    let alpha = 2.0 / (p as f64 + 1.0);
    let seed = values[..p].iter().sum::<f64>() / p as f64;
    out[p - 1] = Some(seed);

    let mut prev = seed;
    for (i, &v) in values.iter().enumerate().skip(p) {
        prev = (v - prev) * alpha + prev;
        out[i] = Some(prev);
    }
    out
}

/// EMA of the closing prices.
pub fn ema_close<T: OHLCV>(bars: &[T], period: Period) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
    ema(&closes, period)
}

/// EMA over the defined entries of an optional series.
///
/// `None` entries count as absent history rather than zero; results are
/// written back to the positions the defined values came from.
pub fn ema_defined(values: &[Option<f64>], period: Period) -> IndicatorSeries {
    let (positions, defined): (Vec<usize>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .unzip();

    let mut out = vec![None; values.len()];
    for (pos, value) in positions.into_iter().zip(ema(&defined, period)) {
        out[pos] = value;
    }
    out
}
