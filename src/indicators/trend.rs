//! Trend and volatility indicators: MACD and Bollinger bands

use serde::{Deserialize, Serialize};

use super::{ema, ema_defined, sma, IndicatorSeries};
use crate::Period;

/// MACD parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    /// Fast EMA period (default: 12)
    pub fast: Period,
    /// Slow EMA period (default: 26)
    pub slow: Period,
    /// Signal line period (default: 9)
    pub signal: Period,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: Period::new_const(12),
            slow: Period::new_const(26),
            signal: Period::new_const(9),
        }
    }
}

/// MACD output series
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub dif: IndicatorSeries,
    pub dea: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn macd(values: &[f64], params: &MacdParams) -> MacdSeries {
    let fast = ema(values, params.fast);
    let slow = ema(values, params.slow);
    macd_from_emas(&fast, &slow, params.signal)
}

/// MACD from already computed fast and slow EMAs.
///
/// DEA smooths only the defined DIF values; the histogram is `2 * (DIF - DEA)`.
pub fn macd_from_emas(
    fast: &[Option<f64>],
    slow: &[Option<f64>],
    signal: Period,
) -> MacdSeries {
    let dif: IndicatorSeries = fast
        .iter()
        .zip(slow)
        .map(|pair| match pair {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();
    let dea = ema_defined(&dif, signal);
    let histogram = dif
        .iter()
        .zip(&dea)
        .map(|pair| match pair {
            (Some(d), Some(e)) => Some(2.0 * (d - e)),
            _ => None,
        })
        .collect();

    MacdSeries {
        dif,
        dea,
        histogram,
    }
}

/// Bollinger band parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerParams {
    /// Moving average period (default: 20)
    pub period: Period,
    /// Standard deviation multiplier (default: 2.0)
    pub width: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: Period::new_const(20),
            width: 2.0,
        }
    }
}

/// Bollinger band series
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

pub fn bollinger(values: &[f64], params: &BollingerParams) -> BollingerSeries {
    let middle = sma(values, params.period);
    bollinger_from_middle(values, &middle, params)
}

/// Bands around an already computed SMA of `params.period`.
///
/// Uses the population standard deviation of the trailing window.
pub fn bollinger_from_middle(
    values: &[f64],
    middle: &[Option<f64>],
    params: &BollingerParams,
) -> BollingerSeries {
    let p = params.period.get();
    let mut upper = vec![None; middle.len()];
    let mut lower = vec![None; middle.len()];

    for (i, mean) in middle.iter().enumerate() {
        let Some(mean) = *mean else { continue };
        if i + 1 < p || i >= values.len() {
            continue;
        }
        let window = &values[i + 1 - p..=i];
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / p as f64;
        let band = params.width * variance.sqrt();
        upper[i] = Some(mean + band);
        lower[i] = Some(mean - band);
    }

    BollingerSeries {
        upper,
        middle: middle.to_vec(),
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: usize) -> Period {
        Period::new(n).unwrap()
    }

    #[test]
    fn test_macd_undefined_until_slow_ema() {
        let values: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let out = macd(&values, &MacdParams::default());
        assert!(out.dif[..25].iter().all(Option::is_none));
        assert!(out.dif[25].is_some());
        // DEA needs 9 defined DIF values
        assert!(out.dea.iter().all(Option::is_none));
    }

    #[test]
    fn test_macd_histogram_is_twice_the_gap() {
        let values: Vec<f64> = (0..60).map(|i| 10.0 + (i as f64 * 0.3).sin()).collect();
        let out = macd(&values, &MacdParams::default());
        for i in 0..values.len() {
            match (out.dif[i], out.dea[i], out.histogram[i]) {
                (Some(d), Some(e), Some(h)) => assert!((h - 2.0 * (d - e)).abs() < 1e-12),
                (_, _, None) => {}
                other => panic!("histogram defined without inputs at {i}: {other:?}"),
            }
        }
        assert!(out.dea[33].is_some());
    }

    #[test]
    fn test_macd_from_emas_matches_macd() {
        let values: Vec<f64> = (0..50).map(|i| 20.0 + (i % 7) as f64).collect();
        let params = MacdParams::default();
        let direct = macd(&values, &params);
        let reused = macd_from_emas(
            &ema(&values, params.fast),
            &ema(&values, params.slow),
            params.signal,
        );
        assert_eq!(direct, reused);
    }

    #[test]
    fn test_bollinger_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let params = BollingerParams {
            period: p(8),
            width: 2.0,
        };
        let out = bollinger(&values, &params);
        // mean 5, population sigma 2
        assert_eq!(out.middle[7], Some(5.0));
        assert_eq!(out.upper[7], Some(9.0));
        assert_eq!(out.lower[7], Some(1.0));
        assert!(out.upper[6].is_none());
    }

    #[test]
    fn test_bollinger_constant_series_collapses() {
        let out = bollinger(&[3.0; 25], &BollingerParams::default());
        assert_eq!(out.upper[24], Some(3.0));
        assert_eq!(out.lower[24], Some(3.0));
    }
}
