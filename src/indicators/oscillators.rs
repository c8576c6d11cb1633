//! Momentum oscillators: RSI and KDJ

use serde::{Deserialize, Serialize};

use super::IndicatorSeries;
use crate::{Period, OHLCV};

/// RSI over trailing windows of close-to-close deltas.
///
/// Each index is recomputed from its own window: no Wilder smoothing.
/// A window without any movement reads 50.
pub fn rsi(values: &[f64], period: Period) -> IndicatorSeries {
    let p = period.get();
    let n = values.len();
    let mut out = vec![None; n];
    if n <= p {
        return out;
    }

    let deltas: Vec<f64> = std::iter::once(0.0)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .collect();

    for i in p..n {
        let (gains, losses) = deltas[i + 1 - p..=i]
            .iter()
            .fold((0.0, 0.0), |(g, l), &d| if d > 0.0 { (g + d, l) } else { (g, l - d) });
        out[i] = Some(rsi_from_averages(gains / p as f64, losses / p as f64));
    }
    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// KDJ parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdjParams {
    /// RSV lookback (default: 9)
    pub period: Period,
    /// K smoothing (default: 3)
    pub k_smoothing: Period,
    /// D smoothing (default: 3)
    pub d_smoothing: Period,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self {
            period: Period::new_const(9),
            k_smoothing: Period::new_const(3),
            d_smoothing: Period::new_const(3),
        }
    }
}

/// One KDJ row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kdj {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

impl Kdj {
    /// Row used before the first full RSV window
    pub const SEED: Kdj = Kdj {
        k: 50.0,
        d: 50.0,
        j: 50.0,
    };
}

/// Stochastic KDJ as one forward fold carrying (K, D).
pub fn kdj<T: OHLCV>(bars: &[T], params: &KdjParams) -> Vec<Kdj> {
    let p = params.period.get();
    let m1 = params.k_smoothing.get() as f64;
    let m2 = params.d_smoothing.get() as f64;

    let mut out = Vec::with_capacity(bars.len());
    let (mut k, mut d) = (Kdj::SEED.k, Kdj::SEED.d);

    for i in 0..bars.len() {
        if i + 1 < p {
            out.push(Kdj::SEED);
            continue;
        }
        let window = &bars[i + 1 - p..=i];
        let high = window.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
        let rsv = if high == low {
            50.0
        } else {
            (bars[i].close() - low) / (high - low) * 100.0
        };

        k = ((m1 - 1.0) * k + rsv) / m1;
        d = ((m2 - 1.0) * d + k) / m2;
        out.push(Kdj {
            k,
            d,
            j: 3.0 * k - 2.0 * d,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;

    fn p(n: usize) -> Period {
        Period::new(n).unwrap()
    }

    #[test]
    fn test_rsi_needs_period_plus_one_values() {
        let values: Vec<f64> = (0..14).map(|i| i as f64).collect();
        assert!(rsi(&values, p(14)).iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_monotonic_rise_is_100() {
        let values: Vec<f64> = (0..20).map(|i| 10.0 + i as f64 * 0.1).collect();
        let out = rsi(&values, p(14));
        assert!(out[..14].iter().all(Option::is_none));
        assert!(out[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_rsi_monotonic_fall_is_0() {
        let values: Vec<f64> = (0..10).map(|i| 50.0 - i as f64).collect();
        assert_eq!(rsi(&values, p(3))[9], Some(0.0));
    }

    #[test]
    fn test_rsi_flat_window_reads_50() {
        assert_eq!(rsi(&[5.0; 6], p(3))[5], Some(50.0));
    }

    #[test]
    fn test_rsi_mixed_window() {
        // deltas in window: +2, -1, +1 -> avg gain 1, avg loss 1/3
        let out = rsi(&[10.0, 12.0, 11.0, 12.0], p(3));
        assert!((out[3].unwrap() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_kdj_seed_rows() {
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(i, 10.0, 11.0, 9.0, 10.5, 100.0))
            .collect();
        let out = kdj(&bars, &KdjParams::default());
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|row| *row == Kdj::SEED));
    }

    #[test]
    fn test_kdj_flat_bars_stay_at_50() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| Bar::new(i, 10.0, 10.0, 10.0, 10.0, 100.0))
            .collect();
        assert!(kdj(&bars, &KdjParams::default()).iter().all(|row| *row == Kdj::SEED));
    }

    #[test]
    fn test_kdj_first_eligible_row() {
        let params = KdjParams {
            period: p(3),
            ..Default::default()
        };
        let bars = vec![
            Bar::new(1, 10.0, 11.0, 9.0, 10.0, 0.0),
            Bar::new(2, 10.0, 12.0, 10.0, 11.0, 0.0),
            Bar::new(3, 11.0, 13.0, 11.0, 13.0, 0.0),
        ];
        let out = kdj(&bars, &params);
        // RSV = (13 - 9) / (13 - 9) * 100 = 100
        let k = (2.0 * 50.0 + 100.0) / 3.0;
        let d = (2.0 * 50.0 + k) / 3.0;
        assert!((out[2].k - k).abs() < 1e-12);
        assert!((out[2].d - d).abs() < 1e-12);
        assert!((out[2].j - (3.0 * k - 2.0 * d)).abs() < 1e-12);
    }
}
