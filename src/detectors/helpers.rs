//! Shared thresholds, candle geometry and window statistics for the detectors

use crate::Trend;

// ============================================================
// CANDLE THRESHOLDS
// ============================================================

/// Doji: body below this share of the range
pub const DOJI_RATIO: f64 = 0.05;
/// A shadow at or below this share of the range counts as absent
pub const SHADOW_TINY_RATIO: f64 = 0.001;
/// Short body: body at or below this share of the range
pub const BODY_SHORT_RATIO: f64 = 0.3;
/// Short shadow: shadow at or below this share of the range
pub const SHADOW_SHORT_RATIO: f64 = 0.1;
/// Long shadow: shadow at least this multiple of the body
pub const SHADOW_VERYLONG_FACTOR: f64 = 2.0;
/// Soldiers/crows: the shadow on the closing side stays under this multiple of the body
pub const SOLDIER_SHADOW_FACTOR: f64 = 0.3;
/// Star: middle body below this multiple of the first body
pub const STAR_BODY_FACTOR: f64 = 0.5;

// ============================================================
// CHART THRESHOLDS
// ============================================================

/// Shortest window a chart detector accepts
pub const MIN_CHART_WINDOW: usize = 10;
/// Double top/bottom: minimum bars between the two extremes
pub const MIN_PEAK_SEPARATION: usize = 5;
/// Head-and-shoulders: minimum bars between each shoulder and the head
pub const MIN_SHOULDER_SEPARATION: usize = 3;

// ============================================================
// CANDLE GEOMETRY
// ============================================================

/// Body below `ratio` of a non-empty range
#[inline]
pub fn is_doji_body(body: f64, range: f64, ratio: f64) -> bool {
    range > 0.0 && body / range < ratio
}

/// Shadow at or below `ratio` of the range
#[inline]
pub fn is_tiny_shadow(shadow: f64, range: f64, ratio: f64) -> bool {
    shadow <= range * ratio
}

/// Hammer-family geometry: a short, non-empty body at one end of the range
/// with a long shadow on the other side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HammerShape {
    /// Body at most this share of the range
    pub body_ratio: f64,
    /// Long shadow at least this multiple of the body
    pub long_shadow_factor: f64,
    /// Short shadow at most this share of the range
    pub short_shadow_ratio: f64,
}

impl Default for HammerShape {
    fn default() -> Self {
        Self {
            body_ratio: BODY_SHORT_RATIO,
            long_shadow_factor: SHADOW_VERYLONG_FACTOR,
            short_shadow_ratio: SHADOW_SHORT_RATIO,
        }
    }
}

impl HammerShape {
    #[inline]
    pub fn matches(&self, body: f64, range: f64, long_shadow: f64, short_shadow: f64) -> bool {
        body > 0.0
            && range > 0.0
            && body / range <= self.body_ratio
            && long_shadow >= body * self.long_shadow_factor
            && short_shadow <= range * self.short_shadow_ratio
    }
}

// ============================================================
// WINDOW STATISTICS
// ============================================================

#[inline]
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Least-squares slope of `values` against their index.
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    Some(num / den)
}

/// Pearson correlation of `values` with their index. `None` for a flat series.
pub fn index_correlation(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;
    let (sxy, sxx, syy) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (i, &y)| {
            let dx = i as f64 - x_mean;
            let dy = y - y_mean;
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        });
    if syy <= 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Classify the net move of a least-squares fit, relative to the mean level.
///
/// Fewer than two values or a non-positive mean classify as sideways.
pub fn classify_trend(closes: &[f64], threshold: f64) -> Trend {
    let (Some(slope), Some(level)) = (linear_slope(closes), mean(closes)) else {
        return Trend::Sideways;
    };
    if level <= f64::EPSILON {
        return Trend::Sideways;
    }
    let relative_move = slope * (closes.len() - 1) as f64 / level;
    if relative_move > threshold {
        Trend::Up
    } else if relative_move < -threshold {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

/// Trend of the closes leading into a candle.
///
/// A strictly monotonic run is a trend however shallow; anything else falls
/// back to [`classify_trend`] with `threshold` as the noise floor.
pub fn classify_context(closes: &[f64], threshold: f64) -> Trend {
    if closes.len() >= 2 {
        if closes.windows(2).all(|w| w[1] < w[0]) {
            return Trend::Down;
        }
        if closes.windows(2).all(|w| w[1] > w[0]) {
            return Trend::Up;
        }
    }
    classify_trend(closes, threshold)
}

/// Strict local maxima as `(position, value)`, in time order.
pub fn local_peaks(values: &[f64]) -> Vec<(usize, f64)> {
    values
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, w)| (i + 1, w[1]))
        .collect()
}

/// Strict local minima as `(position, value)`, in time order.
pub fn local_troughs(values: &[f64]) -> Vec<(usize, f64)> {
    values
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] < w[0] && w[1] < w[2])
        .map(|(i, w)| (i + 1, w[1]))
        .collect()
}

/// The `n` most extreme extrema (by `more_extreme`), returned in time order.
pub fn most_extreme(
    mut extrema: Vec<(usize, f64)>,
    n: usize,
    more_extreme: impl Fn(f64, f64) -> bool,
) -> Option<Vec<(usize, f64)>> {
    if extrema.len() < n {
        return None;
    }
    extrema.sort_by(|a, b| {
        if more_extreme(a.1, b.1) {
            std::cmp::Ordering::Less
        } else if more_extreme(b.1, a.1) {
            std::cmp::Ordering::Greater
        } else {
            a.0.cmp(&b.0)
        }
    });
    extrema.truncate(n);
    extrema.sort_by_key(|e| e.0);
    Some(extrema)
}
