//! Indicator calculators over close vectors and bar slices
//!
//! Every calculator returns a series aligned index-for-index with its input.
//! Positions without enough lookback hold `None`.

pub mod moving_average;
pub mod oscillators;
pub mod trend;
pub mod volume;

pub use moving_average::*;
pub use oscillators::*;
pub use trend::*;
pub use volume::*;

/// Output of a calculator, aligned with its input
pub type IndicatorSeries = Vec<Option<f64>>;

/// Latest entry of a series, `None` when empty or not yet defined.
#[inline]
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Mean of the last `n` values (fewer if the slice is shorter).
pub(crate) fn trailing_mean(values: &[f64], n: usize) -> Option<f64> {
    let take = n.min(values.len());
    if take == 0 {
        return None;
    }
    let tail = &values[values.len() - take..];
    Some(tail.iter().sum::<f64>() / take as f64)
}
