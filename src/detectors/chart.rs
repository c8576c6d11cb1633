//! Chart pattern detectors over a trailing window
//!
//! Head-and-Shoulders (and inverse), Double Top/Bottom and the three
//! triangle consolidations. Each detector looks at the `window` bars ending
//! at the evaluated index.
//!
//! Top and bottom variants share one implementation: bottoms run on negated
//! lows/highs/closes so that "more extreme" always means "greater".

use super::helpers::{
    linear_slope, local_peaks, mean, most_extreme, MIN_CHART_WINDOW, MIN_PEAK_SEPARATION,
    MIN_SHOULDER_SEPARATION,
};
use crate::{
    config::PatternConfig, MarketContext, PatternDetector, PatternKind, PatternMatch, Result,
    Strength, TaError, OHLCV,
};

impl_with_defaults!(
    HeadAndShouldersDetector,
    InverseHeadAndShouldersDetector,
    DoubleTopDetector,
    DoubleBottomDetector,
    SymmetricalTriangleDetector,
    AscendingTriangleDetector,
    DescendingTriangleDetector,
);

// ============================================================
// WINDOW EXTRACTION
// ============================================================

/// Prices of the trailing window, signed so that the pattern's extremes are maxima.
struct SignedWindow {
    start: usize,
    extremes: Vec<f64>,
    opposite: Vec<f64>,
    last_close: f64,
}

impl SignedWindow {
    fn tops<T: OHLCV>(bars: &[T], index: usize, window: usize) -> Option<Self> {
        let (start, slice) = trailing(bars, index, window)?;
        Some(Self {
            start,
            extremes: slice.iter().map(|b| b.high()).collect(),
            opposite: slice.iter().map(|b| b.low()).collect(),
            last_close: slice.last()?.close(),
        })
    }

    fn bottoms<T: OHLCV>(bars: &[T], index: usize, window: usize) -> Option<Self> {
        let (start, slice) = trailing(bars, index, window)?;
        Some(Self {
            start,
            extremes: slice.iter().map(|b| -b.low()).collect(),
            opposite: slice.iter().map(|b| -b.high()).collect(),
            last_close: -slice.last()?.close(),
        })
    }
}

fn trailing<T>(bars: &[T], index: usize, window: usize) -> Option<(usize, &[T])> {
    if index >= bars.len() || index + 1 < window {
        return None;
    }
    let start = index + 1 - window;
    Some((start, &bars[start..=index]))
}

fn validate_window(window: usize) -> Result<()> {
    if window < MIN_CHART_WINDOW {
        return Err(TaError::InvalidConfig(format!(
            "chart window {window} below minimum {MIN_CHART_WINDOW}"
        )));
    }
    Ok(())
}

/// Quality of a match within a tolerance: 1 at zero deviation, 0 at the limit.
fn tolerance_score(deviation: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        1.0
    } else {
        1.0 - deviation / tolerance
    }
}

// ============================================================
// DOUBLE TOP / DOUBLE BOTTOM
// ============================================================

/// Two extremes of similar height with a confirmed break of the valley between.
/// Returns the window offset of the first extreme and the quality score.
fn double_extreme(w: &SignedWindow, tolerance: f64) -> Option<(usize, f64)> {
    let pair = most_extreme(local_peaks(&w.extremes), 2, |a, b| a > b)?;
    let (p1, h1) = pair[0];
    let (p2, h2) = pair[1];

    if p2 - p1 < MIN_PEAK_SEPARATION || h1.abs() <= f64::EPSILON {
        return None;
    }
    let deviation = (h1 - h2).abs() / h1.abs();
    if deviation > tolerance {
        return None;
    }

    let valley = w.opposite[p1..=p2].iter().copied().fold(f64::INFINITY, f64::min);
    if valley >= h1.min(h2) || w.last_close >= valley {
        return None;
    }
    Some((p1, tolerance_score(deviation, tolerance)))
}

/// Double Top - two similar highs, then a close below the trough between them
#[derive(Debug, Clone, Copy)]
pub struct DoubleTopDetector {
    pub window: usize,
    pub peak_tolerance: f64,
}

impl Default for DoubleTopDetector {
    fn default() -> Self {
        Self::from_config(&PatternConfig::default())
    }
}

impl DoubleTopDetector {
    pub fn from_config(cfg: &PatternConfig) -> Self {
        Self {
            window: cfg.window.get(),
            peak_tolerance: cfg.peak_tolerance.get(),
        }
    }
}

impl PatternDetector for DoubleTopDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleTop
    }

    fn min_bars(&self) -> usize {
        self.window
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let w = SignedWindow::tops(bars, index, self.window)?;
        let (first, score) = double_extreme(&w, self.peak_tolerance)?;
        Some(PatternMatch::new(
            self.kind(),
            w.start + first,
            index,
            Some(Strength::from_score(score)),
            ctx.trend,
        ))
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

/// Double Bottom - two similar lows, then a close above the peak between them
#[derive(Debug, Clone, Copy)]
pub struct DoubleBottomDetector {
    pub window: usize,
    pub peak_tolerance: f64,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self::from_config(&PatternConfig::default())
    }
}

impl DoubleBottomDetector {
    pub fn from_config(cfg: &PatternConfig) -> Self {
        Self {
            window: cfg.window.get(),
            peak_tolerance: cfg.peak_tolerance.get(),
        }
    }
}

impl PatternDetector for DoubleBottomDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleBottom
    }

    fn min_bars(&self) -> usize {
        self.window
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let w = SignedWindow::bottoms(bars, index, self.window)?;
        let (first, score) = double_extreme(&w, self.peak_tolerance)?;
        Some(PatternMatch::new(
            self.kind(),
            w.start + first,
            index,
            Some(Strength::from_score(score)),
            ctx.trend,
        ))
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// HEAD AND SHOULDERS
// ============================================================

/// Three extremes with a dominant middle and matching shoulders, then a
/// close beyond the shoulders' mean. Returns the left shoulder offset and score.
fn head_and_shoulders(w: &SignedWindow, tolerance: f64) -> Option<(usize, f64)> {
    let three = most_extreme(local_peaks(&w.extremes), 3, |a, b| a > b)?;
    let (left_pos, left) = three[0];
    let (head_pos, head) = three[1];
    let (right_pos, right) = three[2];

    if head <= left || head <= right {
        return None;
    }
    if head_pos - left_pos < MIN_SHOULDER_SEPARATION
        || right_pos - head_pos < MIN_SHOULDER_SEPARATION
    {
        return None;
    }
    if left.abs() <= f64::EPSILON {
        return None;
    }
    let deviation = (left - right).abs() / left.abs();
    if deviation > tolerance {
        return None;
    }

    let neckline = (left + right) / 2.0;
    if w.last_close >= neckline {
        return None;
    }
    Some((left_pos, tolerance_score(deviation, tolerance)))
}

/// Head and Shoulders - bearish reversal top
#[derive(Debug, Clone, Copy)]
pub struct HeadAndShouldersDetector {
    pub window: usize,
    pub shoulder_tolerance: f64,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self::from_config(&PatternConfig::default())
    }
}

impl HeadAndShouldersDetector {
    pub fn from_config(cfg: &PatternConfig) -> Self {
        Self {
            window: cfg.window.get(),
            shoulder_tolerance: cfg.shoulder_tolerance.get(),
        }
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::HeadAndShoulders
    }

    fn min_bars(&self) -> usize {
        self.window
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let w = SignedWindow::tops(bars, index, self.window)?;
        let (left, score) = head_and_shoulders(&w, self.shoulder_tolerance)?;
        Some(PatternMatch::new(
            self.kind(),
            w.start + left,
            index,
            Some(Strength::from_score(score)),
            ctx.trend,
        ))
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

/// Inverse Head and Shoulders - bullish reversal bottom
#[derive(Debug, Clone, Copy)]
pub struct InverseHeadAndShouldersDetector {
    pub window: usize,
    pub shoulder_tolerance: f64,
}

impl Default for InverseHeadAndShouldersDetector {
    fn default() -> Self {
        Self::from_config(&PatternConfig::default())
    }
}

impl InverseHeadAndShouldersDetector {
    pub fn from_config(cfg: &PatternConfig) -> Self {
        Self {
            window: cfg.window.get(),
            shoulder_tolerance: cfg.shoulder_tolerance.get(),
        }
    }
}

impl PatternDetector for InverseHeadAndShouldersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::InverseHeadAndShoulders
    }

    fn min_bars(&self) -> usize {
        self.window
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let w = SignedWindow::bottoms(bars, index, self.window)?;
        let (left, score) = head_and_shoulders(&w, self.shoulder_tolerance)?;
        Some(PatternMatch::new(
            self.kind(),
            w.start + left,
            index,
            Some(Strength::from_score(score)),
            ctx.trend,
        ))
    }

    fn validate_config(&self) -> Result<()> {
        validate_window(self.window)
    }
}

// ============================================================
// TRIANGLES
// ============================================================

/// Classify the converging shape of the window from the least-squares slopes
/// of highs and lows, each relative to the mean close per bar.
pub fn triangle_shape<T: OHLCV>(bars: &[T], flat_tolerance: f64) -> Option<PatternKind> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high()).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low()).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();

    let level = mean(&closes)?;
    if level <= f64::EPSILON {
        return None;
    }
    let high_slope = linear_slope(&highs)? / level;
    let low_slope = linear_slope(&lows)? / level;

    let falling_highs = high_slope < -flat_tolerance;
    let rising_lows = low_slope > flat_tolerance;
    if falling_highs && rising_lows {
        Some(PatternKind::SymmetricalTriangle)
    } else if rising_lows && high_slope.abs() <= flat_tolerance {
        Some(PatternKind::AscendingTriangle)
    } else if falling_highs && low_slope.abs() <= flat_tolerance {
        Some(PatternKind::DescendingTriangle)
    } else {
        None
    }
}

macro_rules! triangle_detector {
    ($name:ident, $kind:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub window: usize,
            pub flat_tolerance: f64,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::from_config(&PatternConfig::default())
            }
        }

        impl $name {
            pub fn from_config(cfg: &PatternConfig) -> Self {
                Self {
                    window: cfg.window.get(),
                    flat_tolerance: cfg.flat_tolerance.get(),
                }
            }
        }

        impl PatternDetector for $name {
            fn kind(&self) -> PatternKind {
                PatternKind::$kind
            }

            fn min_bars(&self) -> usize {
                self.window
            }

            fn detect<T: OHLCV>(
                &self,
                bars: &[T],
                index: usize,
                ctx: &MarketContext,
            ) -> Option<PatternMatch> {
                let (start, slice) = trailing(bars, index, self.window)?;
                if triangle_shape(slice, self.flat_tolerance)? != self.kind() {
                    return None;
                }
                Some(PatternMatch::new(self.kind(), start, index, None, ctx.trend))
            }

            fn validate_config(&self) -> Result<()> {
                validate_window(self.window)
            }
        }
    };
}

triangle_detector!(
    SymmetricalTriangleDetector,
    SymmetricalTriangle,
    "Symmetrical Triangle - falling highs and rising lows"
);
triangle_detector!(
    AscendingTriangleDetector,
    AscendingTriangle,
    "Ascending Triangle - flat highs and rising lows"
);
triangle_detector!(
    DescendingTriangleDetector,
    DescendingTriangle,
    "Descending Triangle - falling highs and flat lows"
);
