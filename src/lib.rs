//! # kline-ta - technical analysis and pattern recognition for OHLCV series
//!
//! A pure, stateless pipeline: an ordered series of bars goes in, indicator
//! values, buy/sell/neutral signals and candlestick/chart pattern annotations
//! come out. Nothing is cached between calls.
//!
//! ## Quick Start
//!
//! ```rust
//! use kline_ta::prelude::*;
//!
//! let bars: Vec<Bar> = (0..40)
//!     .map(|i| {
//!         let close = 10.0 + i as f64 * 0.1;
//!         Bar::new(20240101 + i, close - 0.05, close + 0.1, close - 0.1, close, 1_000.0)
//!     })
//!     .collect();
//! let series = Series::new(bars).unwrap();
//!
//! let engine = EngineBuilder::new().with_all_detectors().build().unwrap();
//! let report = engine.analyze(&series);
//! assert_eq!(report.value("RSI14"), Some(100.0));
//!
//! let patterns = engine.detect_patterns(&series);
//! assert!(patterns.iter().all(|p| p.end_index < series.len()));
//! ```

pub mod config;
pub mod detectors;
pub mod indicators;
pub mod params;
pub mod report;
pub mod signals;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::EngineConfig,
        // Detectors
        detectors::*,
        // Indicators
        indicators::{
            BollingerParams, BollingerSeries, IndicatorSeries, Kdj, KdjParams, MacdParams,
            MacdSeries, VolumeAnalysis, VolumeTrend,
        },
        // Parameters
        params::{ParamMeta, ParamType, Parameterized},
        // Parallel
        analyze_parallel,
        // Reports
        report::{IndicatorEntry, IndicatorReport, PatternReport, PatternSummary},
        // Signals
        signals::Signal,
        AnalysisError,
        AnalysisResult,
        // Core types
        Bar,
        BuiltinDetector,
        Direction,
        EngineBuilder,
        IndicatorEngine,
        MarketContext,
        OHLCVExt,
        PatternCategory,
        PatternDetector,
        PatternKind,
        PatternMatch,
        Period,
        Ratio,
        Result,
        Series,
        Strength,
        // Errors
        TaError,
        Trend,
        TrendContext,
        OHLCV,
    };
}

use std::collections::{BTreeMap, BTreeSet, HashSet};

use report::{keys, IndicatorEntry, IndicatorReport, PatternReport};
use signals::Signal;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, TaError>;

/// Input-contract violations. Insufficient history is never an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(TaError::InvalidInput("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(TaError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Lookback period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(TaError::InvalidInput("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    /// Ordinal day code, e.g. `20240102`. Must increase strictly along a series.
    fn date(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Traded amount (turnover)
    fn amount(&self) -> f64 {
        0.0
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    /// Validate bar consistency. The reported index is always 0; series
    /// validation rewrites it to the bar's position.
    fn validate(&self) -> Result<()> {
        let fields = [self.open(), self.high(), self.low(), self.close(), self.volume()];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(TaError::InvalidBar {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if fields.iter().any(|v| v.is_infinite()) {
            return Err(TaError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(TaError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open() < self.low() || self.open() > self.high() {
            return Err(TaError::InvalidBar {
                index: 0,
                reason: "open outside [low, high]",
            });
        }
        if self.close() < self.low() || self.close() > self.high() {
            return Err(TaError::InvalidBar {
                index: 0,
                reason: "close outside [low, high]",
            });
        }
        if self.volume() < 0.0 {
            return Err(TaError::InvalidBar {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Plain daily bar
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub date: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub amount: f64,
}

impl Bar {
    pub fn new(date: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            amount: 0.0,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }
}

impl OHLCV for Bar {
    fn date(&self) -> i64 {
        self.date
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn amount(&self) -> f64 {
        self.amount
    }
}

/// Check every bar and the strict date ordering of a slice.
pub fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            TaError::InvalidBar { reason, .. } => TaError::InvalidBar { index: i, reason },
            other => other,
        })?;
        if i > 0 && bar.date() <= bars[i - 1].date() {
            return Err(TaError::InvalidBar {
                index: i,
                reason: "date not strictly increasing",
            });
        }
    }
    Ok(())
}

// ============================================================
// SERIES
// ============================================================

/// Validated, immutable, date-ordered sequence of bars.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T: OHLCV = Bar> {
    bars: Vec<T>,
}

impl<T: OHLCV> Series<T> {
    pub fn new(bars: Vec<T>) -> Result<Self> {
        validate_bars(&bars)?;
        Ok(Self { bars })
    }

    #[inline]
    pub fn bars(&self) -> &[T] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.bars.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close()).collect()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.bars
    }
}

impl<T: OHLCV> AsRef<[T]> for Series<T> {
    fn as_ref(&self) -> &[T] {
        &self.bars
    }
}

impl<'a, T: OHLCV> IntoIterator for &'a Series<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

// ============================================================
// PATTERN MATCH
// ============================================================

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Neutral => "neutral",
            Direction::Bearish => "bearish",
        }
    }
}

/// Category of pattern by the number of bars it inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    SingleBar,
    ThreeBar,
    Chart,
}

/// Every pattern the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Doji,
    GravestoneDoji,
    DragonflyDoji,
    Hammer,
    HangingMan,
    InvertedHammer,
    ShootingStar,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    SymmetricalTriangle,
    AscendingTriangle,
    DescendingTriangle,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Doji => "doji",
            PatternKind::GravestoneDoji => "gravestone_doji",
            PatternKind::DragonflyDoji => "dragonfly_doji",
            PatternKind::Hammer => "hammer",
            PatternKind::HangingMan => "hanging_man",
            PatternKind::InvertedHammer => "inverted_hammer",
            PatternKind::ShootingStar => "shooting_star",
            PatternKind::MorningStar => "morning_star",
            PatternKind::EveningStar => "evening_star",
            PatternKind::ThreeWhiteSoldiers => "three_white_soldiers",
            PatternKind::ThreeBlackCrows => "three_black_crows",
            PatternKind::HeadAndShoulders => "head_and_shoulders",
            PatternKind::InverseHeadAndShoulders => "inverse_head_and_shoulders",
            PatternKind::DoubleTop => "double_top",
            PatternKind::DoubleBottom => "double_bottom",
            PatternKind::SymmetricalTriangle => "symmetrical_triangle",
            PatternKind::AscendingTriangle => "ascending_triangle",
            PatternKind::DescendingTriangle => "descending_triangle",
        }
    }

    /// Bias the pattern signals when it completes.
    pub fn typical_direction(self) -> Direction {
        match self {
            PatternKind::DragonflyDoji
            | PatternKind::Hammer
            | PatternKind::InvertedHammer
            | PatternKind::MorningStar
            | PatternKind::ThreeWhiteSoldiers
            | PatternKind::InverseHeadAndShoulders
            | PatternKind::DoubleBottom => Direction::Bullish,
            PatternKind::GravestoneDoji
            | PatternKind::HangingMan
            | PatternKind::ShootingStar
            | PatternKind::EveningStar
            | PatternKind::ThreeBlackCrows
            | PatternKind::HeadAndShoulders
            | PatternKind::DoubleTop => Direction::Bearish,
            PatternKind::Doji
            | PatternKind::SymmetricalTriangle
            | PatternKind::AscendingTriangle
            | PatternKind::DescendingTriangle => Direction::Neutral,
        }
    }

    pub fn category(self) -> PatternCategory {
        match self {
            PatternKind::Doji
            | PatternKind::GravestoneDoji
            | PatternKind::DragonflyDoji
            | PatternKind::Hammer
            | PatternKind::HangingMan
            | PatternKind::InvertedHammer
            | PatternKind::ShootingStar => PatternCategory::SingleBar,
            PatternKind::MorningStar
            | PatternKind::EveningStar
            | PatternKind::ThreeWhiteSoldiers
            | PatternKind::ThreeBlackCrows => PatternCategory::ThreeBar,
            _ => PatternCategory::Chart,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative confidence tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// Bucket a 0.0..=1.0 quality score.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 2.0 / 3.0 => Strength::Strong,
            s if s >= 1.0 / 3.0 => Strength::Moderate,
            _ => Strength::Weak,
        }
    }
}

/// Coarse trend classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Sideways,
}

impl Trend {
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, Trend::Up)
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, Trend::Down)
    }
}

/// Result of pattern detection
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub direction: Direction,
    pub start_index: usize,
    pub end_index: usize,
    pub strength: Option<Strength>,
    pub trend_context: Trend,
}

impl PatternMatch {
    pub fn new(
        kind: PatternKind,
        start_index: usize,
        end_index: usize,
        strength: Option<Strength>,
        trend_context: Trend,
    ) -> Self {
        Self {
            kind,
            direction: kind.typical_direction(),
            start_index,
            end_index,
            strength,
            trend_context,
        }
    }
}

// ============================================================
// MARKET CONTEXT
// ============================================================

/// Context of the bars leading up to a specific bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarketContext {
    /// Trend of the closes preceding the bar (the bar itself excluded)
    pub trend: Trend,
}

/// Precomputes the preceding-trend context for every bar
#[derive(Debug, Clone, Copy)]
pub struct TrendContext {
    pub window: Period,
    pub threshold: Ratio,
}

impl Default for TrendContext {
    fn default() -> Self {
        Self {
            window: Period::new_const(5),
            threshold: Ratio::new_const(0.01),
        }
    }
}

impl TrendContext {
    pub fn compute_all<T: OHLCV>(&self, bars: &[T]) -> Vec<MarketContext> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        (0..bars.len())
            .map(|i| {
                let start = i.saturating_sub(self.window.get());
                MarketContext {
                    trend: detectors::classify_context(
                        &closes[start..i],
                        self.threshold.get(),
                    ),
                }
            })
            .collect()
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// Pattern detector evaluated at a single bar index
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;
    fn min_bars(&self) -> usize;
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize, ctx: &MarketContext)
        -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: OHLCV>(
                &self,
                bars: &[T],
                index: usize,
                ctx: &MarketContext,
            ) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars, index, ctx)),*
                }
            }

            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(d) => PatternDetector::kind(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Single bar
    Doji(DojiDetector),
    GravestoneDoji(GravestoneDojiDetector),
    DragonflyDoji(DragonflyDojiDetector),
    Hammer(HammerDetector),
    HangingMan(HangingManDetector),
    InvertedHammer(InvertedHammerDetector),
    ShootingStar(ShootingStarDetector),

    // Three bar
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),

    // Chart
    HeadAndShoulders(HeadAndShouldersDetector),
    InverseHeadAndShoulders(InverseHeadAndShouldersDetector),
    DoubleTop(DoubleTopDetector),
    DoubleBottom(DoubleBottomDetector),
    SymmetricalTriangle(SymmetricalTriangleDetector),
    AscendingTriangle(AscendingTriangleDetector),
    DescendingTriangle(DescendingTriangleDetector),
}

// ============================================================
// INDICATOR ENGINE
// ============================================================

/// Per-call memo of moving averages over the close vector, so that an
/// indicator needing an already requested SMA/EMA reuses it.
struct SeriesCache<'a> {
    closes: &'a [f64],
    sma: BTreeMap<Period, indicators::IndicatorSeries>,
    ema: BTreeMap<Period, indicators::IndicatorSeries>,
    computed: usize,
}

impl<'a> SeriesCache<'a> {
    fn new(closes: &'a [f64]) -> Self {
        Self {
            closes,
            sma: BTreeMap::new(),
            ema: BTreeMap::new(),
            computed: 0,
        }
    }

    fn sma(&mut self, period: Period) -> &indicators::IndicatorSeries {
        let closes = self.closes;
        let computed = &mut self.computed;
        self.sma.entry(period).or_insert_with(|| {
            *computed += 1;
            indicators::sma(closes, period)
        })
    }

    fn ema(&mut self, period: Period) -> &indicators::IndicatorSeries {
        let closes = self.closes;
        let computed = &mut self.computed;
        self.ema.entry(period).or_insert_with(|| {
            *computed += 1;
            indicators::ema(closes, period)
        })
    }

    fn ema_pair(
        &mut self,
        a: Period,
        b: Period,
    ) -> (&indicators::IndicatorSeries, &indicators::IndicatorSeries) {
        self.ema(a);
        self.ema(b);
        (&self.ema[&a], &self.ema[&b])
    }
}

/// Main analysis engine: indicators, signals and pattern detection
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: config::EngineConfig,
    detectors: Vec<BuiltinDetector>,
    context: TrendContext,
    pattern_filter: Option<Vec<PatternKind>>,
    min_strength: Option<Strength>,
}

impl IndicatorEngine {
    /// Engine with every builtin detector and the given configuration.
    pub fn new(config: config::EngineConfig) -> Result<Self> {
        EngineBuilder::new().config(config).with_all_detectors().build()
    }

    pub fn config(&self) -> &config::EngineConfig {
        &self.config
    }

    pub fn detectors(&self) -> &[BuiltinDetector] {
        &self.detectors
    }

    // ===========================================
    // INDICATORS
    // ===========================================

    /// Run every configured indicator over the series and report the latest values.
    pub fn analyze<T: OHLCV>(&self, series: &Series<T>) -> IndicatorReport {
        self.analyze_valid(series.bars())
    }

    /// Like [`analyze`](Self::analyze), validating a raw slice first.
    pub fn analyze_bars<T: OHLCV>(&self, bars: &[T]) -> Result<IndicatorReport> {
        validate_bars(bars)?;
        Ok(self.analyze_valid(bars))
    }

    fn analyze_valid<T: OHLCV>(&self, bars: &[T]) -> IndicatorReport {
        let cfg = &self.config;
        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        let last_close = closes.last().copied();
        let mut cache = SeriesCache::new(&closes);
        let mut entries = BTreeMap::new();

        // Simple moving averages and the crosses between neighbouring periods
        let sma_periods: BTreeSet<Period> = cfg.sma_periods.iter().copied().collect();
        for &period in &sma_periods {
            let value = indicators::latest(cache.sma(period));
            let title = keys::sma(period);
            entries.insert(title.clone(), IndicatorEntry::new(value, None, &title, None));
        }
        let ordered: Vec<Period> = sma_periods.iter().copied().collect();
        for pair in ordered.windows(2) {
            let short = indicators::latest(cache.sma(pair[0]));
            let long = indicators::latest(cache.sma(pair[1]));
            let signal = signals::ma_cross(short, long);
            let spread = short.zip(long).map(|(s, l)| s - l);
            let title = keys::ma_cross(pair[0], pair[1]);
            let note = match signal {
                Signal::Buy => Some("short above long"),
                Signal::Sell => Some("short below long"),
                Signal::Neutral => None,
            };
            entries.insert(title.clone(), IndicatorEntry::new(spread, Some(signal), &title, note));
        }

        // Exponential moving averages
        let ema_periods: BTreeSet<Period> = cfg.ema_periods.iter().copied().collect();
        for &period in &ema_periods {
            let value = indicators::latest(cache.ema(period));
            let title = keys::ema(period);
            entries.insert(title.clone(), IndicatorEntry::new(value, None, &title, None));
        }

        // MACD reuses the EMAs above when the periods coincide
        let (fast, slow) = cache.ema_pair(cfg.macd.fast, cfg.macd.slow);
        let macd = indicators::macd_from_emas(fast, slow, cfg.macd.signal);
        let dif = indicators::latest(&macd.dif);
        let dea = indicators::latest(&macd.dea);
        let macd_signal = signals::macd_cross(dif, dea);
        let note = match macd_signal {
            Signal::Buy => Some("DIF above DEA"),
            Signal::Sell => Some("DIF below DEA"),
            Signal::Neutral => None,
        };
        entries.insert(
            keys::MACD_DIF.to_string(),
            IndicatorEntry::new(dif, Some(macd_signal), keys::MACD_DIF, note),
        );
        entries.insert(
            keys::MACD_DEA.to_string(),
            IndicatorEntry::new(dea, None, keys::MACD_DEA, None),
        );
        entries.insert(
            keys::MACD_HIST.to_string(),
            IndicatorEntry::new(indicators::latest(&macd.histogram), None, keys::MACD_HIST, None),
        );

        // RSI
        let rsi_periods: BTreeSet<Period> = cfg.rsi_periods.iter().copied().collect();
        let mut scored_rsi = None;
        for &period in &rsi_periods {
            let value = indicators::latest(&indicators::rsi(&closes, period));
            let signal = signals::rsi_signal(value);
            let note = value.map(|v| match v {
                v if v > signals::RSI_OVERBOUGHT => "overbought",
                v if v < signals::RSI_OVERSOLD => "oversold",
                _ => "neutral zone",
            });
            if scored_rsi.is_none() && cfg.rsi_periods.first() == Some(&period) {
                scored_rsi = Some(value);
            }
            let title = keys::rsi(period);
            entries.insert(title.clone(), IndicatorEntry::new(value, Some(signal), &title, note));
        }

        // KDJ
        let kdj = indicators::kdj(bars, &cfg.kdj);
        let latest_kdj = kdj.last().copied();
        // The first eligible row (period - 1) has no predecessor to compare with
        let previous_kdj = (kdj.len() > cfg.kdj.period.get())
            .then(|| kdj[kdj.len() - 2]);
        let k_signal = signals::momentum(latest_kdj.map(|v| v.k), previous_kdj.map(|v| v.k));
        let j_signal = signals::momentum(latest_kdj.map(|v| v.j), previous_kdj.map(|v| v.j));
        for (name, value, signal) in [
            (keys::KDJ_K, latest_kdj.map(|v| v.k), Some(k_signal)),
            (keys::KDJ_D, latest_kdj.map(|v| v.d), None),
            (keys::KDJ_J, latest_kdj.map(|v| v.j), Some(j_signal)),
        ] {
            let note = match signal {
                Some(Signal::Buy) => Some("rising"),
                Some(Signal::Sell) => Some("falling"),
                _ => None,
            };
            entries.insert(name.to_string(), IndicatorEntry::new(value, signal, name, note));
        }

        // Bollinger bands reuse the requested SMA of the same period
        let middle = cache.sma(cfg.bollinger.period).clone();
        let bands = indicators::bollinger_from_middle(&closes, &middle, &cfg.bollinger);
        let upper = indicators::latest(&bands.upper);
        let lower = indicators::latest(&bands.lower);
        let boll_middle = indicators::latest(&bands.middle);
        let band_signal = signals::band_position(last_close, lower, upper);
        let note = match (band_signal, boll_middle) {
            (Signal::Buy, _) => Some("below lower band"),
            (Signal::Sell, _) => Some("above upper band"),
            (Signal::Neutral, Some(_)) => Some("inside bands"),
            (Signal::Neutral, None) => None,
        };
        entries.insert(
            keys::BOLL_UPPER.to_string(),
            IndicatorEntry::new(upper, None, keys::BOLL_UPPER, None),
        );
        entries.insert(
            keys::BOLL_MIDDLE.to_string(),
            IndicatorEntry::new(boll_middle, Some(band_signal), keys::BOLL_MIDDLE, note),
        );
        entries.insert(
            keys::BOLL_LOWER.to_string(),
            IndicatorEntry::new(lower, None, keys::BOLL_LOWER, None),
        );

        let (score, overall) = signals::technical_score(&signals::TechnicalInputs {
            close: last_close,
            dif,
            dea,
            k: latest_kdj.map(|v| v.k),
            d: latest_kdj.map(|v| v.d),
            rsi: scored_rsi.flatten(),
            middle: boll_middle,
            lower,
            upper,
        });

        tracing::debug!(
            bars = bars.len(),
            indicators = entries.len(),
            sub_series = cache.computed,
            overall = overall.as_str(),
            "indicator analysis complete"
        );

        IndicatorReport {
            date: bars.last().map(|b| b.date()),
            close: last_close,
            bars: bars.len(),
            entries,
            score,
            overall,
        }
    }

    // ===========================================
    // PATTERNS
    // ===========================================

    /// Detect candlestick and chart patterns across the whole series.
    pub fn detect_patterns<T: OHLCV>(&self, series: &Series<T>) -> Vec<PatternMatch> {
        self.detect_valid(series.bars())
    }

    /// Like [`detect_patterns`](Self::detect_patterns), validating a raw slice first.
    pub fn detect_patterns_in<T: OHLCV>(&self, bars: &[T]) -> Result<Vec<PatternMatch>> {
        validate_bars(bars)?;
        Ok(self.detect_valid(bars))
    }

    /// Detect patterns at a single bar index.
    pub fn scan_at<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Vec<PatternMatch> {
        self.detectors
            .iter()
            .filter(|d| index + 1 >= d.min_bars())
            .filter_map(|d| d.detect(bars, index, ctx))
            .filter(|m| self.should_include(m))
            .collect()
    }

    fn detect_valid<T: OHLCV>(&self, bars: &[T]) -> Vec<PatternMatch> {
        let contexts = self.context.compute_all(bars);
        let mut seen_chart = HashSet::new();
        let mut results = Vec::new();

        for (i, ctx) in contexts.iter().enumerate() {
            for m in self.scan_at(bars, i, ctx) {
                // A chart formation stays visible across many windows; report its first
                if m.kind.category() == PatternCategory::Chart && !seen_chart.insert(m.kind) {
                    continue;
                }
                tracing::trace!(kind = m.kind.as_str(), index = m.end_index, "pattern detected");
                results.push(m);
            }
        }

        tracing::debug!(bars = bars.len(), matches = results.len(), "pattern scan complete");
        results
    }

    /// Patterns plus volume and trend analysis, summarised by direction.
    pub fn recognize<T: OHLCV>(&self, series: &Series<T>) -> PatternReport {
        let bars = series.bars();
        if bars.len() < report::MIN_RECOGNITION_BARS {
            return PatternReport::empty();
        }

        let patterns = self.detect_valid(bars);
        let volume = indicators::analyze_volume(bars, self.config.patterns.volume_period);
        let trend = detectors::analyze_trend(
            bars,
            self.config.patterns.trend_period,
            self.config.patterns.trend_threshold,
        );
        PatternReport::new(patterns, volume, trend)
    }

    fn should_include(&self, m: &PatternMatch) -> bool {
        if let Some(min) = self.min_strength {
            if m.strength.is_some_and(|s| s < min) {
                return false;
            }
        }
        if let Some(ref filter) = self.pattern_filter {
            if !filter.contains(&m.kind) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        for d in &self.detectors {
            d.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating IndicatorEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: config::EngineConfig,
    candlesticks: bool,
    charts: bool,
    extra: Vec<BuiltinDetector>,
    pattern_filter: Option<Vec<PatternKind>>,
    min_strength: Option<Strength>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: config::EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sma_periods(mut self, periods: impl IntoIterator<Item = Period>) -> Self {
        self.config.sma_periods = periods.into_iter().collect();
        self
    }

    pub fn ema_periods(mut self, periods: impl IntoIterator<Item = Period>) -> Self {
        self.config.ema_periods = periods.into_iter().collect();
        self
    }

    pub fn rsi_periods(mut self, periods: impl IntoIterator<Item = Period>) -> Self {
        self.config.rsi_periods = periods.into_iter().collect();
        self
    }

    pub fn kdj(mut self, params: indicators::KdjParams) -> Self {
        self.config.kdj = params;
        self
    }

    pub fn macd(mut self, params: indicators::MacdParams) -> Self {
        self.config.macd = params;
        self
    }

    pub fn bollinger(mut self, params: indicators::BollingerParams) -> Self {
        self.config.bollinger = params;
        self
    }

    pub fn patterns(mut self, params: config::PatternConfig) -> Self {
        self.config.patterns = params;
        self
    }

    /// Add every builtin candlestick and chart detector
    pub fn with_all_detectors(self) -> Self {
        self.with_candlestick_detectors().with_chart_detectors()
    }

    /// Add single-bar and three-bar detectors with defaults
    pub fn with_candlestick_detectors(mut self) -> Self {
        self.candlesticks = true;
        self
    }

    /// Add chart detectors, configured from the pattern settings at build time
    pub fn with_chart_detectors(mut self) -> Self {
        self.charts = true;
        self
    }

    /// Add a single builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.extra.push(detector);
        self
    }

    /// Set minimum strength filter. Matches without a strength (triangles)
    /// always pass.
    pub fn min_strength(mut self, strength: Strength) -> Self {
        self.min_strength = Some(strength);
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, kinds: impl IntoIterator<Item = PatternKind>) -> Self {
        self.pattern_filter = Some(kinds.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<IndicatorEngine> {
        let patterns = &self.config.patterns;
        let mut detectors = Vec::new();
        if self.candlesticks {
            detectors.extend(candlestick_defaults());
        }
        if self.charts {
            detectors.extend(chart_detectors(patterns));
        }
        detectors.extend(self.extra);

        let engine = IndicatorEngine {
            context: TrendContext {
                window: patterns.context_window,
                threshold: patterns.context_threshold,
            },
            config: self.config,
            detectors,
            pattern_filter: self.pattern_filter,
            min_strength: self.min_strength,
        };
        engine.validate()?;
        tracing::debug!(detectors = engine.detectors.len(), "indicator engine built");
        Ok(engine)
    }
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

fn candlestick_defaults() -> [BuiltinDetector; 11] {
    builtin_defaults![
        Doji,
        GravestoneDoji,
        DragonflyDoji,
        Hammer,
        HangingMan,
        InvertedHammer,
        ShootingStar,
        MorningStar,
        EveningStar,
        ThreeWhiteSoldiers,
        ThreeBlackCrows,
    ]
}

fn chart_detectors(cfg: &config::PatternConfig) -> [BuiltinDetector; 7] {
    [
        BuiltinDetector::HeadAndShoulders(HeadAndShouldersDetector::from_config(cfg)),
        BuiltinDetector::InverseHeadAndShoulders(InverseHeadAndShouldersDetector::from_config(cfg)),
        BuiltinDetector::DoubleTop(DoubleTopDetector::from_config(cfg)),
        BuiltinDetector::DoubleBottom(DoubleBottomDetector::from_config(cfg)),
        BuiltinDetector::SymmetricalTriangle(SymmetricalTriangleDetector::from_config(cfg)),
        BuiltinDetector::AscendingTriangle(AscendingTriangleDetector::from_config(cfg)),
        BuiltinDetector::DescendingTriangle(DescendingTriangleDetector::from_config(cfg)),
    ]
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Result of analysing a single instrument
#[derive(Debug)]
pub struct AnalysisResult {
    pub symbol: String,
    pub report: IndicatorReport,
    pub patterns: Vec<PatternMatch>,
}

/// Error from analysing a single instrument
#[derive(Debug)]
pub struct AnalysisError {
    pub symbol: String,
    pub error: TaError,
}

/// Parallel analysis of multiple instruments
pub fn analyze_parallel<'a, T, I>(
    engine: &IndicatorEngine,
    instruments: I,
) -> (Vec<AnalysisResult>, Vec<AnalysisError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| match validate_bars(bars) {
            Ok(()) => Ok(AnalysisResult {
                symbol: symbol.to_string(),
                report: engine.analyze_valid(bars),
                patterns: engine.detect_valid(bars),
            }),
            Err(error) => Err(AnalysisError {
                symbol: symbol.to_string(),
                error,
            }),
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
