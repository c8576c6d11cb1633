//! Report types returned by the engine

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::detectors::TrendAnalysis;
use crate::indicators::VolumeAnalysis;
use crate::signals::Signal;
use crate::{Direction, PatternMatch, Trend};

/// Series shorter than this produce an empty pattern report
pub const MIN_RECOGNITION_BARS: usize = 5;

/// Names under which the engine files indicator entries
pub mod keys {
    use crate::Period;

    pub const KDJ_K: &str = "KDJ.K";
    pub const KDJ_D: &str = "KDJ.D";
    pub const KDJ_J: &str = "KDJ.J";
    pub const MACD_DIF: &str = "MACD.DIF";
    pub const MACD_DEA: &str = "MACD.DEA";
    pub const MACD_HIST: &str = "MACD.HIST";
    pub const BOLL_UPPER: &str = "BOLL.UPPER";
    pub const BOLL_MIDDLE: &str = "BOLL.MIDDLE";
    pub const BOLL_LOWER: &str = "BOLL.LOWER";

    pub fn sma(period: Period) -> String {
        format!("SMA{}", period.get())
    }

    pub fn ema(period: Period) -> String {
        format!("EMA{}", period.get())
    }

    pub fn rsi(period: Period) -> String {
        format!("RSI{}", period.get())
    }

    pub fn ma_cross(short: Period, long: Period) -> String {
        format!("SMA{}xSMA{}", short.get(), long.get())
    }
}

/// Latest value of one indicator with its classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorEntry {
    pub value: Option<f64>,
    pub signal: Option<Signal>,
    pub label: String,
}

impl IndicatorEntry {
    pub(crate) fn new(
        value: Option<f64>,
        signal: Option<Signal>,
        title: &str,
        note: Option<&str>,
    ) -> Self {
        let label = match (value, note) {
            (Some(v), Some(note)) => format!("{title} {v:.2} ({note})"),
            (Some(v), None) => format!("{title} {v:.2}"),
            (None, _) => format!("{title}: insufficient history"),
        };
        Self {
            value,
            signal,
            label,
        }
    }
}

/// Indicator snapshot at the latest bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReport {
    pub date: Option<i64>,
    pub close: Option<f64>,
    pub bars: usize,
    pub entries: BTreeMap<String, IndicatorEntry>,
    /// Composite vote behind `overall`
    pub score: i32,
    pub overall: Signal,
}

impl IndicatorReport {
    pub fn get(&self, name: &str) -> Option<&IndicatorEntry> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|e| e.value)
    }

    pub fn signal(&self, name: &str) -> Option<Signal> {
        self.get(name).and_then(|e| e.signal)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndicatorEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Signal names grouped by direction, deduplicated and sorted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub bullish: Vec<String>,
    pub bearish: Vec<String>,
    pub neutral: Vec<String>,
    pub overall: Direction,
}

impl Default for PatternSummary {
    fn default() -> Self {
        Self {
            bullish: Vec::new(),
            bearish: Vec::new(),
            neutral: Vec::new(),
            overall: Direction::Neutral,
        }
    }
}

/// Patterns with volume and trend analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PatternReport {
    pub patterns: Vec<PatternMatch>,
    pub volume: Option<VolumeAnalysis>,
    pub trend: Option<TrendAnalysis>,
    pub summary: PatternSummary,
}

impl PatternReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        patterns: Vec<PatternMatch>,
        volume: Option<VolumeAnalysis>,
        trend: Option<TrendAnalysis>,
    ) -> Self {
        let mut bullish = BTreeSet::new();
        let mut bearish = BTreeSet::new();
        let mut neutral = BTreeSet::new();

        for m in &patterns {
            let name = m.kind.as_str().to_string();
            match m.direction {
                Direction::Bullish => bullish.insert(name),
                Direction::Bearish => bearish.insert(name),
                Direction::Neutral => neutral.insert(name),
            };
        }

        match volume.map(|v| v.price_volume) {
            Some(Direction::Bullish) => {
                bullish.insert("volume_bullish".to_string());
            }
            Some(Direction::Bearish) => {
                bearish.insert("volume_bearish".to_string());
            }
            _ => {}
        }

        match trend.map(|t| t.trend) {
            Some(Trend::Up) => {
                bullish.insert("uptrend".to_string());
            }
            Some(Trend::Down) => {
                bearish.insert("downtrend".to_string());
            }
            _ => {}
        }

        let overall = overall_direction(bullish.len(), bearish.len());
        Self {
            patterns,
            volume,
            trend,
            summary: PatternSummary {
                bullish: bullish.into_iter().collect(),
                bearish: bearish.into_iter().collect(),
                neutral: neutral.into_iter().collect(),
                overall,
            },
        }
    }
}

/// Majority with a margin of more than one; otherwise one-sided evidence wins.
pub fn overall_direction(bullish: usize, bearish: usize) -> Direction {
    if bullish > bearish + 1 {
        Direction::Bullish
    } else if bearish > bullish + 1 {
        Direction::Bearish
    } else if bullish > 0 && bearish == 0 {
        Direction::Bullish
    } else if bearish > 0 && bullish == 0 {
        Direction::Bearish
    } else {
        Direction::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatternKind, Period};

    #[test]
    fn test_keys() {
        assert_eq!(keys::sma(Period::new_const(5)), "SMA5");
        assert_eq!(keys::rsi(Period::new_const(14)), "RSI14");
        assert_eq!(
            keys::ma_cross(Period::new_const(5), Period::new_const(10)),
            "SMA5xSMA10"
        );
    }

    #[test]
    fn test_entry_labels() {
        let entry = IndicatorEntry::new(Some(72.346), Some(Signal::Sell), "RSI14", Some("overbought"));
        assert_eq!(entry.label, "RSI14 72.35 (overbought)");
        let missing = IndicatorEntry::new(None, None, "SMA60", None);
        assert_eq!(missing.label, "SMA60: insufficient history");
    }

    #[test]
    fn test_overall_direction() {
        assert_eq!(overall_direction(3, 1), Direction::Bullish);
        assert_eq!(overall_direction(1, 3), Direction::Bearish);
        assert_eq!(overall_direction(1, 0), Direction::Bullish);
        assert_eq!(overall_direction(0, 1), Direction::Bearish);
        assert_eq!(overall_direction(2, 1), Direction::Neutral);
        assert_eq!(overall_direction(0, 0), Direction::Neutral);
    }

    #[test]
    fn test_summary_dedupes_names() {
        let m = PatternMatch::new(PatternKind::Hammer, 3, 3, None, Trend::Down);
        let report = PatternReport::new(vec![m, PatternMatch { start_index: 7, end_index: 7, ..m }], None, None);
        assert_eq!(report.summary.bullish, vec!["hammer".to_string()]);
        assert!(report.summary.bearish.is_empty());
        assert_eq!(report.summary.overall, Direction::Bullish);
    }

    #[test]
    fn test_empty_report() {
        let report = PatternReport::empty();
        assert!(report.patterns.is_empty());
        assert!(report.volume.is_none());
        assert_eq!(report.summary.overall, Direction::Neutral);
    }
}
