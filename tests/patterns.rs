//! Integration tests for candlestick and chart pattern detection.
//!
//! Bars come from a caller-defined type to exercise the `OHLCV` trait seam.

use kline_ta::prelude::*;

/// Minimal bar type owned by the caller
#[derive(Debug, Clone, Copy)]
struct TestBar {
    day: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl OHLCV for TestBar {
    fn date(&self) -> i64 {
        self.day
    }

    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        1000.0
    }
}

/// Bars with the given closes, each opening 0.5 above its close
fn falling(closes: &[f64]) -> Vec<TestBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| TestBar { day: i as i64, o: c + 0.5, h: c + 1.0, l: c - 1.0, c })
        .collect()
}

/// Bars with the given closes, each opening 0.5 below its close
fn rising(closes: &[f64]) -> Vec<TestBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| TestBar { day: i as i64, o: c - 0.5, h: c + 1.0, l: c - 1.0, c })
        .collect()
}

fn push(bars: &mut Vec<TestBar>, o: f64, h: f64, l: f64, c: f64) {
    let day = bars.len() as i64;
    bars.push(TestBar { day, o, h, l, c });
}

fn kinds_at(matches: &[PatternMatch], index: usize) -> Vec<PatternKind> {
    matches.iter().filter(|m| m.end_index == index).map(|m| m.kind).collect()
}

fn candlestick_engine() -> IndicatorEngine {
    EngineBuilder::new().with_candlestick_detectors().build().unwrap()
}

// ============================================================
// SINGLE BAR PATTERN TESTS
// ============================================================

#[test]
fn test_hammer_after_decline() {
    let mut bars = falling(&[100.0, 98.0, 96.0, 94.0, 92.0]);
    push(&mut bars, 90.0, 90.6, 87.0, 90.5);

    let matches = candlestick_engine().detect_patterns_in(&bars).unwrap();
    let hammer = matches
        .iter()
        .find(|m| m.kind == PatternKind::Hammer)
        .expect("hammer after five falling closes");
    assert_eq!((hammer.start_index, hammer.end_index), (5, 5));
    assert_eq!(hammer.direction, Direction::Bullish);
    assert_eq!(hammer.trend_context, Trend::Down);
    assert!(!kinds_at(&matches, 5).contains(&PatternKind::HangingMan));
}

#[test]
fn test_same_shape_after_rally_is_hanging_man() {
    let mut bars = rising(&[80.0, 82.0, 84.0, 86.0, 88.0]);
    push(&mut bars, 90.0, 90.6, 87.0, 90.5);

    let kinds = kinds_at(&candlestick_engine().detect_patterns_in(&bars).unwrap(), 5);
    assert!(kinds.contains(&PatternKind::HangingMan));
    assert!(!kinds.contains(&PatternKind::Hammer));
}

#[test]
fn test_hammer_without_trend_is_not_reported() {
    let mut bars = falling(&[90.0, 90.0, 90.0, 90.0, 90.0]);
    push(&mut bars, 90.0, 90.6, 87.0, 90.5);

    let kinds = kinds_at(&candlestick_engine().detect_patterns_in(&bars).unwrap(), 5);
    assert!(!kinds.contains(&PatternKind::Hammer));
    assert!(!kinds.contains(&PatternKind::HangingMan));
}

#[test]
fn test_doji_is_not_a_hammer() {
    let mut bars = falling(&[100.0, 98.0, 96.0, 94.0, 92.0]);
    push(&mut bars, 90.0, 100.0, 80.0, 90.0);

    let kinds = kinds_at(&candlestick_engine().detect_patterns_in(&bars).unwrap(), 5);
    assert!(kinds.contains(&PatternKind::Doji));
    assert!(!kinds.contains(&PatternKind::Hammer));
    assert!(!kinds.contains(&PatternKind::InvertedHammer));
}

#[test]
fn test_hammer_after_shallow_decline() {
    let mut bars = falling(&[100.0, 99.9, 99.8, 99.7, 99.6]);
    push(&mut bars, 99.0, 100.0, 90.0, 100.0);

    let matches = candlestick_engine().detect_patterns_in(&bars).unwrap();
    let hammer = matches
        .iter()
        .find(|m| m.kind == PatternKind::Hammer && m.end_index == 5)
        .expect("hammer after a gentle strictly falling run");
    assert_eq!(hammer.trend_context, Trend::Down);
}

#[test]
fn test_doji_with_short_upper_shadow() {
    let mut bars = falling(&[100.0, 100.0]);
    push(&mut bars, 100.0, 100.4, 90.0, 100.0);

    let kinds = kinds_at(&candlestick_engine().detect_patterns_in(&bars).unwrap(), 2);
    assert!(kinds.contains(&PatternKind::Doji));
    assert!(!kinds.contains(&PatternKind::DragonflyDoji));
    assert!(!kinds.contains(&PatternKind::GravestoneDoji));
}

#[test]
fn test_shooting_star_after_rally() {
    let mut bars = rising(&[80.0, 82.0, 84.0, 86.0, 88.0]);
    push(&mut bars, 90.0, 93.5, 89.4, 89.5);

    let matches = candlestick_engine().detect_patterns_in(&bars).unwrap();
    let star = matches.iter().find(|m| m.kind == PatternKind::ShootingStar).unwrap();
    assert_eq!(star.direction, Direction::Bearish);
    assert_eq!(star.trend_context, Trend::Up);
}

// ============================================================
// THREE BAR PATTERN TESTS
// ============================================================

#[test]
fn test_morning_star_through_engine() {
    let mut bars = falling(&[120.0, 118.0, 116.0, 114.0, 112.0]);
    push(&mut bars, 110.0, 111.0, 99.0, 100.0);
    push(&mut bars, 99.0, 100.0, 97.0, 98.5);
    push(&mut bars, 99.0, 109.5, 98.5, 109.0);

    let engine = EngineBuilder::new()
        .with_candlestick_detectors()
        .only_patterns([PatternKind::MorningStar])
        .build()
        .unwrap();
    let matches = engine.detect_patterns_in(&bars).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].start_index, matches[0].end_index), (5, 7));
}

// ============================================================
// CHART PATTERN TESTS
// ============================================================

fn converging(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            TestBar { day: 20240101 + i as i64, o: 100.0, h: 110.0 - 0.3 * x, l: 90.0 + 0.3 * x, c: 100.0 }
        })
        .collect()
}

#[test]
fn test_triangle_reported_once() {
    let bars = converging(34);
    let engine = EngineBuilder::new()
        .with_chart_detectors()
        .only_patterns([PatternKind::SymmetricalTriangle])
        .build()
        .unwrap();

    let matches = engine.detect_patterns_in(&bars).unwrap();
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!((m.start_index, m.end_index), (0, 29));
    assert_eq!(m.strength, None);
    assert_eq!(m.direction, Direction::Neutral);
}

#[test]
fn test_min_strength_keeps_triangles() {
    let engine = EngineBuilder::new()
        .with_chart_detectors()
        .only_patterns([PatternKind::SymmetricalTriangle])
        .min_strength(Strength::Strong)
        .build()
        .unwrap();

    let matches = engine.detect_patterns_in(&converging(34)).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].strength, None);
}

#[test]
fn test_chart_window_follows_config() {
    let bars = converging(30);
    let patterns = kline_ta::config::PatternConfig {
        window: Period::new(20).unwrap(),
        ..Default::default()
    };
    let engine = EngineBuilder::new()
        .patterns(patterns)
        .with_chart_detectors()
        .only_patterns([PatternKind::SymmetricalTriangle])
        .build()
        .unwrap();

    let matches = engine.detect_patterns_in(&bars).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].start_index, matches[0].end_index), (0, 19));
}

#[test]
fn test_no_chart_patterns_below_window() {
    let bars = converging(29);
    let engine = EngineBuilder::new().with_chart_detectors().build().unwrap();
    assert!(engine.detect_patterns_in(&bars).unwrap().is_empty());
}

// ============================================================
// ENGINE TESTS
// ============================================================

#[test]
fn test_all_matches_within_bounds() {
    let mut price = 100.0;
    let bars: Vec<TestBar> = (0..300)
        .map(|i| {
            let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0;
            let o = price;
            let c = price + change;
            price = c;
            TestBar { day: i as i64, o, h: o.max(c) + 0.8, l: o.min(c) - 0.8, c }
        })
        .collect();

    let engine = EngineBuilder::new().with_all_detectors().build().unwrap();
    let matches = engine.detect_patterns_in(&bars).unwrap();
    for m in &matches {
        assert!(m.start_index <= m.end_index);
        assert!(m.end_index < bars.len());
        assert_eq!(m.direction, m.kind.typical_direction());
    }
}

#[test]
fn test_min_strength_filter() {
    let mut bars = falling(&[100.0, 98.0, 96.0, 94.0, 92.0]);
    push(&mut bars, 90.0, 92.0, 88.0, 90.0);

    let engine = EngineBuilder::new()
        .with_candlestick_detectors()
        .min_strength(Strength::Strong)
        .build()
        .unwrap();
    let matches = engine.detect_patterns_in(&bars).unwrap();
    assert!(matches.iter().all(|m| m.strength == Some(Strength::Strong)));
}

#[test]
fn test_invalid_bars_rejected() {
    let mut bars = falling(&[100.0, 98.0, 96.0]);
    bars[1].h = bars[1].l - 1.0;
    let err = candlestick_engine().detect_patterns_in(&bars).unwrap_err();
    assert!(matches!(err, TaError::InvalidBar { index: 1, .. }));

    let mut bars = falling(&[100.0, 98.0, 96.0]);
    bars[2].day = bars[1].day;
    assert!(matches!(
        candlestick_engine().detect_patterns_in(&bars),
        Err(TaError::InvalidBar { index: 2, .. })
    ));
}

#[test]
fn test_empty_series() {
    let bars: Vec<TestBar> = Vec::new();
    let engine = EngineBuilder::new().with_all_detectors().build().unwrap();
    assert!(engine.detect_patterns_in(&bars).unwrap().is_empty());
}
