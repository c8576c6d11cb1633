//! Three-bar candlestick pattern detectors
//!
//! Morning Star, Evening Star, Three White Soldiers, Three Black Crows.

use super::helpers;
use crate::{MarketContext, OHLCVExt, PatternDetector, PatternKind, PatternMatch, Strength, OHLCV};

impl_with_defaults!(
    MorningStarDetector,
    EveningStarDetector,
    ThreeWhiteSoldiersDetector,
    ThreeBlackCrowsDetector,
);

// ============================================================
// MORNING STAR / EVENING STAR
// ============================================================

/// Morning Star - bearish candle, small star below its body, bullish
/// candle closing above the midpoint of the first body
#[derive(Debug, Clone, Copy)]
pub struct MorningStarDetector {
    pub star_body_factor: f64,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self {
            star_body_factor: helpers::STAR_BODY_FACTOR,
        }
    }
}

impl PatternDetector for MorningStarDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::MorningStar
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        if index < 2 {
            return None;
        }
        let first = bars.get(index - 2)?;
        let star = bars.get(index - 1)?;
        let third = bars.get(index)?;

        if !first.is_bearish() || !third.is_bullish() {
            return None;
        }
        let first_body = first.body();
        if star.body() >= first_body * self.star_body_factor {
            return None;
        }
        // Star body sits at or below the first close
        if star.open().max(star.close()) > first.close() {
            return None;
        }
        let midpoint = (first.open() + first.close()) / 2.0;
        if third.close() <= midpoint {
            return None;
        }

        let penetration = (third.close() - first.close()) / first_body;
        Some(PatternMatch::new(
            self.kind(),
            index - 2,
            index,
            Some(Strength::from_score((penetration - 0.5) * 2.0)),
            ctx.trend,
        ))
    }
}

/// Evening Star - bullish candle, small star above its body, bearish
/// candle closing below the midpoint of the first body
#[derive(Debug, Clone, Copy)]
pub struct EveningStarDetector {
    pub star_body_factor: f64,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self {
            star_body_factor: helpers::STAR_BODY_FACTOR,
        }
    }
}

impl PatternDetector for EveningStarDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::EveningStar
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        if index < 2 {
            return None;
        }
        let first = bars.get(index - 2)?;
        let star = bars.get(index - 1)?;
        let third = bars.get(index)?;

        if !first.is_bullish() || !third.is_bearish() {
            return None;
        }
        let first_body = first.body();
        if star.body() >= first_body * self.star_body_factor {
            return None;
        }
        if star.open().min(star.close()) < first.close() {
            return None;
        }
        let midpoint = (first.open() + first.close()) / 2.0;
        if third.close() >= midpoint {
            return None;
        }

        let penetration = (first.close() - third.close()) / first_body;
        Some(PatternMatch::new(
            self.kind(),
            index - 2,
            index,
            Some(Strength::from_score((penetration - 0.5) * 2.0)),
            ctx.trend,
        ))
    }
}

// ============================================================
// THREE WHITE SOLDIERS / THREE BLACK CROWS
// ============================================================

/// Three White Soldiers - three advancing bullish candles with growing
/// bodies and short upper shadows
#[derive(Debug, Clone, Copy)]
pub struct ThreeWhiteSoldiersDetector {
    pub shadow_factor: f64,
}

impl Default for ThreeWhiteSoldiersDetector {
    fn default() -> Self {
        Self {
            shadow_factor: helpers::SOLDIER_SHADOW_FACTOR,
        }
    }
}

impl PatternDetector for ThreeWhiteSoldiersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::ThreeWhiteSoldiers
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        if index < 2 {
            return None;
        }
        let window = bars.get(index - 2..=index)?;
        let [a, b, c] = window else { return None };

        if !(a.is_bullish() && b.is_bullish() && c.is_bullish()) {
            return None;
        }
        if !(c.body() > b.body() && b.body() > a.body()) {
            return None;
        }
        if !(c.close() > b.close() && b.close() > a.close()) {
            return None;
        }
        if window.iter().any(|bar| bar.upper_shadow() >= bar.body() * self.shadow_factor) {
            return None;
        }

        Some(PatternMatch::new(
            self.kind(),
            index - 2,
            index,
            Some(solidity(window)),
            ctx.trend,
        ))
    }
}

/// Three Black Crows - three declining bearish candles with growing
/// bodies and short lower shadows
#[derive(Debug, Clone, Copy)]
pub struct ThreeBlackCrowsDetector {
    pub shadow_factor: f64,
}

impl Default for ThreeBlackCrowsDetector {
    fn default() -> Self {
        Self {
            shadow_factor: helpers::SOLDIER_SHADOW_FACTOR,
        }
    }
}

impl PatternDetector for ThreeBlackCrowsDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::ThreeBlackCrows
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        if index < 2 {
            return None;
        }
        let window = bars.get(index - 2..=index)?;
        let [a, b, c] = window else { return None };

        if !(a.is_bearish() && b.is_bearish() && c.is_bearish()) {
            return None;
        }
        if !(c.body() > b.body() && b.body() > a.body()) {
            return None;
        }
        if !(c.close() < b.close() && b.close() < a.close()) {
            return None;
        }
        if window.iter().any(|bar| bar.lower_shadow() >= bar.body() * self.shadow_factor) {
            return None;
        }

        Some(PatternMatch::new(
            self.kind(),
            index - 2,
            index,
            Some(solidity(window)),
            ctx.trend,
        ))
    }
}

/// Weakest body-to-range share across the candles.
fn solidity<T: OHLCV>(window: &[T]) -> Strength {
    let weakest = window
        .iter()
        .map(|bar| bar.body_ratio().unwrap_or(0.0))
        .fold(f64::INFINITY, f64::min);
    Strength::from_score(weakest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bar, Direction, Trend};

    fn ctx() -> MarketContext {
        MarketContext { trend: Trend::Sideways }
    }

    fn bar(date: i64, o: f64, h: f64, l: f64, c: f64) -> Bar {
        Bar::new(date, o, h, l, c, 1000.0)
    }

    #[test]
    fn test_morning_star() {
        let bars = [
            bar(1, 110.0, 111.0, 99.0, 100.0),
            bar(2, 99.0, 100.0, 97.0, 98.5),
            bar(3, 99.0, 109.5, 98.5, 109.0),
        ];
        let m = MorningStarDetector::default().detect(&bars, 2, &ctx()).unwrap();
        assert_eq!(m.kind, PatternKind::MorningStar);
        assert_eq!(m.direction, Direction::Bullish);
        assert_eq!((m.start_index, m.end_index), (0, 2));
        assert_eq!(m.strength, Some(Strength::Strong));
    }

    #[test]
    fn test_morning_star_needs_recovery_past_midpoint() {
        let bars = [
            bar(1, 110.0, 111.0, 99.0, 100.0),
            bar(2, 99.0, 100.0, 97.0, 98.5),
            bar(3, 99.0, 104.5, 98.5, 104.0),
        ];
        assert!(MorningStarDetector::default().detect(&bars, 2, &ctx()).is_none());
    }

    #[test]
    fn test_evening_star() {
        let bars = [
            bar(1, 100.0, 111.0, 99.0, 110.0),
            bar(2, 111.0, 113.0, 110.0, 111.5),
            bar(3, 111.0, 111.5, 100.5, 101.0),
        ];
        let m = EveningStarDetector::default().detect(&bars, 2, &ctx()).unwrap();
        assert_eq!(m.direction, Direction::Bearish);
        assert!(MorningStarDetector::default().detect(&bars, 2, &ctx()).is_none());
    }

    #[test]
    fn test_three_white_soldiers() {
        let bars = [
            bar(1, 100.0, 102.2, 99.8, 102.0),
            bar(2, 101.5, 104.8, 101.3, 104.6),
            bar(3, 104.0, 108.2, 103.8, 108.0),
        ];
        let m = ThreeWhiteSoldiersDetector::default().detect(&bars, 2, &ctx()).unwrap();
        assert_eq!(m.kind, PatternKind::ThreeWhiteSoldiers);
        assert_eq!(m.start_index, 0);
        assert!(ThreeBlackCrowsDetector::default().detect(&bars, 2, &ctx()).is_none());
    }

    #[test]
    fn test_soldiers_reject_shrinking_bodies() {
        let bars = [
            bar(1, 100.0, 104.2, 99.8, 104.0),
            bar(2, 103.5, 106.1, 103.3, 106.0),
            bar(3, 105.5, 107.1, 105.3, 107.0),
        ];
        assert!(ThreeWhiteSoldiersDetector::default().detect(&bars, 2, &ctx()).is_none());
    }

    #[test]
    fn test_three_black_crows() {
        let bars = [
            bar(1, 108.0, 108.2, 105.8, 106.0),
            bar(2, 106.5, 106.7, 103.3, 103.5),
            bar(3, 104.0, 104.2, 99.8, 100.0),
        ];
        let m = ThreeBlackCrowsDetector::default().detect(&bars, 2, &ctx()).unwrap();
        assert_eq!(m.direction, Direction::Bearish);
    }

    #[test]
    fn test_needs_three_bars() {
        let bars = [bar(1, 100.0, 102.2, 99.8, 102.0)];
        assert!(ThreeWhiteSoldiersDetector::default().detect(&bars, 0, &ctx()).is_none());
        assert!(MorningStarDetector::default().detect(&bars, 0, &ctx()).is_none());
    }
}
