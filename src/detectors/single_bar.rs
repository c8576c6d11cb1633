//! Single-bar candlestick pattern detectors
//!
//! Doji family: Doji, Gravestone Doji, Dragonfly Doji.
//! Hammer family: Hammer, Hanging Man, Inverted Hammer, Shooting Star. The
//! hammer family shares one geometry per side; the preceding trend decides
//! which name applies.

use super::helpers::{self, is_doji_body, is_tiny_shadow, HammerShape};
use crate::{
    MarketContext, OHLCVExt, PatternDetector, PatternKind, PatternMatch, Strength, Trend, OHLCV,
};

impl_with_defaults!(
    DojiDetector,
    GravestoneDojiDetector,
    DragonflyDojiDetector,
    HammerDetector,
    HangingManDetector,
    InvertedHammerDetector,
    ShootingStarDetector,
);

// ============================================================
// DOJI FAMILY
// ============================================================

/// Doji - tiny body with shadows on both sides
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub doji_ratio: f64,
    pub tiny_shadow_ratio: f64,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
            tiny_shadow_ratio: helpers::SHADOW_TINY_RATIO,
        }
    }
}

impl PatternDetector for DojiDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Doji
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        let range = bar.range();

        if !is_doji_body(body, range, self.doji_ratio) {
            return None;
        }
        if is_tiny_shadow(bar.upper_shadow(), range, self.tiny_shadow_ratio)
            || is_tiny_shadow(bar.lower_shadow(), range, self.tiny_shadow_ratio)
        {
            return None;
        }

        let score = 1.0 - body / range / self.doji_ratio;
        Some(PatternMatch::new(
            self.kind(),
            index,
            index,
            Some(Strength::from_score(score)),
            ctx.trend,
        ))
    }
}

/// Gravestone Doji - tiny body at the low with a long upper shadow
#[derive(Debug, Clone, Copy)]
pub struct GravestoneDojiDetector {
    pub doji_ratio: f64,
    pub tiny_shadow_ratio: f64,
}

impl Default for GravestoneDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
            tiny_shadow_ratio: helpers::SHADOW_TINY_RATIO,
        }
    }
}

impl PatternDetector for GravestoneDojiDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::GravestoneDoji
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let range = bar.range();
        let upper = bar.upper_shadow();

        if !is_doji_body(bar.body(), range, self.doji_ratio)
            || !is_tiny_shadow(bar.lower_shadow(), range, self.tiny_shadow_ratio)
            || is_tiny_shadow(upper, range, self.tiny_shadow_ratio)
        {
            return None;
        }

        Some(PatternMatch::new(
            self.kind(),
            index,
            index,
            Some(Strength::from_score(upper / range)),
            ctx.trend,
        ))
    }
}

/// Dragonfly Doji - tiny body at the high with a long lower shadow
#[derive(Debug, Clone, Copy)]
pub struct DragonflyDojiDetector {
    pub doji_ratio: f64,
    pub tiny_shadow_ratio: f64,
}

impl Default for DragonflyDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
            tiny_shadow_ratio: helpers::SHADOW_TINY_RATIO,
        }
    }
}

impl PatternDetector for DragonflyDojiDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DragonflyDoji
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let range = bar.range();
        let lower = bar.lower_shadow();

        if !is_doji_body(bar.body(), range, self.doji_ratio)
            || !is_tiny_shadow(bar.upper_shadow(), range, self.tiny_shadow_ratio)
            || is_tiny_shadow(lower, range, self.tiny_shadow_ratio)
        {
            return None;
        }

        Some(PatternMatch::new(
            self.kind(),
            index,
            index,
            Some(Strength::from_score(lower / range)),
            ctx.trend,
        ))
    }
}

// ============================================================
// HAMMER FAMILY
// ============================================================

/// Long lower shadow (hammer side) or long upper shadow (inverted side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
}

fn detect_hammer_family<T: OHLCV>(
    shape: &HammerShape,
    side: Side,
    required: Trend,
    kind: PatternKind,
    bars: &[T],
    index: usize,
    ctx: &MarketContext,
) -> Option<PatternMatch> {
    if ctx.trend != required {
        return None;
    }
    let bar = bars.get(index)?;
    let range = bar.range();
    let (long, short) = match side {
        Side::Lower => (bar.lower_shadow(), bar.upper_shadow()),
        Side::Upper => (bar.upper_shadow(), bar.lower_shadow()),
    };

    if !shape.matches(bar.body(), range, long, short) {
        return None;
    }

    Some(PatternMatch::new(
        kind,
        index,
        index,
        Some(Strength::from_score(long / range)),
        ctx.trend,
    ))
}

/// Hammer - long lower shadow after a decline
#[derive(Debug, Clone, Copy, Default)]
pub struct HammerDetector {
    pub shape: HammerShape,
}

impl PatternDetector for HammerDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Hammer
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        detect_hammer_family(&self.shape, Side::Lower, Trend::Down, self.kind(), bars, index, ctx)
    }
}

/// Hanging Man - hammer geometry after an advance
#[derive(Debug, Clone, Copy, Default)]
pub struct HangingManDetector {
    pub shape: HammerShape,
}

impl PatternDetector for HangingManDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::HangingMan
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        detect_hammer_family(&self.shape, Side::Lower, Trend::Up, self.kind(), bars, index, ctx)
    }
}

/// Inverted Hammer - long upper shadow after a decline
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedHammerDetector {
    pub shape: HammerShape,
}

impl PatternDetector for InvertedHammerDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::InvertedHammer
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        detect_hammer_family(&self.shape, Side::Upper, Trend::Down, self.kind(), bars, index, ctx)
    }
}

/// Shooting Star - inverted hammer geometry after an advance
#[derive(Debug, Clone, Copy, Default)]
pub struct ShootingStarDetector {
    pub shape: HammerShape,
}

impl PatternDetector for ShootingStarDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::ShootingStar
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(
        &self,
        bars: &[T],
        index: usize,
        ctx: &MarketContext,
    ) -> Option<PatternMatch> {
        detect_hammer_family(&self.shape, Side::Upper, Trend::Up, self.kind(), bars, index, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bar, Direction};

    fn ctx(trend: Trend) -> MarketContext {
        MarketContext { trend }
    }

    #[test]
    fn test_doji() {
        let bars = [Bar::new(1, 100.0, 110.0, 90.0, 100.0, 0.0)];
        let m = DojiDetector::default().detect(&bars, 0, &ctx(Trend::Sideways)).unwrap();
        assert_eq!(m.kind, PatternKind::Doji);
        assert_eq!(m.direction, Direction::Neutral);
        assert_eq!(m.strength, Some(Strength::Strong));
        assert_eq!((m.start_index, m.end_index), (0, 0));
    }

    #[test]
    fn test_doji_rejects_flat_bar() {
        let bars = [Bar::new(1, 100.0, 100.0, 100.0, 100.0, 0.0)];
        assert!(DojiDetector::default().detect(&bars, 0, &ctx(Trend::Sideways)).is_none());
    }

    #[test]
    fn test_gravestone_and_dragonfly() {
        let gravestone = [Bar::new(1, 100.0, 110.0, 100.0, 100.0, 0.0)];
        let dragonfly = [Bar::new(1, 100.0, 100.0, 90.0, 100.0, 0.0)];
        let c = ctx(Trend::Sideways);

        assert!(GravestoneDojiDetector::default().detect(&gravestone, 0, &c).is_some());
        assert!(DojiDetector::default().detect(&gravestone, 0, &c).is_none());
        assert!(DragonflyDojiDetector::default().detect(&gravestone, 0, &c).is_none());

        let m = DragonflyDojiDetector::default().detect(&dragonfly, 0, &c).unwrap();
        assert_eq!(m.direction, Direction::Bullish);
        assert!(GravestoneDojiDetector::default().detect(&dragonfly, 0, &c).is_none());
    }

    #[test]
    fn test_short_upper_shadow_is_plain_doji() {
        // body 0, upper 0.4, lower 10
        let bars = [Bar::new(1, 100.0, 100.4, 90.0, 100.0, 1.0)];
        let c = ctx(Trend::Sideways);

        assert!(DojiDetector::default().detect(&bars, 0, &c).is_some());
        assert!(DragonflyDojiDetector::default().detect(&bars, 0, &c).is_none());
        assert!(GravestoneDojiDetector::default().detect(&bars, 0, &c).is_none());
    }

    #[test]
    fn test_hammer_requires_downtrend() {
        // body 1 at the top, lower shadow 9, upper 0.5
        let bars = [Bar::new(1, 99.0, 100.5, 90.0, 100.0, 0.0)];

        let m = HammerDetector::default().detect(&bars, 0, &ctx(Trend::Down)).unwrap();
        assert_eq!(m.kind, PatternKind::Hammer);
        assert_eq!(m.trend_context, Trend::Down);
        assert_eq!(m.strength, Some(Strength::Strong));

        assert!(HammerDetector::default().detect(&bars, 0, &ctx(Trend::Up)).is_none());
        assert!(HammerDetector::default().detect(&bars, 0, &ctx(Trend::Sideways)).is_none());

        let m = HangingManDetector::default().detect(&bars, 0, &ctx(Trend::Up)).unwrap();
        assert_eq!(m.direction, Direction::Bearish);
    }

    #[test]
    fn test_inverted_family() {
        // body 1 at the bottom, upper shadow 9, lower 0.5
        let bars = [Bar::new(1, 91.0, 100.0, 89.5, 90.0, 0.0)];

        assert!(InvertedHammerDetector::default().detect(&bars, 0, &ctx(Trend::Down)).is_some());
        assert!(ShootingStarDetector::default().detect(&bars, 0, &ctx(Trend::Up)).is_some());
        assert!(HammerDetector::default().detect(&bars, 0, &ctx(Trend::Down)).is_none());
    }

    #[test]
    fn test_doji_is_not_a_hammer() {
        let bars = [Bar::new(1, 100.0, 100.0, 90.0, 100.0, 0.0)];
        assert!(HammerDetector::default().detect(&bars, 0, &ctx(Trend::Down)).is_none());
    }

    #[test]
    fn test_out_of_bounds() {
        let bars: [Bar; 0] = [];
        assert!(DojiDetector::default().detect(&bars, 0, &ctx(Trend::Sideways)).is_none());
        assert!(HammerDetector::default().detect(&bars, 3, &ctx(Trend::Down)).is_none());
    }
}
