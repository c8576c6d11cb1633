//! Engine configuration
//!
//! Every field has a default, so a host application can embed a partial
//! `EngineConfig` in its own config file and deserialize it with serde.

use serde::{Deserialize, Serialize};

use crate::detectors::MIN_CHART_WINDOW;
use crate::indicators::{BollingerParams, KdjParams, MacdParams};
use crate::{Period, Ratio, Result, TaError};

/// Indicator periods and pattern thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sma_periods: Vec<Period>,
    pub ema_periods: Vec<Period>,
    /// The first period also feeds the composite signal
    pub rsi_periods: Vec<Period>,
    pub kdj: KdjParams,
    pub macd: MacdParams,
    pub bollinger: BollingerParams,
    pub patterns: PatternConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sma_periods: [5, 10, 20, 60].map(Period::new_const).to_vec(),
            ema_periods: [12, 26].map(Period::new_const).to_vec(),
            rsi_periods: vec![Period::new_const(14)],
            kdj: KdjParams::default(),
            macd: MacdParams::default(),
            bollinger: BollingerParams::default(),
            patterns: PatternConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.macd.fast >= self.macd.slow {
            return Err(TaError::InvalidConfig(format!(
                "MACD fast period {} must be shorter than slow period {}",
                self.macd.fast.get(),
                self.macd.slow.get()
            )));
        }
        let width = self.bollinger.width;
        if !width.is_finite() || width <= 0.0 {
            return Err(TaError::InvalidConfig(format!(
                "Bollinger width must be positive, got {width}"
            )));
        }
        self.patterns.validate()
    }
}

/// Pattern detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Trailing window of the chart detectors
    pub window: Period,
    /// Closes preceding a candle that decide its trend context
    pub context_window: Period,
    /// Relative fitted move separating up/down from sideways in that context
    pub context_threshold: Ratio,
    /// Window of the trend summary
    pub trend_period: Period,
    /// First-to-last change separating up/down from sideways in the summary
    pub trend_threshold: Ratio,
    /// Window of the volume analysis
    pub volume_period: Period,
    /// Double top/bottom: maximum relative height difference
    pub peak_tolerance: Ratio,
    /// Head-and-shoulders: maximum relative shoulder difference
    pub shoulder_tolerance: Ratio,
    /// Triangles: slope per bar, relative to mean price, still counted as flat
    pub flat_tolerance: Ratio,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window: Period::new_const(30),
            context_window: Period::new_const(5),
            context_threshold: Ratio::new_const(0.01),
            trend_period: Period::new_const(20),
            trend_threshold: Ratio::new_const(0.05),
            volume_period: Period::new_const(20),
            peak_tolerance: Ratio::new_const(0.03),
            shoulder_tolerance: Ratio::new_const(0.2),
            flat_tolerance: Ratio::new_const(0.001),
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window.get() < MIN_CHART_WINDOW {
            return Err(TaError::InvalidConfig(format!(
                "pattern window {} below minimum {MIN_CHART_WINDOW}",
                self.window.get()
            )));
        }
        if self.context_window.get() < 2 {
            return Err(TaError::InvalidConfig(
                "context window needs at least 2 closes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        let sma: Vec<usize> = cfg.sma_periods.iter().map(|p| p.get()).collect();
        assert_eq!(sma, vec![5, 10, 20, 60]);
        assert_eq!(cfg.macd.slow.get(), 26);
        assert_eq!(cfg.bollinger.width, 2.0);
        assert_eq!(cfg.patterns.window.get(), 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_macd() {
        let mut cfg = EngineConfig::default();
        cfg.macd.fast = Period::new_const(30);
        assert!(matches!(cfg.validate(), Err(TaError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_width() {
        let mut cfg = EngineConfig::default();
        cfg.bollinger.width = 0.0;
        assert!(cfg.validate().is_err());
        cfg.bollinger.width = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_short_chart_window() {
        let mut cfg = EngineConfig::default();
        cfg.patterns.window = Period::new_const(9);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"rsi_periods": [6, 12, 24], "macd": {"signal": 5}}"#).unwrap();
        let rsi: Vec<usize> = cfg.rsi_periods.iter().map(|p| p.get()).collect();
        assert_eq!(rsi, vec![6, 12, 24]);
        assert_eq!(cfg.macd.signal.get(), 5);
        assert_eq!(cfg.macd.fast.get(), 12);
        assert_eq!(cfg.sma_periods.len(), 4);
    }

    #[test]
    fn test_json_rejects_zero_period() {
        let err = serde_json::from_str::<EngineConfig>(r#"{"sma_periods": [0]}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<EngineConfig>(r#"{"patterns": {"peak_tolerance": 1.5}}"#);
        assert!(err.is_err());
    }
}
