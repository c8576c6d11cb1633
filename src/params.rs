//! Parameter metadata for the engine's scalar settings
//!
//! This module describes the tunable scalars of [`EngineConfig`], enabling:
//! - Grid search optimization
//! - Parameter documentation
//! - Automatic configuration UI generation
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use kline_ta::params::Parameterized;
//! use kline_ta::prelude::*;
//!
//! for param in EngineConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let params = HashMap::from([("macd_signal", 5.0), ("bollinger_width", 2.5)]);
//! let config = EngineConfig::with_params(&params).unwrap();
//! assert_eq!(config.macd.signal.get(), 5);
//! ```

use std::collections::HashMap;

use crate::{config::EngineConfig, Period, Ratio, Result, TaError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value in 0.0..=1.0
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Positive multiplier without an upper bound of 1.0 (e.g. band width)
  Factor,
}

/// Metadata for a single parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "macd_fast")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 || max < min {
      return vec![min];
    }
    let steps = ((max - min) / step + 1e-9).floor() as usize;
    (0..=steps).map(|i| min + step * i as f64).collect()
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(TaError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(TaError::InvalidInput("Period must be a positive integer"));
        }
        Ok(())
      },
      ParamType::Factor => {
        if value <= 0.0 {
          return Err(TaError::InvalidInput("Factor must be positive"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED TRAIT
// ============================================================

/// Configurations that can be built from a flat name -> value map
pub trait Parameterized: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Missing parameters keep their default values; unknown names are rejected.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;
}

const ENGINE_PARAMS: &[ParamMeta] = &[
  ParamMeta::period("kdj_period", 9.0, (5.0, 30.0, 1.0), "KDJ RSV lookback"),
  ParamMeta::period("kdj_k_smoothing", 3.0, (2.0, 10.0, 1.0), "KDJ K smoothing"),
  ParamMeta::period("kdj_d_smoothing", 3.0, (2.0, 10.0, 1.0), "KDJ D smoothing"),
  ParamMeta::period("macd_fast", 12.0, (5.0, 20.0, 1.0), "MACD fast EMA period"),
  ParamMeta::period("macd_slow", 26.0, (20.0, 40.0, 1.0), "MACD slow EMA period"),
  ParamMeta::period("macd_signal", 9.0, (3.0, 15.0, 1.0), "MACD signal line period"),
  ParamMeta::period("bollinger_period", 20.0, (10.0, 40.0, 1.0), "Bollinger moving average period"),
  ParamMeta::factor("bollinger_width", 2.0, (1.0, 3.0, 0.5), "Bollinger standard deviation multiplier"),
  ParamMeta::period("pattern_window", 30.0, (10.0, 60.0, 5.0), "Chart pattern window"),
  ParamMeta::period("context_window", 5.0, (2.0, 20.0, 1.0), "Closes deciding a candle's trend context"),
  ParamMeta::ratio("context_threshold", 0.01, (0.0, 0.05, 0.005), "Relative move for an up/down context"),
  ParamMeta::period("trend_period", 20.0, (10.0, 60.0, 5.0), "Trend summary window"),
  ParamMeta::ratio("trend_threshold", 0.05, (0.01, 0.2, 0.01), "First-to-last change for an up/down trend"),
  ParamMeta::period("volume_period", 20.0, (5.0, 60.0, 5.0), "Volume analysis window"),
  ParamMeta::ratio("peak_tolerance", 0.03, (0.01, 0.1, 0.01), "Double top/bottom height tolerance"),
  ParamMeta::ratio("shoulder_tolerance", 0.2, (0.05, 0.5, 0.05), "Head-and-shoulders shoulder tolerance"),
  ParamMeta::ratio("flat_tolerance", 0.001, (0.0, 0.01, 0.0005), "Triangle flat-side slope tolerance"),
];

impl Parameterized for EngineConfig {
  fn param_meta() -> &'static [ParamMeta] {
    ENGINE_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    for (&key, &value) in params {
      let meta = ENGINE_PARAMS
        .iter()
        .find(|m| m.name == key)
        .ok_or_else(|| TaError::InvalidConfig(format!("unknown parameter `{key}`")))?;
      meta.validate(value)?;
    }

    let mut cfg = EngineConfig::default();
    cfg.kdj.period = get_period(params, "kdj_period", cfg.kdj.period)?;
    cfg.kdj.k_smoothing = get_period(params, "kdj_k_smoothing", cfg.kdj.k_smoothing)?;
    cfg.kdj.d_smoothing = get_period(params, "kdj_d_smoothing", cfg.kdj.d_smoothing)?;
    cfg.macd.fast = get_period(params, "macd_fast", cfg.macd.fast)?;
    cfg.macd.slow = get_period(params, "macd_slow", cfg.macd.slow)?;
    cfg.macd.signal = get_period(params, "macd_signal", cfg.macd.signal)?;
    cfg.bollinger.period = get_period(params, "bollinger_period", cfg.bollinger.period)?;
    cfg.bollinger.width = get_factor(params, "bollinger_width", cfg.bollinger.width);

    let p = &mut cfg.patterns;
    p.window = get_period(params, "pattern_window", p.window)?;
    p.context_window = get_period(params, "context_window", p.context_window)?;
    p.context_threshold = get_ratio(params, "context_threshold", p.context_threshold)?;
    p.trend_period = get_period(params, "trend_period", p.trend_period)?;
    p.trend_threshold = get_ratio(params, "trend_threshold", p.trend_threshold)?;
    p.volume_period = get_period(params, "volume_period", p.volume_period)?;
    p.peak_tolerance = get_ratio(params, "peak_tolerance", p.peak_tolerance)?;
    p.shoulder_tolerance = get_ratio(params, "shoulder_tolerance", p.shoulder_tolerance)?;
    p.flat_tolerance = get_ratio(params, "flat_tolerance", p.flat_tolerance)?;

    cfg.validate()?;
    Ok(cfg)
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: Ratio) -> Result<Ratio> {
  match params.get(key) {
    Some(&value) => Ratio::new(value),
    None => Ok(default),
  }
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: Period) -> Result<Period> {
  match params.get(key) {
    Some(&value) => Period::new(value as usize),
    None => Ok(default),
  }
}

/// Helper to get a plain multiplier from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &str, default: f64) -> f64 {
  params.get(key).copied().unwrap_or(default)
}

// ============================================================
// TESTS
// ============================================================
