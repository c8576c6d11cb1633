//! Candlestick and chart pattern detectors
//!
//! # Pattern Categories
//!
//! - **Single-bar (7)**: Doji, Gravestone/Dragonfly Doji, Hammer, Hanging Man,
//!   Inverted Hammer, Shooting Star
//! - **Three-bar (4)**: Morning/Evening Star, Three White Soldiers, Three Black Crows
//! - **Chart (7)**: Head-and-Shoulders (and inverse), Double Top/Bottom,
//!   Symmetrical/Ascending/Descending Triangle
//!
//! The trend summary used by pattern reports lives in [`trend`]; window
//! statistics and `classify_trend` live in [`helpers`].

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod chart;
pub mod single_bar;
pub mod three_bar;
pub mod trend;

// Re-export all detectors for convenience
pub use chart::*;
pub use helpers::*;
pub use single_bar::*;
pub use three_bar::*;
pub use trend::*;
