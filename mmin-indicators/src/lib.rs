#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

//! Rolling-window indicators over scalar streams.

/// Foundational traits and shared abstractions.
pub mod core;
/// Built-in indicator implementations.
pub mod indicators;

/// Re-export of the rolling minimum for convenience.
pub use crate::indicators::MovingMin;
/// Re-export of the core traits and error type to make the crate easy to consume.
pub use crate::core::{Indicator, IndicatorError, IndicatorResult, Input, WindowSize};
