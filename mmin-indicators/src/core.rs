//! Core traits, the crate error type, and the validated window size.

use std::fmt::{self, Debug, Display};
use std::num::NonZeroUsize;

use nonzero_ext::nonzero;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A stateful, value-by-value transform.
///
/// Every call to [`Indicator::next`] consumes exactly one input and yields at most
/// one output. Indicators that need a warm-up period return `None` until enough
/// inputs have been observed.
pub trait Indicator {
    /// Type consumed on each update.
    type Input;
    /// Type produced once the indicator is warmed up.
    type Output;

    /// Feeds one input value and returns the next output, if any.
    fn next(&mut self, input: Self::Input) -> Option<Self::Output>;

    /// Drops all accumulated state, returning the indicator to its warm-up phase.
    fn reset(&mut self);
}

/// Scalar values an indicator can consume.
///
/// Implemented for the primitive numeric types and [`Decimal`]. Floating point
/// types report NaN and infinities through [`Input::is_finite`] so stream adapters
/// can guard the data channel.
pub trait Input: Copy + PartialOrd + Debug + Send + 'static {
    /// Returns `false` when the value cannot take part in ordered comparisons.
    fn is_finite(&self) -> bool {
        true
    }
}

impl Input for f64 {
    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

impl Input for f32 {
    fn is_finite(&self) -> bool {
        f32::is_finite(*self)
    }
}

impl Input for i32 {}
impl Input for i64 {}
impl Input for u32 {}
impl Input for u64 {}
impl Input for usize {}
impl Input for Decimal {}

/// Result alias for indicator construction.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// Errors surfaced while configuring an indicator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// The requested window size is not a positive, finite whole number.
    #[error("invalid window size {value}: {reason}")]
    InvalidConfig {
        /// Rendering of the rejected value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

impl IndicatorError {
    pub(crate) fn invalid_config(value: impl Display, reason: &'static str) -> Self {
        Self::InvalidConfig {
            value: value.to_string(),
            reason,
        }
    }
}

/// Number of consecutive values a rolling indicator looks at.
///
/// Always a whole number of at least one. Constructing one is the only place a
/// window can be rejected; once an indicator holds a `WindowSize` it never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WindowSize(NonZeroUsize);

impl WindowSize {
    /// Creates a window from an element count.
    pub fn new(size: usize) -> IndicatorResult<Self> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or_else(|| IndicatorError::invalid_config(size, "must be at least 1"))
    }

    /// Creates a window from any numeric value.
    ///
    /// NaN, infinities, fractional values and anything below one are rejected.
    pub fn from_number<N>(value: N) -> IndicatorResult<Self>
    where
        N: ToPrimitive + Display,
    {
        let Some(float) = value.to_f64() else {
            return Err(IndicatorError::invalid_config(value, "not representable as a number"));
        };
        if float.is_nan() {
            return Err(IndicatorError::invalid_config(value, "not a number"));
        }
        if float.is_infinite() {
            return Err(IndicatorError::invalid_config(value, "must be finite"));
        }
        if float.fract() != 0.0 {
            return Err(IndicatorError::invalid_config(value, "must be a whole number"));
        }
        if float < 1.0 {
            return Err(IndicatorError::invalid_config(value, "must be at least 1"));
        }
        let size = value
            .to_usize()
            .ok_or_else(|| IndicatorError::invalid_config(&value, "too large for this platform"))?;
        Self::new(size)
    }

    /// Returns the number of elements in the window.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Five elements, used when nothing else has been configured.
impl Default for WindowSize {
    fn default() -> Self {
        Self(nonzero!(5usize))
    }
}

impl Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl TryFrom<usize> for WindowSize {
    type Error = IndicatorError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&Value> for WindowSize {
    type Error = IndicatorError;

    /// Validates an untyped configuration value. Only JSON numbers are accepted;
    /// numeric-looking strings such as `"5"` are rejected like any other string.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(number) => {
                if let Some(unsigned) = number.as_u64() {
                    Self::from_number(unsigned)
                } else if let Some(signed) = number.as_i64() {
                    Self::from_number(signed)
                } else if let Some(float) = number.as_f64() {
                    Self::from_number(float)
                } else {
                    Err(IndicatorError::invalid_config(number, "not representable as a number"))
                }
            }
            Value::Null => Err(IndicatorError::invalid_config("null", "window must be numeric")),
            Value::Bool(flag) => Err(IndicatorError::invalid_config(flag, "window must be numeric")),
            Value::String(text) => Err(IndicatorError::invalid_config(
                format!("{text:?}"),
                "window must be numeric",
            )),
            Value::Array(_) => Err(IndicatorError::invalid_config(value, "window must be numeric")),
            Value::Object(_) => Err(IndicatorError::invalid_config(value, "window must be numeric")),
        }
    }
}

impl<'de> Deserialize<'de> for WindowSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        WindowSize::try_from(&raw).map_err(serde::de::Error::custom)
    }
}
