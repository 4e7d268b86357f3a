//! Construction API: configure a window, then create stream instances from it.

use std::fmt::Display;

use futures::Stream;
use mmin_indicators::{IndicatorResult, Input, MovingMin, WindowSize};
use num_traits::ToPrimitive;
use serde_json::Value;
use tracing::debug;

use crate::error::StreamResult;
use crate::processor::{MinProcessor, SamplePolicy};
use crate::through::{through, MinOutput, MinSink};
use crate::transform::transform;

/// Returns a builder configured with the default window of five values.
pub fn create_stream() -> MinStream {
    MinStream::default()
}

/// Configuration holder that produces rolling-minimum streams.
///
/// The window can be changed freely on the builder. Every stream created from it
/// captures the window at creation time, so later changes never reach a stream
/// that is already running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinStream {
    window: WindowSize,
    policy: SamplePolicy,
}

impl MinStream {
    /// Creates a builder from an already validated window.
    pub fn new(window: WindowSize, policy: SamplePolicy) -> Self {
        Self { window, policy }
    }

    /// Current window size.
    pub fn window(&self) -> usize {
        self.window.get()
    }

    /// Sets the window size from any numeric value.
    ///
    /// On error the previous window is kept.
    pub fn set_window<N>(&mut self, value: N) -> IndicatorResult<&mut Self>
    where
        N: ToPrimitive + Display,
    {
        self.window = WindowSize::from_number(value)?;
        Ok(self)
    }

    /// Sets the window size from an untyped configuration value.
    ///
    /// Only numbers are accepted; strings, arrays, objects, booleans and null are
    /// rejected and the previous window is kept.
    pub fn set_window_value(&mut self, value: &Value) -> IndicatorResult<&mut Self> {
        self.window = WindowSize::try_from(value)?;
        Ok(self)
    }

    /// Replaces the window with an already validated one.
    pub fn with_window(mut self, window: WindowSize) -> Self {
        self.window = window;
        self
    }

    /// How non-finite samples are handled by processors created from here.
    pub fn sample_policy(&self) -> SamplePolicy {
        self.policy
    }

    /// Changes the sample policy in place.
    pub fn set_sample_policy(&mut self, policy: SamplePolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Returns the builder with a different sample policy.
    pub fn with_sample_policy(mut self, policy: SamplePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a fresh rolling-minimum instance bound to the current window.
    pub fn stream<I: Input>(&self) -> MovingMin<I> {
        debug!(window = self.window.get(), "creating moving-minimum instance");
        MovingMin::with_window(self.window)
    }

    /// Creates a fresh processor that also applies the sample policy.
    pub fn processor<I: Input>(&self) -> MinProcessor<I> {
        debug!(
            window = self.window.get(),
            policy = ?self.policy,
            "creating moving-minimum processor"
        );
        MinProcessor::new(self.window, self.policy)
    }

    /// Maps a stream of samples into a stream of window minima.
    pub fn transform<I, S>(&self, input: S) -> impl Stream<Item = StreamResult<I>>
    where
        I: Input,
        S: Stream<Item = I>,
    {
        transform(input, self.processor())
    }

    /// Creates a connected writer/reader pair backed by a bounded channel.
    pub fn through<I: Input>(&self, capacity: usize) -> (MinSink<I>, MinOutput<I>) {
        through(self.processor(), capacity)
    }
}
