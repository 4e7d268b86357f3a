//! Rolling minimum with amortized updates.

use std::collections::VecDeque;

use crate::core::{Indicator, IndicatorResult, Input, WindowSize};

/// Upper bound on the buffer reserved up front. Larger windows grow on demand
/// while they fill.
const MAX_PREALLOCATED: usize = 4096;

/// Tracks the minimum over the most recent `window` values.
///
/// The running minimum is kept as a single value. Most updates resolve in
/// constant time; the window is rescanned only when the value leaving it was
/// the minimum and the incoming value is not smaller. Memory is bounded by the
/// window itself, no candidate deque is kept.
#[derive(Debug, Clone)]
pub struct MovingMin<I = f64> {
    period: usize,
    window: VecDeque<I>,
    current: Option<I>,
    rescans: u64,
}

impl<I> MovingMin<I>
where
    I: Input,
{
    /// Creates a new rolling minimum over `period` values.
    pub fn new(period: usize) -> IndicatorResult<Self> {
        WindowSize::new(period).map(Self::with_window)
    }

    /// Creates a new rolling minimum from an already validated window size.
    pub fn with_window(window: WindowSize) -> Self {
        let period = window.get();
        Self {
            period,
            window: VecDeque::with_capacity(period.min(MAX_PREALLOCATED)),
            current: None,
            rescans: 0,
        }
    }

    /// Returns the configured lookback period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Returns the minimum of the current window once it is full.
    pub fn value(&self) -> Option<I> {
        if self.is_ready() {
            self.current
        } else {
            None
        }
    }

    /// Whether a full window has been observed.
    pub fn is_ready(&self) -> bool {
        self.window.len() == self.period
    }

    /// Number of values currently buffered.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns `true` when no value has been observed since creation or reset.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Number of full-window rescans performed so far.
    pub fn rescans(&self) -> u64 {
        self.rescans
    }

    /// Feeds every value of `values` and collects the emitted minima.
    pub fn batch(&mut self, values: &[I]) -> Vec<I> {
        values.iter().filter_map(|value| self.next(*value)).collect()
    }

    fn scan(&self) -> Option<I> {
        self.window
            .iter()
            .copied()
            .reduce(|best, value| if value < best { value } else { best })
    }
}

impl<I> Indicator for MovingMin<I>
where
    I: Input,
{
    type Input = I;
    type Output = I;

    fn next(&mut self, value: Self::Input) -> Option<Self::Output> {
        if self.window.len() < self.period {
            self.window.push_back(value);
            // `None` acts as +inf until the first value lands.
            self.current = match self.current {
                Some(current) if current <= value => Some(current),
                _ => Some(value),
            };
            return self.value();
        }

        let dropped = self.window.pop_front()?;
        self.window.push_back(value);
        let current = self.current?;

        if value < current {
            self.current = Some(value);
        } else if dropped == current {
            self.rescans += 1;
            self.current = self.scan();
        }

        self.current
    }

    fn reset(&mut self) {
        self.window.clear();
        self.current = None;
        self.rescans = 0;
    }
}
