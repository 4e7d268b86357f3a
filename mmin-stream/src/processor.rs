use mmin_indicators::{Indicator, Input, MovingMin, WindowSize};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StreamError, StreamResult};

/// What to do with samples that cannot be ordered (NaN, infinities).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePolicy {
    /// Fail the stream on the first non-finite sample.
    #[default]
    Reject,
    /// Drop the sample, log a warning and keep going.
    Skip,
}

/// Per-stream state: the rolling minimum plus the guard on the data channel.
///
/// Every adapter in this crate funnels samples through [`MinProcessor::push`],
/// one at a time, so a single instance never sees concurrent updates.
#[derive(Debug, Clone)]
pub struct MinProcessor<I = f64> {
    indicator: MovingMin<I>,
    policy: SamplePolicy,
    received: u64,
    skipped: u64,
    emitted: u64,
}

impl<I> MinProcessor<I>
where
    I: Input,
{
    /// Creates a processor with an empty window.
    pub fn new(window: WindowSize, policy: SamplePolicy) -> Self {
        Self {
            indicator: MovingMin::with_window(window),
            policy,
            received: 0,
            skipped: 0,
            emitted: 0,
        }
    }

    /// Feeds one sample, returning the window minimum once the window is full.
    pub fn push(&mut self, value: I) -> StreamResult<Option<I>> {
        let index = self.received;
        self.received += 1;

        if !value.is_finite() {
            match self.policy {
                SamplePolicy::Reject => {
                    return Err(StreamError::NonFiniteSample {
                        index,
                        value: format!("{value:?}"),
                    });
                }
                SamplePolicy::Skip => {
                    self.skipped += 1;
                    warn!(index, value = ?value, "skipping non-finite sample");
                    return Ok(None);
                }
            }
        }

        let output = self.indicator.next(value);
        if output.is_some() {
            self.emitted += 1;
        }
        Ok(output)
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            received: self.received,
            skipped: self.skipped,
            emitted: self.emitted,
            rescans: self.indicator.rescans(),
        }
    }
}

/// Counters describing a processor's lifetime so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    /// Samples handed to the processor, including skipped and rejected ones.
    pub received: u64,
    /// Non-finite samples dropped under [`SamplePolicy::Skip`].
    pub skipped: u64,
    /// Window minima produced.
    pub emitted: u64,
    /// Full-window rescans performed by the underlying indicator.
    pub rescans: u64,
}
