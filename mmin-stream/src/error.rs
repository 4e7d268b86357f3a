use mmin_indicators::IndicatorError;
use thiserror::Error;

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Error type surfaced by the stream adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The window configuration was rejected.
    #[error(transparent)]
    Config(#[from] IndicatorError),
    /// A NaN or infinite sample arrived under [`crate::SamplePolicy::Reject`].
    #[error("sample #{index} is not a finite number: {value}")]
    NonFiniteSample {
        /// Zero-based position of the sample in the input.
        index: u64,
        /// Debug rendering of the offending sample.
        value: String,
    },
    /// The reader was dropped before the value could be delivered.
    #[error("the reading side of the stream has been dropped")]
    Closed,
}
