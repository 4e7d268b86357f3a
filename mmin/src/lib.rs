//! Sliding-window minimum over numeric streams.
//!
//! ```
//! use mmin::Indicator;
//!
//! let mut builder = mmin::create_stream();
//! builder.set_window(3).unwrap();
//! let mut min = builder.stream::<f64>();
//! let minima: Vec<f64> = [4.0, 1.0, 6.0, 5.0, 7.0]
//!     .into_iter()
//!     .filter_map(|value| min.next(value))
//!     .collect();
//! assert_eq!(minima, vec![1.0, 1.0, 5.0]);
//! ```

pub use mmin_config as config;
pub use mmin_indicators::{
    Indicator, IndicatorError, IndicatorResult, Input, MovingMin, WindowSize,
};
pub use mmin_stream::{
    create_stream, through, transform, MinOutput, MinProcessor, MinSink, MinStream,
    ProcessorStats, SamplePolicy, StreamError, StreamResult,
};
