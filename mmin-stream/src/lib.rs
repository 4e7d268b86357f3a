//! Stream adapters around the rolling minimum.
//!
//! [`create_stream`] returns a [`MinStream`] builder. Its window can be read and
//! changed until a stream is created from it:
//!
//! - [`MinStream::stream`] returns a bare [`mmin_indicators::MovingMin`] instance,
//! - [`MinStream::transform`] maps any `futures::Stream` of samples into minima,
//! - [`MinStream::through`] returns a writer/reader pair joined by a bounded channel.

#![deny(missing_docs)]

mod builder;
mod error;
mod processor;
mod through;
mod transform;

pub use builder::{create_stream, MinStream};
pub use error::{StreamError, StreamResult};
pub use processor::{MinProcessor, ProcessorStats, SamplePolicy};
pub use through::{through, MinOutput, MinSink};
pub use transform::transform;
