use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use mmin_indicators::Input;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{StreamError, StreamResult};
use crate::processor::{MinProcessor, ProcessorStats};

/// Creates a writable/readable pair connected by a bounded channel.
///
/// Values written to the [`MinSink`] are processed immediately and the resulting
/// minima are queued on the [`MinOutput`]. Dropping or ending the sink ends the
/// output stream once it has been drained. A capacity of zero is treated as one.
pub fn through<I: Input>(processor: MinProcessor<I>, capacity: usize) -> (MinSink<I>, MinOutput<I>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let sink = MinSink {
        processor,
        sender,
        failure: None,
    };
    let output = MinOutput {
        inner: ReceiverStream::new(receiver),
    };
    (sink, output)
}

/// Writing half of a [`through`] pair.
#[derive(Debug)]
pub struct MinSink<I> {
    processor: MinProcessor<I>,
    sender: mpsc::Sender<StreamResult<I>>,
    failure: Option<StreamError>,
}

impl<I: Input> MinSink<I> {
    /// Processes one value and queues the resulting minimum, waiting for room in
    /// the channel if the reader is behind.
    ///
    /// A rejected sample is forwarded to the reader as an error and poisons the
    /// sink: every later write returns the same error. Once the reader is gone,
    /// writes fail with [`StreamError::Closed`] without touching the window.
    pub async fn write(&mut self, value: I) -> StreamResult<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.sender.is_closed() {
            return Err(StreamError::Closed);
        }

        match self.processor.push(value) {
            Ok(Some(minimum)) => send(&self.sender, Ok(minimum)).await,
            Ok(None) => Ok(()),
            Err(err) => {
                self.failure = Some(err.clone());
                send(&self.sender, Err(err.clone())).await?;
                Err(err)
            }
        }
    }

    /// Closes the writing side and returns the processor's final counters.
    pub fn end(self) -> ProcessorStats {
        self.processor.stats()
    }

    /// Counters of the samples written so far.
    pub fn stats(&self) -> ProcessorStats {
        self.processor.stats()
    }
}

async fn send<I>(sender: &mpsc::Sender<StreamResult<I>>, item: StreamResult<I>) -> StreamResult<()> {
    sender.send(item).await.map_err(|_| StreamError::Closed)
}

/// Reading half of a [`through`] pair.
#[derive(Debug)]
pub struct MinOutput<I> {
    inner: ReceiverStream<StreamResult<I>>,
}

impl<I> MinOutput<I> {
    /// Waits for the next minimum. Returns `None` once the sink is gone and every
    /// queued value has been read.
    pub async fn recv(&mut self) -> Option<StreamResult<I>> {
        self.inner.next().await
    }
}

impl<I> Stream for MinOutput<I> {
    type Item = StreamResult<I>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
