use std::pin::Pin;

use futures::{stream, Stream, StreamExt};
use mmin_indicators::Input;

use crate::error::StreamResult;
use crate::processor::MinProcessor;

struct TransformState<S, I> {
    input: Pin<Box<S>>,
    processor: MinProcessor<I>,
    failed: bool,
}

/// Converts a stream of samples into a stream of window minima.
///
/// Samples are pulled one at a time; the output stream yields exactly one item per
/// input once the window is full, in input order. A rejected sample is yielded as
/// an error and ends the stream.
pub fn transform<I, S>(input: S, processor: MinProcessor<I>) -> impl Stream<Item = StreamResult<I>>
where
    I: Input,
    S: Stream<Item = I>,
{
    let state = TransformState {
        input: Box::pin(input),
        processor,
        failed: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.failed {
            return None;
        }
        loop {
            let value = state.input.next().await?;
            match state.processor.push(value) {
                Ok(Some(minimum)) => return Some((Ok(minimum), state)),
                Ok(None) => continue,
                Err(err) => {
                    state.failed = true;
                    return Some((Err(err), state));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use futures::{stream, StreamExt, TryStreamExt};
    use rust_decimal::Decimal;

    use crate::{create_stream, SamplePolicy, StreamError};

    const SERIES: [f64; 15] = [
        2.0, 8.0, 2.0, 13.0, 41.0, 7.0, 9.0, 7.0, 12.0, 24.0, 7.0, 10.0, 4.0, 4.0, 3.0,
    ];

    #[tokio::test]
    async fn streams_minimum_for_window_of_five() {
        let mut builder = create_stream();
        builder.set_window(5).unwrap();
        let output: Vec<f64> = builder
            .transform(stream::iter(SERIES))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(output, vec![2.0, 2.0, 2.0, 7.0, 7.0, 7.0, 7.0, 7.0, 4.0, 4.0, 3.0]);
    }

    #[tokio::test]
    async fn streams_minimum_for_window_of_three() {
        let mut builder = create_stream();
        builder.set_window(3).unwrap();
        let output: Vec<f64> = builder
            .transform(stream::iter(SERIES))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(
            output,
            vec![2.0, 2.0, 2.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 4.0, 4.0, 3.0]
        );
    }

    #[tokio::test]
    async fn short_stream_yields_nothing() {
        let output: Vec<_> = create_stream()
            .transform(stream::iter([1.0, 2.0, 3.0]))
            .collect()
            .await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn rejected_sample_ends_the_stream() {
        let mut builder = create_stream();
        builder.set_window(1).unwrap();
        let output: Vec<_> = builder
            .transform(stream::iter([1.0, f64::NAN, 2.0]))
            .collect()
            .await;
        assert_eq!(output.len(), 2);
        assert_eq!(output[0], Ok(1.0));
        assert!(matches!(output[1], Err(StreamError::NonFiniteSample { index: 1, .. })));
    }

    #[tokio::test]
    async fn skip_policy_keeps_streaming() {
        let builder = create_stream().with_sample_policy(SamplePolicy::Skip);
        let output: Vec<f64> = builder
            .transform(stream::iter([4.0, f64::NAN, 3.0, 6.0, 5.0, 9.0, f64::INFINITY, 8.0]))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(output, vec![3.0, 3.0]);
    }

    #[tokio::test]
    async fn transforms_decimal_streams() {
        let mut builder = create_stream();
        builder.set_window(2).unwrap();
        let input = [Decimal::new(150, 2), Decimal::new(225, 2), Decimal::new(75, 2)];
        let output: Vec<Decimal> = builder
            .transform(stream::iter(input))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(output, vec![Decimal::new(150, 2), Decimal::new(75, 2)]);
    }
}
