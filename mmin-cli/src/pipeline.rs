use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

use mmin_indicators::Input;
use mmin_stream::{MinOutput, MinSink, MinStream, ProcessorStats};

/// Outcome of a completed pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    pub stats: ProcessorStats,
    pub written: u64,
}

/// Reads samples from `input`, writes one window minimum per line to `output`.
///
/// Reading and writing run on separate tasks joined by the stream's bounded
/// channel, so a slow writer holds the reader back instead of buffering.
pub async fn run_pipeline<I>(
    factory: &MinStream,
    capacity: usize,
    input: impl AsyncRead + Unpin + Send + 'static,
    output: impl AsyncWrite + Unpin + Send + 'static,
) -> Result<PipelineSummary>
where
    I: Input + FromStr + Display,
    I::Err: Display,
{
    let (mut sink, minima) = factory.through::<I>(capacity);
    let writer = tokio::spawn(write_minima(minima, output));

    let read_result = read_samples(&mut sink, input).await;
    let stats = sink.end();
    let written = writer.await.context("output task failed")?;

    // A failed writer makes the reader see a closed channel; report the cause.
    let written = written?;
    read_result?;
    Ok(PipelineSummary { stats, written })
}

async fn read_samples<I>(sink: &mut MinSink<I>, input: impl AsyncRead + Unpin) -> Result<()>
where
    I: Input + FromStr,
    I::Err: Display,
{
    let mut lines = BufReader::new(input).lines();
    let mut line_number = 0u64;
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        line_number += 1;
        for token in tokens(&line) {
            let value = token
                .parse::<I>()
                .map_err(|err| anyhow!("line {line_number}: cannot parse {token:?}: {err}"))?;
            sink.write(value).await?;
        }
    }
    let stats = sink.stats();
    debug!(
        lines = line_number,
        received = stats.received,
        emitted = stats.emitted,
        "input exhausted"
    );
    Ok(())
}

async fn write_minima<I>(mut minima: MinOutput<I>, output: impl AsyncWrite + Unpin) -> Result<u64>
where
    I: Display,
{
    let mut out = BufWriter::new(output);
    let mut written = 0u64;
    while let Some(item) = minima.recv().await {
        let minimum = item?;
        out.write_all(format!("{minimum}\n").as_bytes())
            .await
            .context("failed to write output")?;
        written += 1;
    }
    out.flush().await.context("failed to flush output")?;
    Ok(written)
}

/// Splits a line into samples separated by whitespace or commas.
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use mmin_stream::{create_stream, SamplePolicy};
    use rust_decimal::Decimal;

    use super::*;

    async fn run<I>(factory: &MinStream, input: &str) -> Result<(String, PipelineSummary)>
    where
        I: Input + FromStr + Display,
        I::Err: Display,
    {
        let (reader, mut writer) = tokio::io::duplex(64);
        let (output_reader, output_writer) = tokio::io::duplex(1024);
        let data = input.to_string();
        let feeder = tokio::spawn(async move {
            writer.write_all(data.as_bytes()).await?;
            writer.shutdown().await
        });
        let collector = tokio::spawn(async move {
            let mut text = String::new();
            let mut reader = BufReader::new(output_reader);
            tokio::io::AsyncReadExt::read_to_string(&mut reader, &mut text).await?;
            Ok::<_, std::io::Error>(text)
        });

        let summary = run_pipeline::<I>(factory, 2, reader, output_writer).await;
        feeder.await??;
        let text = collector.await??;
        summary.map(|summary| (text, summary))
    }

    #[test]
    fn splits_on_whitespace_and_commas() {
        let parsed: Vec<_> = tokens(" 1, 2\t3,,4 ").collect();
        assert_eq!(parsed, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn writes_one_minimum_per_line() {
        let mut factory = create_stream();
        factory.set_window(3).unwrap();
        let (text, summary) = run::<f64>(&factory, "2 8 2\n13, 41\n7\n").await.unwrap();
        assert_eq!(text, "2\n2\n2\n7\n");
        assert_eq!(summary.written, 4);
        assert_eq!(summary.stats.received, 6);
    }

    #[tokio::test]
    async fn preserves_decimal_formatting() {
        let mut factory = create_stream();
        factory.set_window(2).unwrap();
        let (text, _) = run::<Decimal>(&factory, "1.50 2.25 0.75").await.unwrap();
        assert_eq!(text, "1.50\n0.75\n");
    }

    #[tokio::test]
    async fn reports_unparseable_tokens() {
        let err = run::<f64>(&create_stream(), "1\n2 two\n").await.unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err:#}");
    }

    #[tokio::test]
    async fn skips_nan_when_configured() {
        let mut factory = create_stream().with_sample_policy(SamplePolicy::Skip);
        factory.set_window(2).unwrap();
        let (text, summary) = run::<f64>(&factory, "3 NaN 1 inf 4").await.unwrap();
        assert_eq!(text, "1\n1\n");
        assert_eq!(summary.stats.skipped, 2);
    }

    #[tokio::test]
    async fn rejects_nan_by_default() {
        let err = run::<f64>(&create_stream(), "3 NaN 1").await.unwrap_err();
        assert!(err.to_string().contains("not a finite number"), "{err:#}");
    }
}
