use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use rust_decimal::Decimal;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::info;

use mmin_config::{load_config, LogFormat, MminConfig};
use mmin_indicators::WindowSize;
use mmin_stream::SamplePolicy;

use crate::pipeline::run_pipeline;
use crate::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(
    name = "mmin",
    version,
    about = "Sliding-window minimum over a stream of numbers",
    long_about = "Reads numbers separated by whitespace, commas or newlines and writes the \
                  minimum of every window of consecutive values, one per line."
)]
pub struct Cli {
    /// File to read samples from (stdin when omitted or `-`)
    pub input: Option<PathBuf>,
    /// File to write minima to (stdout when omitted or `-`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Number of samples per window
    #[arg(short, long, allow_negative_numbers = true)]
    pub window: Option<f64>,
    /// Configuration overlay loaded from `config/{env}.toml`
    #[arg(long)]
    pub env: Option<String>,
    /// Explicit configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Drop NaN and infinite samples instead of failing
    #[arg(long)]
    pub skip_invalid: bool,
    /// Parse samples as exact decimals and keep their formatting
    #[arg(long)]
    pub decimal: bool,
    /// Bound of the channel between reader and writer
    #[arg(long)]
    pub capacity: Option<usize>,
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,
    /// Write logs to `mmin.log` in this directory instead of stderr
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

pub async fn run_with(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.env.as_deref(), cli.config.as_deref())?;
    apply_overrides(&mut config, &cli)?;

    if cli.print_config {
        let rendered = toml::to_string_pretty(&config).context("failed to render configuration")?;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let _guard = init_tracing(&config.log, cli.verbose)?;
    info!(
        window = config.window.get(),
        policy = ?config.sample_policy,
        decimal = cli.decimal,
        "starting moving-minimum pipeline"
    );

    let input = open_input(cli.input.as_deref()).await?;
    let output = open_output(cli.output.as_deref()).await?;
    let factory = config.min_stream();

    let summary = if cli.decimal {
        run_pipeline::<Decimal>(&factory, config.channel_capacity, input, output).await?
    } else {
        run_pipeline::<f64>(&factory, config.channel_capacity, input, output).await?
    };

    info!(
        received = summary.stats.received,
        skipped = summary.stats.skipped,
        emitted = summary.written,
        rescans = summary.stats.rescans,
        "pipeline finished"
    );
    Ok(())
}

fn apply_overrides(config: &mut MminConfig, cli: &Cli) -> Result<()> {
    if let Some(window) = cli.window {
        config.window = WindowSize::from_number(window).context("invalid --window")?;
    }
    if cli.skip_invalid {
        config.sample_policy = SamplePolicy::Skip;
    }
    if let Some(capacity) = cli.capacity {
        config.channel_capacity = capacity;
    }
    if let Some(format) = cli.log_format {
        config.log.format = format.into();
    }
    if let Some(dir) = &cli.log_dir {
        config.log.directory = Some(dir.clone());
    }
    config.validate()
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |path| path.as_os_str() == "-")
}

async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    match path {
        Some(path) if !is_stdio(Some(path)) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open input {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdin())),
    }
}

async fn open_output(path: Option<&Path>) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
    match path {
        Some(path) if !is_stdio(Some(path)) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create output {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdout())),
    }
}
