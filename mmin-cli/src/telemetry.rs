use std::fs;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use mmin_config::{LogConfig, LogFormat};

const LOG_FILE_NAME: &str = "mmin.log";

/// Installs the global tracing subscriber.
///
/// Verbosity flags win over `RUST_LOG`, which wins over the configured level.
/// The returned guard must be held until exit when logging to a file.
pub fn init_tracing(log: &LogConfig, verbosity: u8) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(log, verbosity)?;

    let (writer, guard) = match &log.directory {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log.directory.is_none())
        .with_target(false);
    let installed = match log.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;
    Ok(guard)
}

fn build_filter(log: &LogConfig, verbosity: u8) -> Result<EnvFilter> {
    let filter = match verbosity {
        0 => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&log.level)
                .with_context(|| format!("invalid log level {:?}", log.level))?,
        },
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    Ok(filter)
}
