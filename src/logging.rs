//! Logging setup
//!
//! Logs always go to stderr or a file so stdout only carries update lines.

use std::path::Path;

use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the filter, letting `RUST_LOG` win over the CLI level
pub fn env_filter(level: &str) -> EnvFilter {
    env_filter_with(level, std::env::var(EnvFilter::DEFAULT_ENV).ok())
}

/// An empty or invalid `rust_log` falls back to `level`
fn env_filter_with(level: &str, rust_log: Option<String>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// The returned guard flushes the writer on drop and must be kept alive
/// for the whole run.
pub fn init(level: &str, format: LogFormat, log_file: Option<&Path>) -> anyhow::Result<WorkerGuard> {
    let filter = env_filter(level);

    let (writer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none());

    let result = match format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().with_target(true).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(guard)
}
