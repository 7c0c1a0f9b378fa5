//! Logging setup shared by the csvjob binaries

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FORMAT_ENV: &str = "CSVJOB_LOG_FORMAT";
pub const LOG_DIR_ENV: &str = "CSVJOB_LOG_DIR";
pub const DEFAULT_LOG_FILTER: &str = "csvjob=info";
pub const DEFAULT_CLI_LOG_FILTER: &str = "csvjob=warn";
const LOG_FILE_PREFIX: &str = "csvjob.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Production: JSON structured logging
    Json,
    /// Development: pretty formatting with colors
    Pretty,
}

impl LogFormat {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initialize tracing for the worker daemon
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `csvjob=info`)
/// - `CSVJOB_LOG_FORMAT`: `json` or `pretty` (default)
/// - `CSVJOB_LOG_DIR`: also write JSON logs to a daily rolling file there
///
/// The returned guard flushes the file writer on drop; hold it in `main`.
pub fn init_logging() -> Result<Option<WorkerGuard>> {
    install(DEFAULT_LOG_FILTER, false)
}

/// CLI variant: logs go to stderr so stdout stays machine-readable
pub fn init_cli_logging() -> Result<Option<WorkerGuard>> {
    install(DEFAULT_CLI_LOG_FILTER, true)
}

fn install(default_filter: &str, to_stderr: bool) -> Result<Option<WorkerGuard>> {
    let format = LogFormat::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Failed to create env filter")?;

    let console_layer = match (format, to_stderr) {
        (LogFormat::Json, false) => fmt::layer().json().boxed(),
        (LogFormat::Pretty, false) => fmt::layer().pretty().boxed(),
        (LogFormat::Json, true) => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        (LogFormat::Pretty, true) => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let dir = shellexpand::tilde(dir.trim()).into_owned();
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
