//! Logging setup
//!
//! Stdout gets pretty or JSON output through a non-blocking writer. When a log
//! directory is configured, a daily rolling plain-text file is written as well.

use crate::config::{LogFormat, LogSettings};
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "d2render=info,tower_http=info";

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "d2render.log";

/// Install the global subscriber
///
/// The returned guards flush buffered log lines on drop; keep them alive for
/// the lifetime of the process.
pub fn init_logging(settings: &LogSettings) -> Result<Vec<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let file_layer = match &settings.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            Some(fmt::layer().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(stdout))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(stdout))
            .try_init()?,
    }

    Ok(guards)
}
