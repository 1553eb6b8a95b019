//! Process-wide `tracing` subscriber.

use std::path::Path;

use compwatch_core::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the non-blocking file writer alive. Dropping it flushes pending
/// log lines, so `main` holds it until exit.
#[must_use = "dropping the guard stops file logging"]
pub(crate) struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber: an `EnvFilter` (`RUST_LOG` wins over the
/// configured level), an optional console layer, and an optional daily-rolling
/// file layer under `log_dir`.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid, the log directory
/// cannot be created, or a global subscriber is already set.
pub(crate) fn init(settings: &LoggingSettings, log_dir: &Path) -> anyhow::Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.level.as_str()))?;

    let console = settings.console.then(|| fmt::layer().with_target(false));

    let (file, guard) = if settings.file {
        std::fs::create_dir_all(log_dir)?;
        let appender = tracing_appender::rolling::daily(log_dir, &settings.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(LoggingGuard { _file: guard })
}
