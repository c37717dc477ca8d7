//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; the embedding application
//! calls [`init`] once at startup to route them to the console and,
//! optionally, to daily-rolling files.

use crate::config::LogSettings;
use crate::config::settings::DEFAULT_LOG_FILTER;
use crate::error::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name prefix inside the log directory
pub const LOG_FILE_PREFIX: &str = "sigview.log";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. When a log
/// directory is configured, the returned guard must be kept alive for file
/// output to be flushed. Calling this again after a subscriber is installed
/// leaves the existing one in place and returns `Ok(None)`.
pub fn init(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match &settings.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => {
            tracing::info!(filter = %settings.filter, "logging initialised");
            Ok(guard)
        }
        Err(e) => {
            tracing::debug!("tracing subscriber already installed: {}", e);
            Ok(None)
        }
    }
}
