//! Process-wide tracing subscriber setup.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::{LogFormat, LoggingConfig};

/// Installs the global subscriber and routes `log` records into it.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a global subscriber was already installed, leaving it in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true)),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(true)),
        ),
    };
    if installed.is_err() {
        return false;
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log bridge already installed: {}", e);
    }
    true
}
