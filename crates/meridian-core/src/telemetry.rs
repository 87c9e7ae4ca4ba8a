//! Tracing subscriber initialization.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::logging::LoggingConfig;

/// Initialize the global tracing subscriber from logging configuration.
///
/// The `RUST_LOG` environment variable takes precedence over the configured
/// level. Safe to call once per process; subsequent calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            let _ = fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(false)
                .try_init();
        }
        _ => {
            let _ = fmt().with_env_filter(filter).try_init();
        }
    }
}
