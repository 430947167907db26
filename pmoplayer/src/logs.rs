//! Logging initialisation
//!
//! `RUST_LOG` wins when set; otherwise the filter comes from
//! `logger.minLevel` in the configuration.

use pmoconfig::LoggerConfig;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs the global subscriber
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
pub fn init_logging(config: &LoggerConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(min_level(config).into()));

    let subscriber = Registry::default().with(filter);

    let installed = if config.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    installed.is_ok()
}

/// Level filter matching `logger.minLevel`; unknown names mean INFO
pub fn min_level(config: &LoggerConfig) -> LevelFilter {
    match string_to_level(&config.min_level) {
        Some(level) => LevelFilter::from_level(level),
        None => LevelFilter::INFO,
    }
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}
