//! Log output for native hosts
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's choice. This helper installs one configured from [`LogConfig`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

/// Builds the filter: `RUST_LOG` wins, otherwise `config.level`
#[must_use]
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a global subscriber.
///
/// Returns false if one was already installed.
pub fn init(config: &LogConfig) -> bool {
    let filter = env_filter(config);
    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).compact())
            .try_init()
    };

    if installed.is_ok() {
        tracing::debug!(level = %config.level, json = config.json, "logging initialized");
    }
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_falls_back_on_garbage() {
        let config = LogConfig {
            level: "[[not a directive".to_string(),
            json: false,
        };
        // Must not panic whatever RUST_LOG holds
        let _ = env_filter(&config);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LogConfig::default();
        let first = init(&config);
        let second = init(&config);
        assert!(!second);
        let _ = first;
    }
}
