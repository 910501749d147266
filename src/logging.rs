//! Logging setup
//!
//! Installs the global tracing subscriber. `RUST_LOG` takes precedence over
//! the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the env filter, preferring `RUST_LOG` when set
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(config))
}

/// Filter used when `RUST_LOG` is absent or invalid
fn fallback_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(format!(
        "memoscope={level},tower_http={level}",
        level = config.level
    ))
}

/// Initialize tracing with a pretty or JSON formatter
pub fn init(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
