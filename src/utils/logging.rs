use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Install a global subscriber for `settings`.
///
/// `RUST_LOG` wins over `settings.level` when set. Returns `false` when a
/// subscriber was already installed, so calling it twice is harmless.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let log_level = settings
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("defi_balance_engine={}", log_level).into());

    let result = if settings.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()
    };

    match result {
        Ok(()) => {
            tracing::info!(level = %log_level, json = settings.json, "Logging initialized");
            true
        }
        Err(_) => false,
    }
}
