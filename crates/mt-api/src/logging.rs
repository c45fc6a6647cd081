//! Structured logging
//!
//! `local` prints human-readable debug logs, `dev` JSON debug logs and
//! `prod` JSON info logs. `logging.level` in the config replaces the
//! per-environment default, and `RUST_LOG` overrides both.

use mt_core::{Environment, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for an environment
pub fn default_filter(env: Environment) -> &'static str {
    match env {
        Environment::Local | Environment::Dev => {
            "mt_api=debug,mt_store=debug,tower_http=debug,audit=info,info"
        }
        Environment::Prod => "info",
    }
}

/// Install the global tracing subscriber
///
/// Call once, early in `main()`; a second call panics.
pub fn init_logging(env: Environment, config: &LoggingConfig) {
    let default_level = config
        .level
        .clone()
        .unwrap_or_else(|| default_filter(env).to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level));

    match env {
        Environment::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        Environment::Dev | Environment::Prod => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_target(true))
                .init();
        }
    }

    tracing::debug!(%env, "logging initialized");
}
