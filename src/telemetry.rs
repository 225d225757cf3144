//! Tracing setup for the service binary.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Overrides the configured level with full per-target directives,
/// e.g. `TRIALIQ_LOG=debug,hyper=warn`.
pub const LOG_FILTER_ENV: &str = "TRIALIQ_LOG";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log directive '{directive}' is not valid tracing filter syntax")]
    InvalidDirective {
        directive: String,
        source: ParseError,
    },
    #[error("a global tracing subscriber is already installed")]
    SubscriberInstalled(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global subscriber: compact single-line records without ANSI
/// color, filtered by [`LOG_FILTER_ENV`] or, when unset, the configured
/// default level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::SubscriberInstalled)
}

fn log_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let directive = std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| config.log_level.clone());
    EnvFilter::try_new(&directive)
        .map_err(|source| TelemetryError::InvalidDirective { directive, source })
}
