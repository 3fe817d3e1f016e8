//! # Logging
//!
//! Installs the global `tracing` subscriber.
//!
//! `RUST_LOG` takes precedence; otherwise `LOG_LEVEL` (a plain level such as
//! `debug`, or a full filter directive) is used, falling back to
//! `secret_template=info`. Lambda already stamps every log line, so
//! timestamps are left out.

use crate::config::{LogFormat, RuntimeConfig};
use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Build the filter for `log_level`
///
/// A bare level applies to this crate only, so SDK internals stay quiet.
pub fn env_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = log_level.trim();
    let directive = if level.is_empty() {
        DEFAULT_LOG_FILTER.to_string()
    } else if level.contains('=') {
        level.to_string()
    } else {
        format!("secret_template={}", level.to_ascii_lowercase())
    };

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber for a Lambda process
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &RuntimeConfig) -> Result<()> {
    let filter = env_filter(&config.log_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time();

    match config.log_format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        LogFormat::Text => builder.with_ansi(false).try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

/// Install a text subscriber writing to stderr, for the CLI
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_cli_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
