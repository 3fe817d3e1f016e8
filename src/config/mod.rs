//! # Runtime Configuration
//!
//! Lambda runtime settings loaded from environment variables.
//!
//! The handler and dispatcher share one binary; `SECRET_TEMPLATE_MODE` picks
//! the behavior and is set per function by the synthesized template.

pub mod manifest;

use crate::constants::{ENDPOINT_URL_ENV, HANDLER_FUNCTION_NAME_ENV, MODE_ENV};
use crate::error::ConfigError;

/// Which side of the custom-resource contract this function serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Resolves secrets; invoked by the dispatcher
    Handler,
    /// Receives CloudFormation requests and uploads responses
    Dispatch,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Handler => "handler",
            Mode::Dispatch => "dispatch",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "handler" => Ok(Mode::Handler),
            "dispatch" | "dispatcher" => Ok(Mode::Dispatch),
            _ => Err(ConfigError::InvalidValue {
                key: MODE_ENV,
                value: value.to_string(),
                expected: "handler, dispatch",
            }),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT",
                value: value.to_string(),
                expected: "json, text",
            }),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub mode: Mode,
    /// Handler function invoked by the dispatcher (dispatch mode only)
    pub handler_function_name: Option<String>,
    /// Region override; the SDK falls back to `AWS_REGION` injected by Lambda
    pub region: Option<String>,
    /// Endpoint override for all AWS clients (contract tests, local stacks)
    pub endpoint_url: Option<String>,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE), used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Handler,
            handler_function_name: None,
            region: None,
            endpoint_url: None,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// # Errors
    ///
    /// Fails on an unknown mode or log format, or when dispatch mode has no
    /// handler function name.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// See [`RuntimeConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mode = non_empty(MODE_ENV)
            .map(|value| Mode::parse(&value))
            .transpose()?
            .unwrap_or(Mode::Handler);
        let handler_function_name = non_empty(HANDLER_FUNCTION_NAME_ENV);
        if mode == Mode::Dispatch && handler_function_name.is_none() {
            return Err(ConfigError::MissingVar(HANDLER_FUNCTION_NAME_ENV));
        }

        let log_format = non_empty("LOG_FORMAT")
            .map(|value| LogFormat::parse(&value))
            .transpose()?
            .unwrap_or(LogFormat::Json);

        Ok(Self {
            mode,
            handler_function_name,
            region: non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")),
            endpoint_url: non_empty(ENDPOINT_URL_ENV),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            log_format,
        })
    }
}
