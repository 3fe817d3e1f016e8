//! # Errors
//!
//! Typed errors for synthesis and configuration. Runtime paths (handler,
//! dispatcher, AWS providers) use `anyhow` with context instead.

use thiserror::Error;

/// Errors raised while declaring resources in a stack
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthError {
    #[error("logical id {logical_id} is already declared at {existing_path} (new path: {path})")]
    DuplicateLogicalId {
        logical_id: String,
        existing_path: String,
        path: String,
    },
    #[error("construct path {0} is already declared")]
    DuplicatePath(String),
    #[error("provider was declared in stack {provider_stack}, not in this {stack} stack")]
    ForeignStack {
        provider_stack: String,
        stack: String,
    },
    #[error("output {0} is already declared")]
    DuplicateOutput(String),
}

/// Errors raised while loading runtime configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    MissingVar(&'static str),
    #[error("invalid value {value:?} for {key}: expected one of {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Errors raised while turning a manifest into a stack
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("output {output} references unknown store {store}")]
    UnknownStore { output: String, store: String },
    #[error("store id {0} is declared more than once")]
    DuplicateStore(String),
    #[error("store {id} is invalid: {reason}")]
    InvalidStore { id: String, reason: &'static str },
    #[error(transparent)]
    Synth(#[from] SynthError),
}
