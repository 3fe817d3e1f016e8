//! # Observability
//!
//! Structured logging for both Lambda modes and the CLI.
//!
//! - `logging`: `tracing` subscriber setup (JSON or text)

pub mod logging;

pub use logging::*;
