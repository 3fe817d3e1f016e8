//! # Provider Modules
//!
//! Seams between the handler pipeline and AWS.
//!
//! - `CredentialBroker` exchanges an access role ARN for short-lived credentials
//! - `SecretFetcher` reads a raw value from a backing store with those credentials
//!
//! The AWS implementations live in [`aws`]; tests substitute in-memory ones.

use crate::properties::SecretType;
use anyhow::Result;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use zeroize::Zeroizing;

/// Assumes access roles
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Assume `role_arn` under `session_name`
    ///
    /// Called once per invocation; credentials are never cached.
    async fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<Credentials>;
}

/// Reads raw values from backing stores
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    /// Fetch the value at `value_arn` using `credentials`
    ///
    /// Returns `None` when the store answers without a value.
    async fn fetch(
        &self,
        secret_type: SecretType,
        value_arn: &str,
        credentials: &Credentials,
    ) -> Result<Option<Zeroizing<String>>>;
}

pub mod aws;
