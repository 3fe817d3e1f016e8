//! Shared helpers for integration and Pact tests

#![allow(dead_code, reason = "each test crate uses a subset of the helpers")]

use aws_config::SdkConfig;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use secret_template::config::RuntimeConfig;
use secret_template::provider::aws::create_sdk_config;
use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Install the ring crypto provider once per test binary
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Base URL of a Pact mock server, without the trailing slash
pub fn mock_base_url(url: &impl ToString) -> String {
    let mut base_url = url.to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

/// Runtime config routing every AWS client to `endpoint_url`
pub fn runtime_config_for(endpoint_url: &str) -> RuntimeConfig {
    RuntimeConfig {
        region: Some("us-east-1".to_string()),
        endpoint_url: Some(endpoint_url.to_string()),
        ..RuntimeConfig::default()
    }
}

/// SDK config pointed at a Pact mock server
///
/// The function's execution identity is replaced by static credentials so
/// requests are signed without an ambient AWS profile.
pub async fn sdk_config_for(mock_url: &impl ToString) -> SdkConfig {
    create_sdk_config(&runtime_config_for(&mock_base_url(mock_url)))
        .await
        .into_builder()
        .credentials_provider(SharedCredentialsProvider::new(execution_credentials()))
        .build()
}

/// Static credentials standing in for the Lambda execution role
pub fn execution_credentials() -> Credentials {
    Credentials::new(
        "ASIATESTEXECUTION",
        "test-execution-secret",
        Some("test-execution-token".to_string()),
        None,
        "pact",
    )
}

/// Static credentials standing in for an assumed access role
pub fn assumed_credentials() -> Credentials {
    Credentials::new(
        "ASIATESTACCESSKEY",
        "test-secret-access-key",
        Some("test-session-token".to_string()),
        None,
        "pact",
    )
}
