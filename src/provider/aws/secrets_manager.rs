//! # AWS Secrets Manager Client
//!
//! Reads secret values with assumed-role credentials.

use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use std::time::Instant;
use tracing::{debug, field, info_span, Instrument};
use zeroize::Zeroizing;

/// Secrets Manager reader
///
/// Holds only the base SDK config; a client is built per call from the
/// credentials of that invocation's access role.
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    sdk_config: SdkConfig,
}

impl AwsSecretsManager {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sdk_config: sdk_config.clone(),
        }
    }

    fn client(&self, credentials: &Credentials) -> SecretsManagerClient {
        let config = aws_sdk_secretsmanager::config::Builder::from(&self.sdk_config)
            .credentials_provider(credentials.clone())
            .build();
        SecretsManagerClient::from_conf(config)
    }

    /// Get the current value of `secret_arn`
    ///
    /// Falls back to the binary value (lossy UTF-8) when the secret has no
    /// string value. Not-found and access-denied errors propagate.
    ///
    /// # Errors
    ///
    /// Returns the service error with context.
    pub async fn get_secret_value(
        &self,
        secret_arn: &str,
        credentials: &Credentials,
    ) -> Result<Option<Zeroizing<String>>> {
        let span = info_span!(
            "aws.secret.get",
            secret.arn = secret_arn,
            operation.success = field::Empty,
            operation.found = field::Empty,
            operation.duration_ms = field::Empty,
        );
        let span_clone = span.clone();
        let start = Instant::now();
        let client = self.client(credentials);

        async move {
            let response = match client.get_secret_value().secret_id(secret_arn).send().await {
                Ok(response) => response,
                Err(e) => {
                    span_clone.record("operation.success", false);
                    span_clone.record(
                        "operation.duration_ms",
                        u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    );
                    return Err(anyhow!(
                        "Failed to get AWS secret {secret_arn}: {}",
                        DisplayErrorContext(&e)
                    ));
                }
            };

            let value = response
                .secret_string()
                .map(ToString::to_string)
                .or_else(|| {
                    response
                        .secret_binary()
                        .map(|blob| String::from_utf8_lossy(blob.as_ref()).into_owned())
                });

            span_clone.record("operation.success", true);
            span_clone.record("operation.found", value.is_some());
            span_clone.record(
                "operation.duration_ms",
                u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            );
            debug!(
                version_id = response.version_id().unwrap_or("unknown"),
                "Fetched secret value"
            );
            Ok(value.map(Zeroizing::new))
        }
        .instrument(span)
        .await
    }
}
