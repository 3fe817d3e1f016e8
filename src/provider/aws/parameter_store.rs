//! # AWS Parameter Store Client
//!
//! Reads parameters (with decryption) using assumed-role credentials.

use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::Client as SsmClient;
use std::time::Instant;
use tracing::{debug, field, info_span, Instrument};
use zeroize::Zeroizing;

/// Parameter Store reader
#[derive(Debug, Clone)]
pub struct AwsParameterStore {
    sdk_config: SdkConfig,
}

impl AwsParameterStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sdk_config: sdk_config.clone(),
        }
    }

    fn client(&self, credentials: &Credentials) -> SsmClient {
        let config = aws_sdk_ssm::config::Builder::from(&self.sdk_config)
            .credentials_provider(credentials.clone())
            .build();
        SsmClient::from_conf(config)
    }

    /// Get the value of the parameter named (or ARN-addressed) by `parameter`
    ///
    /// `SecureString` parameters are decrypted.
    ///
    /// # Errors
    ///
    /// Returns the service error with context, including `ParameterNotFound`.
    pub async fn get_parameter_value(
        &self,
        parameter: &str,
        credentials: &Credentials,
    ) -> Result<Option<Zeroizing<String>>> {
        let span = info_span!(
            "aws.parameter.get",
            parameter.name = parameter,
            operation.success = field::Empty,
            operation.found = field::Empty,
            operation.duration_ms = field::Empty,
        );
        let span_clone = span.clone();
        let start = Instant::now();
        let client = self.client(credentials);

        async move {
            let response = match client
                .get_parameter()
                .name(parameter)
                .with_decryption(true)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    span_clone.record("operation.success", false);
                    span_clone.record(
                        "operation.duration_ms",
                        u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    );
                    return Err(anyhow!(
                        "Failed to get AWS Parameter Store parameter {parameter}: {}",
                        DisplayErrorContext(&e)
                    ));
                }
            };

            let value = response
                .parameter()
                .and_then(|p| p.value())
                .map(|v| Zeroizing::new(v.to_string()));

            span_clone.record("operation.success", true);
            span_clone.record("operation.found", value.is_some());
            span_clone.record(
                "operation.duration_ms",
                u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            );
            debug!(
                parameter_type = ?response.parameter().and_then(|p| p.r#type()),
                "Fetched parameter"
            );
            Ok(value)
        }
        .instrument(span)
        .await
    }
}
