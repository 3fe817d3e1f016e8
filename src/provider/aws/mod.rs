//! # AWS Providers
//!
//! SDK configuration plus the STS, Secrets Manager and Parameter Store clients
//! used by the handler, and the Lambda client used by the dispatcher.

pub mod parameter_store;
pub mod secrets_manager;
pub mod sts;

pub use parameter_store::AwsParameterStore;
pub use secrets_manager::AwsSecretsManager;
pub use sts::StsCredentialBroker;

use crate::config::RuntimeConfig;
use crate::properties::SecretType;
use crate::provider::SecretFetcher;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use tracing::info;
use zeroize::Zeroizing;

/// Create AWS SDK config using the default credential chain
///
/// In Lambda the chain resolves to the function's execution role. The endpoint
/// override routes every client to one URL (mock servers in contract tests).
pub async fn create_sdk_config(config: &RuntimeConfig) -> SdkConfig {
    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(region) = &config.region {
        builder = builder.region(aws_config::Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_url {
        info!("Overriding AWS endpoint: {}", endpoint);
        builder = builder.endpoint_url(endpoint);
    }

    builder.load().await
}

/// Routes fetches to Secrets Manager or Parameter Store by secret type
#[derive(Debug, Clone)]
pub struct AwsSecretFetcher {
    secrets_manager: AwsSecretsManager,
    parameter_store: AwsParameterStore,
}

impl AwsSecretFetcher {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            secrets_manager: AwsSecretsManager::new(sdk_config),
            parameter_store: AwsParameterStore::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretFetcher for AwsSecretFetcher {
    async fn fetch(
        &self,
        secret_type: SecretType,
        value_arn: &str,
        credentials: &Credentials,
    ) -> Result<Option<Zeroizing<String>>> {
        match secret_type {
            SecretType::SecretManager => {
                self.secrets_manager
                    .get_secret_value(value_arn, credentials)
                    .await
            }
            SecretType::Ssm => {
                self.parameter_store
                    .get_parameter_value(value_arn, credentials)
                    .await
            }
        }
    }
}
