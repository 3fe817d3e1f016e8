//! # STS Role Assumption
//!
//! Exchanges the handler's execution identity for access-role credentials.

use crate::provider::CredentialBroker;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use std::time::SystemTime;
use tracing::{field, info_span, Instrument};

const PROVIDER_NAME: &str = "SecretTemplateAssumeRole";

/// `sts:AssumeRole` backed credential broker
#[derive(Debug, Clone)]
pub struct StsCredentialBroker {
    client: StsClient,
}

impl StsCredentialBroker {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: StsClient::new(sdk_config),
        }
    }
}

#[async_trait]
impl CredentialBroker for StsCredentialBroker {
    async fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<Credentials> {
        let span = info_span!(
            "aws.sts.assume_role",
            role.arn = role_arn,
            session.name = session_name,
            operation.success = field::Empty,
        );
        let span_clone = span.clone();

        async move {
            let response = self
                .client
                .assume_role()
                .role_arn(role_arn)
                .role_session_name(session_name)
                .send()
                .await
                .map_err(|e| {
                    span_clone.record("operation.success", false);
                    anyhow!("Failed to assume role {role_arn}: {}", DisplayErrorContext(&e))
                })?;

            let credentials = response
                .credentials()
                .with_context(|| format!("AssumeRole for {role_arn} returned no credentials"))?;
            let expiry = SystemTime::try_from(*credentials.expiration()).ok();

            span_clone.record("operation.success", true);
            Ok(Credentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                Some(credentials.session_token().to_string()),
                expiry,
                PROVIDER_NAME,
            ))
        }
        .instrument(span)
        .await
    }
}
