//! # CloudFormation Responses
//!
//! The response document CloudFormation expects at the request's pre-signed
//! `ResponseURL`, and the client that uploads it.

use anyhow::{bail, Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// CloudFormation rejects response documents larger than this
pub const MAX_RESPONSE_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Response document for one custom-resource request
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CloudFormationResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub no_echo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl std::fmt::Debug for CloudFormationResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudFormationResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("physical_resource_id", &self.physical_resource_id)
            .field("logical_resource_id", &self.logical_resource_id)
            .field("no_echo", &self.no_echo)
            .field(
                "data_keys",
                &self.data.as_ref().map(|data| data.keys().collect::<Vec<_>>()),
            )
            .finish_non_exhaustive()
    }
}

impl CloudFormationResponse {
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Uploads response documents
#[derive(Debug, Clone, Default)]
pub struct ResponseUploader {
    client: reqwest::Client,
}

impl ResponseUploader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// `PUT` the response to `response_url`
    ///
    /// The pre-signed URL is signed without a content type, so the header is
    /// sent empty.
    ///
    /// # Errors
    ///
    /// Fails on transport errors and non-2xx answers.
    pub async fn upload(
        &self,
        response_url: &str,
        response: &CloudFormationResponse,
    ) -> Result<()> {
        let body = serde_json::to_vec(response).context("Failed to serialize response")?;
        debug!(bytes = body.len(), "Uploading CloudFormation response");

        let answer = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .context("Failed to upload CloudFormation response")?;

        let status = answer.status();
        if !status.is_success() {
            let text = answer.text().await.unwrap_or_default();
            bail!("CloudFormation response upload rejected with {status}: {text}");
        }

        info!(
            status = ?response.status,
            physical_resource_id = %response.physical_resource_id,
            "Uploaded CloudFormation response"
        );
        Ok(())
    }
}
