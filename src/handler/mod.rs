//! # Secret Template Handler
//!
//! Resolves a `Custom::SecretTemplate` resource on create and update.
//!
//! ## Pipeline
//!
//! 1. Assume the resource's access role under a fresh random session name
//! 2. Fetch the raw value from Secrets Manager or Parameter Store
//! 3. If `JSONProp` is set and a value came back, extract that field
//! 4. Return `{"Data": {"Value": ...}, "NoEcho": true}`
//!
//! Delete requests return nothing. Role assumption and fetch errors fail the
//! invocation; a value that is not JSON (or lacks the field) resolves to no
//! value and is reported as a warning.

pub mod extract;

use crate::properties::SecretTemplateProperties;
use crate::provider::{CredentialBroker, SecretFetcher};
use anyhow::{Context, Result};
use extract::{extract_field, FieldExtraction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Lifecycle event of a custom resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// Event delivered to the handler
///
/// Only `RequestType` is required; properties are parsed for create and update
/// only, so a delete succeeds whatever was stored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,
    #[serde(default)]
    pub resource_properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// `Data` of the handler response
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseData {
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Debug for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseData")
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Handler response for create and update
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub data: ResponseData,
    /// Always true so the value stays out of stack events and consoles
    pub no_echo: bool,
}

impl CustomResourceResponse {
    pub fn with_value(value: Option<String>) -> Self {
        Self {
            data: ResponseData { value },
            no_echo: true,
        }
    }
}

/// Handle one custom-resource event
///
/// # Errors
///
/// Fails on malformed properties, role assumption errors and fetch errors.
pub async fn handle_event(
    request: &CustomResourceRequest,
    credentials: &dyn CredentialBroker,
    fetcher: &dyn SecretFetcher,
) -> Result<Option<CustomResourceResponse>> {
    if request.request_type == RequestType::Delete {
        info!(
            logical_resource_id = request.logical_resource_id.as_deref().unwrap_or("unknown"),
            "Delete request, nothing to resolve"
        );
        return Ok(None);
    }

    let properties: SecretTemplateProperties =
        serde_json::from_value(request.resource_properties.clone())
            .context("Invalid Custom::SecretTemplate resource properties")?;

    let span = info_span!(
        "secret_template.resolve",
        request_type = ?request.request_type,
        secret_type = %properties.secret_type,
        secret.arn = %properties.value_arn,
        json_prop = properties.json_prop.as_deref().unwrap_or(""),
    );

    async move {
        let session_name = Uuid::new_v4().to_string();
        let assumed = credentials
            .assume_role(&properties.access_role, &session_name)
            .await?;

        let raw = fetcher
            .fetch(properties.secret_type, &properties.value_arn, &assumed)
            .await?;

        let value = match (raw, properties.json_prop.as_deref()) {
            (Some(raw), Some(field)) => match extract_field(&raw, field) {
                FieldExtraction::NotJson(e) => {
                    warn!(
                        field,
                        error = %e,
                        "Value is not JSON, resolving to no value"
                    );
                    None
                }
                FieldExtraction::Missing => {
                    warn!(field, "Field not present in value, resolving to no value");
                    None
                }
                found @ FieldExtraction::Found(_) => found.into_value(),
            },
            (raw, _) => raw.map(|raw| raw.as_str().to_string()),
        };

        info!(resolved = value.is_some(), "Resolved secret template");
        Ok(Some(CustomResourceResponse::with_value(value)))
    }
    .instrument(span)
    .await
}
