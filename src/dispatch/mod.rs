//! # Dispatcher
//!
//! Entry point CloudFormation calls through the service token. Forwards each
//! request to the handler, turns the outcome into a response document and
//! uploads it to the request's `ResponseURL`.
//!
//! ## Physical resource ids
//!
//! - The handler's `PhysicalResourceId` wins when present
//! - Otherwise the request's existing id is kept
//! - A create without either uses the `RequestId`
//!
//! A failed create reports [`CREATE_FAILED_MARKER`] so that the rollback
//! delete can be acknowledged without calling the handler.

pub mod invoke;
pub mod response;

use crate::constants::CREATE_FAILED_MARKER;
use crate::handler::RequestType;
use crate::mapping::redact_leaves;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, info_span, warn, Instrument};

pub use invoke::{HandlerInvoker, InvokeOutcome, LambdaInvoker};
pub use response::{CloudFormationResponse, ResponseStatus, ResponseUploader, MAX_RESPONSE_BYTES};

/// Placeholder forwarded to the handler instead of the pre-signed URL
const REDACTED_RESPONSE_URL: &str = "...";

/// Request delivered by CloudFormation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CloudFormationRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub resource_type: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
}

/// What the handler hands back on success
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HandlerOutput {
    #[serde(default)]
    physical_resource_id: Option<String>,
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    no_echo: bool,
}

impl CloudFormationRequest {
    /// Payload forwarded to the handler, without the pre-signed URL
    ///
    /// # Errors
    ///
    /// Fails only if the request cannot be serialized.
    pub fn handler_payload(&self) -> Result<Value> {
        let mut payload = serde_json::to_value(self).context("Failed to serialize request")?;
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "ResponseURL".to_string(),
                Value::String(REDACTED_RESPONSE_URL.to_string()),
            );
        }
        Ok(payload)
    }

    fn respond(
        &self,
        status: ResponseStatus,
        physical_resource_id: String,
        reason: Option<String>,
    ) -> CloudFormationResponse {
        CloudFormationResponse {
            status,
            reason,
            physical_resource_id,
            stack_id: self.stack_id.clone(),
            request_id: self.request_id.clone(),
            logical_resource_id: self.logical_resource_id.clone(),
            no_echo: false,
            data: None,
        }
    }

    fn fail(&self, reason: String, log_stream: Option<&str>) -> CloudFormationResponse {
        let physical_resource_id = self
            .physical_resource_id
            .clone()
            .unwrap_or_else(|| CREATE_FAILED_MARKER.to_string());
        let reason = match log_stream {
            Some(stream) => format!("{reason}\n\nLogs: CloudWatch log stream {stream}"),
            None => reason,
        };
        self.respond(ResponseStatus::Failed, physical_resource_id, Some(reason))
    }
}

/// Decide the response for `request` without uploading it
///
/// Never fails: invocation errors become `FAILED` responses.
pub async fn resolve(
    request: &CloudFormationRequest,
    invoker: &dyn HandlerInvoker,
    log_stream: Option<&str>,
) -> CloudFormationResponse {
    if request.request_type == RequestType::Delete
        && request.physical_resource_id.as_deref() == Some(CREATE_FAILED_MARKER)
    {
        info!("Delete of a resource whose create failed, skipping handler");
        return request.respond(
            ResponseStatus::Success,
            CREATE_FAILED_MARKER.to_string(),
            None,
        );
    }

    let outcome = match request.handler_payload() {
        Ok(payload) => invoker.invoke(&payload).await,
        Err(e) => Err(e),
    };

    let output = match outcome {
        Ok(InvokeOutcome::Completed(Value::Null)) => HandlerOutput::default(),
        Ok(InvokeOutcome::Completed(value)) => match serde_json::from_value(value) {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Handler returned an unexpected payload");
                return request.fail(format!("Invalid handler response: {e}"), log_stream);
            }
        },
        Ok(InvokeOutcome::FunctionError {
            error_type,
            message,
        }) => {
            warn!(error_type = %error_type, error = %message, "Handler failed");
            return request.fail(message, log_stream);
        }
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(error = %reason, "Handler invocation failed");
            return request.fail(reason, log_stream);
        }
    };

    if request.request_type == RequestType::Delete {
        if let (Some(new_id), Some(old_id)) = (
            output.physical_resource_id.as_deref(),
            request.physical_resource_id.as_deref(),
        ) {
            if new_id != old_id {
                return request.fail(
                    format!(
                        "DELETE cannot change the physical resource ID from {old_id} to {new_id}"
                    ),
                    log_stream,
                );
            }
        }
    }

    let physical_resource_id = output
        .physical_resource_id
        .or_else(|| request.physical_resource_id.clone())
        .unwrap_or_else(|| request.request_id.clone());

    let mut response = request.respond(ResponseStatus::Success, physical_resource_id, None);
    response.no_echo = output.no_echo;
    response.data = output.data;

    let size = serde_json::to_vec(&response).map(|body| body.len()).unwrap_or(usize::MAX);
    if size > MAX_RESPONSE_BYTES {
        return request.fail(
            format!("Response object is too long ({size} bytes, limit {MAX_RESPONSE_BYTES})"),
            log_stream,
        );
    }
    response
}

/// Resolve `request` and upload the response
///
/// # Errors
///
/// Fails only when the response cannot be delivered to CloudFormation.
pub async fn dispatch(
    request: &CloudFormationRequest,
    invoker: &dyn HandlerInvoker,
    uploader: &ResponseUploader,
    log_stream: Option<&str>,
) -> Result<CloudFormationResponse> {
    let span = info_span!(
        "secret_template.dispatch",
        request_type = ?request.request_type,
        logical_resource_id = %request.logical_resource_id,
        request_id = %request.request_id,
    );

    async move {
        info!(
            properties = %redact_leaves(&request.resource_properties),
            "Dispatching custom resource request"
        );

        let response = resolve(request, invoker, log_stream).await;

        let data = response
            .data
            .as_ref()
            .map(|data| redact_leaves(&Value::Object(data.clone())))
            .unwrap_or(Value::Null);
        info!(
            status = ?response.status,
            physical_resource_id = %response.physical_resource_id,
            data = %data,
            "Resolved custom resource request"
        );

        uploader.upload(&request.response_url, &response).await?;
        Ok(response)
    }
    .instrument(span)
    .await
}
