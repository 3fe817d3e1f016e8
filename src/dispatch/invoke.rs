//! # Handler Invocation
//!
//! Synchronous invocation of the handler function from the dispatcher.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client as LambdaClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::{field, info_span, Instrument};

/// Result of one handler invocation
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    /// Handler returned normally with this payload (`null` for no body)
    Completed(Value),
    /// Handler raised an error
    FunctionError { error_type: String, message: String },
}

/// Invokes the handler with a request payload
#[async_trait]
pub trait HandlerInvoker: Send + Sync {
    async fn invoke(&self, payload: &Value) -> Result<InvokeOutcome>;
}

/// Error payload written by the Lambda runtime when a handler fails
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionErrorPayload {
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    error_message: String,
}

/// Parse the raw payload of an invocation
///
/// # Errors
///
/// Fails if a successful invocation returned something other than JSON.
pub fn parse_invoke_payload(function_error: Option<&str>, payload: &[u8]) -> Result<InvokeOutcome> {
    if let Some(kind) = function_error {
        let details: FunctionErrorPayload = serde_json::from_slice(payload).unwrap_or_default();
        let message = if details.error_message.is_empty() {
            String::from_utf8_lossy(payload).into_owned()
        } else {
            details.error_message
        };
        let error_type = if details.error_type.is_empty() {
            kind.to_string()
        } else {
            details.error_type
        };
        return Ok(InvokeOutcome::FunctionError {
            error_type,
            message,
        });
    }

    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(InvokeOutcome::Completed(Value::Null));
    }
    let value = serde_json::from_slice(payload).context("Handler returned a non-JSON payload")?;
    Ok(InvokeOutcome::Completed(value))
}

/// `lambda:InvokeFunction` backed invoker
#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: LambdaClient,
    function_name: String,
}

impl LambdaInvoker {
    pub fn new(sdk_config: &SdkConfig, function_name: impl Into<String>) -> Self {
        Self {
            client: LambdaClient::new(sdk_config),
            function_name: function_name.into(),
        }
    }
}

#[async_trait]
impl HandlerInvoker for LambdaInvoker {
    async fn invoke(&self, payload: &Value) -> Result<InvokeOutcome> {
        let span = info_span!(
            "aws.lambda.invoke",
            function.name = %self.function_name,
            function.error = field::Empty,
        );
        let span_clone = span.clone();

        async move {
            let body = serde_json::to_vec(payload).context("Failed to serialize handler payload")?;
            let response = self
                .client
                .invoke()
                .function_name(&self.function_name)
                .invocation_type(InvocationType::RequestResponse)
                .payload(Blob::new(body))
                .send()
                .await
                .map_err(|e| {
                    anyhow!(
                        "Failed to invoke handler {}: {}",
                        self.function_name,
                        DisplayErrorContext(&e)
                    )
                })?;

            if let Some(kind) = response.function_error() {
                span_clone.record("function.error", kind);
            }
            let raw = response.payload().map(Blob::as_ref).unwrap_or_default();
            parse_invoke_payload(response.function_error(), raw)
        }
        .instrument(span)
        .await
    }
}
