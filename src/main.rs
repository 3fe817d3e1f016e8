//! # Secret Template Lambda
//!
//! One bootstrap binary serves both functions of the provider. The synthesized
//! template sets `SECRET_TEMPLATE_MODE` to `handler` or `dispatch` per function.

use anyhow::{Context, Result};
use lambda_runtime::{service_fn, LambdaEvent};
use secret_template::config::{Mode, RuntimeConfig};
use secret_template::dispatch::{self, CloudFormationRequest, LambdaInvoker, ResponseUploader};
use secret_template::handler::{self, CustomResourceRequest};
use secret_template::observability::init_logging;
use secret_template::provider::aws::{create_sdk_config, AwsSecretFetcher, StsCredentialBroker};
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    // ring provider must be installed before any TLS client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_existing| "Failed to install rustls crypto provider")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
    init_logging(&config)?;

    info!(
        mode = config.mode.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        build.git_hash = env!("BUILD_GIT_HASH"),
        build.datetime = env!("BUILD_DATETIME"),
        "Starting secret-template"
    );

    let sdk_config = create_sdk_config(&config).await;

    match config.mode {
        Mode::Handler => run_handler(&sdk_config).await,
        Mode::Dispatch => run_dispatcher(&config, &sdk_config).await,
    }
}

async fn run_handler(sdk_config: &aws_config::SdkConfig) -> Result<(), lambda_runtime::Error> {
    let credentials = StsCredentialBroker::new(sdk_config);
    let fetcher = AwsSecretFetcher::new(sdk_config);
    let credentials = &credentials;
    let fetcher = &fetcher;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let request: CustomResourceRequest =
            serde_json::from_value(event.payload).context("Invalid custom resource request")?;
        let response = handler::handle_event(&request, credentials, fetcher)
            .await
            .map_err(into_lambda_error)?;
        Ok::<Value, lambda_runtime::Error>(match response {
            Some(response) => serde_json::to_value(response)?,
            None => Value::Null,
        })
    }))
    .await
}

async fn run_dispatcher(
    config: &RuntimeConfig,
    sdk_config: &aws_config::SdkConfig,
) -> Result<(), lambda_runtime::Error> {
    let function_name = config
        .handler_function_name
        .clone()
        .context("Dispatcher started without a handler function name")?;
    let invoker = LambdaInvoker::new(sdk_config, function_name);
    let uploader = ResponseUploader::default();
    let invoker = &invoker;
    let uploader = &uploader;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let request: CloudFormationRequest =
            serde_json::from_value(event.payload).context("Invalid CloudFormation request")?;
        let log_stream = event.context.env_config.log_stream.clone();
        dispatch::dispatch(&request, invoker, uploader, Some(log_stream.as_str()))
            .await
            .map_err(into_lambda_error)?;
        Ok::<Value, lambda_runtime::Error>(Value::Null)
    }))
    .await
}

// Full context chain, so the dispatcher can report it as the failure reason
fn into_lambda_error(e: anyhow::Error) -> lambda_runtime::Error {
    let message = format!("{e:#}");
    error!(error = %message, "Invocation failed");
    message.into()
}
