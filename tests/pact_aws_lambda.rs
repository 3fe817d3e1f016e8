//! Pact contract tests for the AWS Lambda Invoke API
//!
//! The dispatcher invokes the handler synchronously and reads either the
//! returned payload or the function error reported in the response header.

mod common;

use common::{init_rustls, sdk_config_for};
use pact_consumer::prelude::*;
use secret_template::dispatch::{HandlerInvoker, InvokeOutcome, LambdaInvoker};
use serde_json::json;

const HANDLER_FUNCTION: &str = "test-stack-secrettemplateproviderhandler";

fn invocation_path() -> String {
    format!("/2015-03-31/functions/{HANDLER_FUNCTION}/invocations")
}

#[tokio::test]
async fn test_aws_invoke_handler_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Secret-Template-Dispatcher", "AWS-Lambda");

    pact_builder.interaction("invoke the handler for a create request", "", |mut i| {
        i.given("the handler resolves the secret");
        i.request
            .method("POST")
            .path(invocation_path().as_str())
            .header("x-amz-invocation-type", "RequestResponse");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({"Data": {"Value": "p@ss"}, "NoEcho": true}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = sdk_config_for(&mock_server.url()).await;
    let invoker = LambdaInvoker::new(&sdk_config, HANDLER_FUNCTION);

    let outcome = invoker
        .invoke(&json!({"RequestType": "Create"}))
        .await
        .expect("Invoke succeeds");

    assert_eq!(
        outcome,
        InvokeOutcome::Completed(json!({"Data": {"Value": "p@ss"}, "NoEcho": true}))
    );
}

#[tokio::test]
async fn test_aws_invoke_handler_function_error_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Secret-Template-Dispatcher", "AWS-Lambda");

    pact_builder.interaction("invoke a handler that fails", "", |mut i| {
        i.given("the handler cannot assume the access role");
        i.request.method("POST").path(invocation_path().as_str());
        i.response
            .status(200)
            .header("content-type", "application/json")
            .header("x-amz-function-error", "Unhandled")
            .json_body(json!({
                "errorType": "&alloc::boxed::Box<dyn core::error::Error>",
                "errorMessage": "Failed to assume role: AccessDenied"
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = sdk_config_for(&mock_server.url()).await;
    let invoker = LambdaInvoker::new(&sdk_config, HANDLER_FUNCTION);

    let outcome = invoker
        .invoke(&json!({"RequestType": "Create"}))
        .await
        .expect("a function error is still a completed invocation");

    assert_eq!(
        outcome,
        InvokeOutcome::FunctionError {
            error_type: "&alloc::boxed::Box<dyn core::error::Error>".to_string(),
            message: "Failed to assume role: AccessDenied".to_string(),
        }
    );
}

#[tokio::test]
async fn test_aws_invoke_handler_empty_payload_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Secret-Template-Dispatcher", "AWS-Lambda");

    pact_builder.interaction("invoke the handler for a delete request", "", |mut i| {
        i.given("the handler has nothing to resolve");
        i.request.method("POST").path(invocation_path().as_str());
        i.response.status(200).header("content-type", "application/json");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = sdk_config_for(&mock_server.url()).await;
    let invoker = LambdaInvoker::new(&sdk_config, HANDLER_FUNCTION);

    let outcome = invoker
        .invoke(&json!({"RequestType": "Delete"}))
        .await
        .expect("Invoke succeeds");

    assert_eq!(outcome, InvokeOutcome::Completed(serde_json::Value::Null));
}
