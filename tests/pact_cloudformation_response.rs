//! Pact contract tests for the CloudFormation response upload
//!
//! CloudFormation hands the dispatcher a pre-signed S3 URL; the response
//! document is `PUT` there once per request.

mod common;

use async_trait::async_trait;
use common::{init_rustls, mock_base_url};
use pact_consumer::prelude::*;
use secret_template::dispatch::{
    dispatch, CloudFormationRequest, HandlerInvoker, InvokeOutcome, ResponseStatus,
    ResponseUploader,
};
use secret_template::handler::RequestType;
use serde_json::{json, Value};

struct StaticInvoker(Value);

#[async_trait]
impl HandlerInvoker for StaticInvoker {
    async fn invoke(&self, _payload: &Value) -> anyhow::Result<InvokeOutcome> {
        Ok(InvokeOutcome::Completed(self.0.clone()))
    }
}

fn request(response_url: String) -> CloudFormationRequest {
    CloudFormationRequest {
        request_type: RequestType::Create,
        response_url,
        stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/test-stack/guid".to_string(),
        request_id: "req-1".to_string(),
        resource_type: "Custom::SecretTemplate".to_string(),
        logical_resource_id: "TestSecretTemplate".to_string(),
        physical_resource_id: None,
        resource_properties: json!({
            "ValueARN": "arn:aws:ssm:us-east-1:123456789012:parameter/app/greeting",
            "SecretType": "SSM",
            "AccessRole": "arn:aws:iam::123456789012:role/access",
        }),
        old_resource_properties: None,
        service_token: None,
    }
}

#[tokio::test]
async fn test_cloudformation_response_upload_contract() {
    init_rustls();
    let mut pact_builder =
        PactBuilder::new("Secret-Template-Dispatcher", "CloudFormation-Response-Bucket");

    pact_builder.interaction("upload a successful custom resource response", "", |mut i| {
        i.given("a pre-signed response URL was issued");
        i.request.method("PUT").path("/cloudformation/response");
        i.response.status(200);
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let url = format!("{}/cloudformation/response", mock_base_url(&mock_server.url()));

    let response = dispatch(
        &request(url),
        &StaticInvoker(json!({"Data": {"Value": "hello"}, "NoEcho": true})),
        &ResponseUploader::default(),
        None,
    )
    .await
    .expect("response uploaded");

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.physical_resource_id, "req-1");
    assert!(response.no_echo);
}

#[tokio::test]
async fn test_cloudformation_response_rejected_contract() {
    init_rustls();
    let mut pact_builder =
        PactBuilder::new("Secret-Template-Dispatcher", "CloudFormation-Response-Bucket");

    pact_builder.interaction("upload to an expired pre-signed URL", "", |mut i| {
        i.given("the pre-signed response URL has expired");
        i.request.method("PUT").path("/cloudformation/expired");
        i.response
            .status(403)
            .header("content-type", "application/xml")
            .body("<Error><Code>AccessDenied</Code><Message>Request has expired</Message></Error>");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let url = format!("{}/cloudformation/expired", mock_base_url(&mock_server.url()));

    let err = dispatch(
        &request(url),
        &StaticInvoker(Value::Null),
        &ResponseUploader::default(),
        None,
    )
    .await
    .expect_err("expired URL fails the upload");

    assert!(format!("{err:#}").contains("403"));
}
