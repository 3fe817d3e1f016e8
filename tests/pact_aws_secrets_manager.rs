//! Pact contract tests for the AWS Secrets Manager API
//!
//! The reader is driven through the real SDK, with its endpoint overridden to
//! the Pact mock server and static credentials standing in for the assumed
//! access role.

mod common;

use common::{assumed_credentials, init_rustls, sdk_config_for};
use pact_consumer::prelude::*;
use secret_template::provider::aws::{AwsSecretFetcher, AwsSecretsManager};
use secret_template::provider::SecretFetcher;
use secret_template::SecretType;
use serde_json::json;

const SECRET_ARN: &str = "arn:aws:secretsmanager:us-east-1:123456789012:secret:test-secret-AbCdEf";

#[tokio::test]
async fn test_aws_get_secret_value_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Secret-Template-Handler", "AWS-Secrets-Manager");

    pact_builder.interaction("get the current value of a JSON secret", "", |mut i| {
        i.given("a JSON secret exists in AWS Secrets Manager");
        i.request
            .method("POST")
            .path("/")
            .header("x-amz-target", "secretsmanager.GetSecretValue");
        i.response
            .status(200)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({
                "ARN": SECRET_ARN,
                "Name": "test-secret",
                "SecretString": "{\"username\":\"test\",\"password\":\"p@ss\"}",
                "VersionId": "test-version-id",
                "VersionStages": ["AWSCURRENT"]
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = sdk_config_for(&mock_server.url()).await;
    let secrets = AwsSecretsManager::new(&sdk_config);

    let value = secrets
        .get_secret_value(SECRET_ARN, &assumed_credentials())
        .await
        .expect("GetSecretValue succeeds")
        .expect("secret has a value");

    assert_eq!(value.as_str(), r#"{"username":"test","password":"p@ss"}"#);
}

#[tokio::test]
async fn test_aws_get_secret_value_not_found_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Secret-Template-Handler", "AWS-Secrets-Manager");

    pact_builder.interaction("get the value of a secret that does not exist", "", |mut i| {
        i.given("the secret does not exist in AWS Secrets Manager");
        i.request
            .method("POST")
            .path("/")
            .header("x-amz-target", "secretsmanager.GetSecretValue");
        i.response
            .status(400)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({
                "__type": "ResourceNotFoundException",
                "message": "Secrets Manager can't find the specified secret."
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = sdk_config_for(&mock_server.url()).await;
    let fetcher = AwsSecretFetcher::new(&sdk_config);

    let err = fetcher
        .fetch(SecretType::SecretManager, SECRET_ARN, &assumed_credentials())
        .await
        .expect_err("missing secret fails the fetch");

    assert!(format!("{err:#}").contains("ResourceNotFoundException"));
}
