//! # Constants
//!
//! Shared constants used by the synthesis layer and the Lambda runtime.
//!
//! The resource type, property names and provider-framework markers are part of
//! the custom-resource contract and must not change between releases, otherwise
//! existing stacks see a replacement on the next deploy.

/// CloudFormation resource type of a secret template declaration
pub const SECRET_TEMPLATE_RESOURCE_TYPE: &str = "Custom::SecretTemplate";

/// Construct id of the shared provider under the stack root
pub const PROVIDER_CONSTRUCT_ID: &str = "secret-template-provider";

/// Construct id prefix of a declaration under its backing store
pub const TEMPLATE_CONSTRUCT_PREFIX: &str = "secret-template";

/// Construct id of the access role under a declaration
pub const ACCESS_ROLE_CONSTRUCT_ID: &str = "access-role";

/// Construct id of the custom resource under a declaration
pub const CUSTOM_RESOURCE_CONSTRUCT_ID: &str = "resource";

/// Output attribute carrying the resolved value
pub const VALUE_ATTRIBUTE: &str = "Value";

/// Physical id reported when a create fails, so the follow-up delete is a no-op
pub const CREATE_FAILED_MARKER: &str = "AWSCDK::CustomResourceProviderFramework::CREATE_FAILED";

/// Environment variable selecting the Lambda mode
pub const MODE_ENV: &str = "SECRET_TEMPLATE_MODE";

/// Environment variable naming the handler function (dispatch mode)
pub const HANDLER_FUNCTION_NAME_ENV: &str = "HANDLER_FUNCTION_NAME";

/// Environment variable overriding AWS service endpoints (contract tests, local stacks)
pub const ENDPOINT_URL_ENV: &str = "SECRET_TEMPLATE_ENDPOINT_URL";

/// Default Lambda runtime for the handler and dispatcher functions
pub const DEFAULT_LAMBDA_RUNTIME: &str = "provided.al2023";

/// Entry point of custom-runtime functions
pub const DEFAULT_LAMBDA_HANDLER: &str = "bootstrap";

/// Default function memory (MB)
pub const DEFAULT_LAMBDA_MEMORY_MB: u32 = 128;

/// Default function timeout (seconds)
pub const DEFAULT_LAMBDA_TIMEOUT_SECS: u32 = 60;

/// Dispatcher timeout (seconds). Must cover the handler timeout plus the upload.
pub const DEFAULT_DISPATCHER_TIMEOUT_SECS: u32 = 900;

/// Managed policy attached to both execution roles
pub const LAMBDA_BASIC_EXECUTION_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Maximum length of a CloudFormation logical id
pub const MAX_LOGICAL_ID_LEN: usize = 255;

/// Length of the path hash suffix appended to logical ids
pub const LOGICAL_ID_HASH_LEN: usize = 8;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "secret_template=info";
