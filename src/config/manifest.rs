//! # Declaration Manifest
//!
//! YAML (or JSON) description of a stack that exposes secret values, rendered
//! by the `secret-template synth` command.
//!
//! ## Example
//!
//! ```yaml
//! stack: test-stack
//! provider:
//!   codeBucket: my-assets
//!   codeKey: secret-template/bootstrap.zip
//! stores:
//!   - kind: secretsManager
//!     id: test-secret
//!     encryptionKeyArn: arn:aws:kms:eu-west-1:123456789012:key/abcd
//!     generate:
//!       secretStringTemplate: '{"username":"test"}'
//!       generateStringKey: password
//!   - kind: ssm
//!     id: db-url
//!     parameterName: /app/db-url
//!     encryptionKeyArn: arn:aws:kms:eu-west-1:123456789012:key/abcd
//! outputs:
//!   - id: test-value
//!     store: test-secret
//!     field: password
//!     exportName: Password
//! ```

use crate::constants::{
    DEFAULT_DISPATCHER_TIMEOUT_SECS, DEFAULT_LAMBDA_MEMORY_MB, DEFAULT_LAMBDA_TIMEOUT_SECS,
};
use crate::error::ManifestError;
use crate::synth::{
    CodeLocation, GeneratedSecret, Output, ProviderProps, Secret, SecretProps,
    SecretTemplateProvider, SecretTemplates, Stack, StringParameter, StringParameterProps,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Stack declaration
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Stack name
    pub stack: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Packaged handler code and function sizing
    pub provider: ProviderManifest,
    /// Backing stores, declared or imported
    #[serde(default)]
    pub stores: Vec<StoreManifest>,
    /// Stack outputs resolved from a store (and optionally one JSON field)
    #[serde(default)]
    pub outputs: Vec<OutputManifest>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderManifest {
    pub code_bucket: String,
    pub code_key: String,
    #[serde(default = "default_memory_size_mb")]
    pub memory_size_mb: u32,
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u32,
    #[serde(default = "default_dispatcher_timeout_secs")]
    pub dispatcher_timeout_secs: u32,
}

fn default_memory_size_mb() -> u32 {
    DEFAULT_LAMBDA_MEMORY_MB
}

fn default_handler_timeout_secs() -> u32 {
    DEFAULT_LAMBDA_TIMEOUT_SECS
}

fn default_dispatcher_timeout_secs() -> u32 {
    DEFAULT_DISPATCHER_TIMEOUT_SECS
}

/// A backing store
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum StoreManifest {
    /// Secrets Manager secret
    SecretsManager(SecretsManagerStore),
    /// SSM Parameter Store parameter
    Ssm(SsmStore),
}

impl StoreManifest {
    pub fn id(&self) -> &str {
        match self {
            StoreManifest::SecretsManager(store) => &store.id,
            StoreManifest::Ssm(store) => &store.id,
        }
    }
}

/// Secrets Manager secret; imported when `arn` is set, declared otherwise
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretsManagerStore {
    pub id: String,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub secret_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub generate: Option<GenerateManifest>,
    /// Customer-managed KMS key encrypting the secret
    #[serde(default)]
    pub encryption_key_arn: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateManifest {
    pub secret_string_template: String,
    pub generate_string_key: String,
    #[serde(default)]
    pub exclude_punctuation: bool,
    #[serde(default)]
    pub password_length: Option<u32>,
}

/// SSM parameter; declared when `value` is set, imported by `parameterName` otherwise
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SsmStore {
    pub id: String,
    #[serde(default)]
    pub parameter_name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// KMS key protecting an imported `SecureString` parameter
    #[serde(default)]
    pub encryption_key_arn: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputManifest {
    pub id: String,
    /// Store id
    pub store: String,
    /// JSON field to extract
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub export_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

enum StoreHandle {
    Secret(Secret),
    Parameter(StringParameter),
}

impl Manifest {
    /// Parse a YAML or JSON manifest
    ///
    /// # Errors
    ///
    /// Fails if the document does not match the manifest schema.
    pub fn from_yaml(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// JSON schema of the manifest format
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Manifest)
    }

    /// Declare everything the manifest describes
    ///
    /// # Errors
    ///
    /// Fails on duplicate or invalid stores, outputs referencing unknown stores,
    /// and declaration errors.
    pub fn synthesize(&self) -> Result<Stack, ManifestError> {
        let mut stack = Stack::new(&self.stack);
        if let Some(description) = &self.description {
            stack = stack.with_description(description);
        }

        let mut stores: HashMap<&str, StoreHandle> = HashMap::new();
        for store in &self.stores {
            if stores.contains_key(store.id()) {
                return Err(ManifestError::DuplicateStore(store.id().to_string()));
            }
            let handle = declare_store(&mut stack, store)?;
            stores.insert(store.id(), handle);
        }

        // The provider is only declared once something reads a store
        let declarations = if self.outputs.is_empty() {
            0
        } else {
            self.declare_outputs(&mut stack, &stores)?
        };

        info!(
            stack = %self.stack,
            resources = stack.resource_count(),
            declarations,
            "Synthesized stack"
        );
        Ok(stack)
    }

    fn declare_outputs(
        &self,
        stack: &mut Stack,
        stores: &HashMap<&str, StoreHandle>,
    ) -> Result<usize, ManifestError> {
        let provider = SecretTemplateProvider::new(
            stack,
            &ProviderProps {
                code: CodeLocation {
                    bucket: self.provider.code_bucket.clone(),
                    key: self.provider.code_key.clone(),
                },
                memory_size_mb: self.provider.memory_size_mb,
                handler_timeout_secs: self.provider.handler_timeout_secs,
                dispatcher_timeout_secs: self.provider.dispatcher_timeout_secs,
            },
        )?;
        let mut templates = SecretTemplates::new(provider);

        for output in &self.outputs {
            let field = output.field.as_deref();
            let value = match stores.get(output.store.as_str()) {
                Some(StoreHandle::Secret(secret)) => {
                    templates.secret_manager_value(stack, secret, field)?
                }
                Some(StoreHandle::Parameter(parameter)) => {
                    templates.ssm_secret_value(stack, parameter, field)?
                }
                None => {
                    return Err(ManifestError::UnknownStore {
                        output: output.id.clone(),
                        store: output.store.clone(),
                    })
                }
            };

            let mut stack_output = Output::new(value);
            if let Some(export_name) = &output.export_name {
                stack_output = stack_output.export_name(export_name);
            }
            if let Some(description) = &output.description {
                stack_output = stack_output.description(description);
            }
            stack.add_output(&output.id, stack_output)?;
        }
        Ok(templates.len())
    }
}

fn declare_store(stack: &mut Stack, store: &StoreManifest) -> Result<StoreHandle, ManifestError> {
    match store {
        StoreManifest::SecretsManager(secret) => {
            if let Some(arn) = &secret.arn {
                if secret.generate.is_some() {
                    return Err(ManifestError::InvalidStore {
                        id: secret.id.clone(),
                        reason: "an imported secret cannot generate a value",
                    });
                }
                return Ok(StoreHandle::Secret(Secret::from_secret_arn(
                    stack,
                    &secret.id,
                    arn,
                    secret.encryption_key_arn.clone(),
                )?));
            }
            let props = SecretProps {
                secret_name: secret.secret_name.clone(),
                description: secret.description.clone(),
                encryption_key_arn: secret.encryption_key_arn.clone(),
                generate: secret.generate.as_ref().map(|generate| GeneratedSecret {
                    secret_string_template: generate.secret_string_template.clone(),
                    generate_string_key: generate.generate_string_key.clone(),
                    exclude_punctuation: generate.exclude_punctuation,
                    password_length: generate.password_length,
                }),
            };
            Ok(StoreHandle::Secret(Secret::declare(stack, &secret.id, &props)?))
        }
        StoreManifest::Ssm(parameter) => match (&parameter.value, &parameter.parameter_name) {
            (Some(value), _) => {
                if parameter.encryption_key_arn.is_some() {
                    return Err(ManifestError::InvalidStore {
                        id: parameter.id.clone(),
                        reason: "declared parameters are plain String parameters and take no key",
                    });
                }
                let props = StringParameterProps {
                    parameter_name: parameter.parameter_name.clone(),
                    value: value.clone(),
                    description: parameter.description.clone(),
                };
                Ok(StoreHandle::Parameter(StringParameter::declare(
                    stack,
                    &parameter.id,
                    &props,
                )?))
            }
            (None, Some(name)) => Ok(StoreHandle::Parameter(StringParameter::from_parameter_name(
                stack,
                &parameter.id,
                name,
                parameter.encryption_key_arn.clone(),
            )?)),
            (None, None) => Err(ManifestError::InvalidStore {
                id: parameter.id.clone(),
                reason: "either value or parameterName is required",
            }),
        },
    }
}
