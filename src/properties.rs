//! # Custom Resource Properties
//!
//! The property contract of `Custom::SecretTemplate`, shared by the synthesis
//! layer (which writes it) and the handler (which reads it back from the event).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backing store kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SecretType {
    /// SSM Parameter Store parameter, read with decryption
    #[serde(rename = "SSM")]
    Ssm,
    /// Secrets Manager secret
    #[serde(rename = "SECRET_MANAGER")]
    SecretManager,
}

impl SecretType {
    pub fn as_str(self) -> &'static str {
        match self {
            SecretType::Ssm => "SSM",
            SecretType::SecretManager => "SECRET_MANAGER",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource properties as received by the handler
///
/// `ServiceToken` and any other framework-added keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretTemplateProperties {
    /// ARN of the parameter or secret
    #[serde(rename = "ValueARN")]
    pub value_arn: String,
    pub secret_type: SecretType,
    /// ARN of the role to assume before reading
    pub access_role: String,
    /// Field to extract when the value is a JSON object
    #[serde(rename = "JSONProp", default, skip_serializing_if = "Option::is_none")]
    pub json_prop: Option<String>,
}
