//! # Backing Stores
//!
//! Secrets Manager secrets and SSM string parameters, either declared in the
//! stack or imported by ARN/name. Both can grant read access to a role.

use crate::error::SynthError;
use crate::properties::SecretType;
use crate::synth::expr::Expr;
use crate::synth::iam::{PolicyStatement, Role};
use crate::synth::stack::{ConstructPath, Resource, Stack};
use serde_json::json;

const PARAMETER_ARN_PREFIX: &str = "arn:${AWS::Partition}:ssm:${AWS::Region}:${AWS::AccountId}:parameter";
const SECRETS_MANAGER_VIA_SERVICE: &str = "secretsmanager.${AWS::Region}.amazonaws.com";

/// A store that a secret template can read from
pub trait BackingStore {
    /// Construct path; declarations are placed under it
    fn path(&self) -> &ConstructPath;

    /// ARN passed to the handler as `ValueARN`
    fn value_arn(&self) -> Expr;

    fn secret_type(&self) -> SecretType;

    /// Grant `role` least-privilege read access to this store
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if the role policy cannot be declared.
    fn grant_read(&self, stack: &mut Stack, role: &Role) -> Result<(), SynthError>;
}

/// `GenerateSecretString` settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSecret {
    /// JSON object the generated value is merged into
    pub secret_string_template: String,
    /// Key the generated value is stored under
    pub generate_string_key: String,
    pub exclude_punctuation: bool,
    pub password_length: Option<u32>,
}

/// Properties of a declared secret
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretProps {
    pub secret_name: Option<String>,
    pub description: Option<String>,
    pub generate: Option<GeneratedSecret>,
    /// Customer-managed KMS key; the AWS managed key is used when unset
    pub encryption_key_arn: Option<String>,
}

/// A Secrets Manager secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    path: ConstructPath,
    arn: Expr,
    encryption_key_arn: Option<Expr>,
}

impl Secret {
    /// Declare an `AWS::SecretsManager::Secret`
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if `id` is taken.
    pub fn declare(stack: &mut Stack, id: &str, props: &SecretProps) -> Result<Self, SynthError> {
        let path = ConstructPath::root(id);
        let mut resource = Resource::new("AWS::SecretsManager::Secret");
        if let Some(name) = &props.secret_name {
            resource = resource.property("Name", name.as_str());
        }
        if let Some(description) = &props.description {
            resource = resource.property("Description", description.as_str());
        }
        if let Some(key_arn) = &props.encryption_key_arn {
            resource = resource.property("KmsKeyId", key_arn.as_str());
        }
        if let Some(generate) = &props.generate {
            let mut settings = json!({
                "SecretStringTemplate": generate.secret_string_template,
                "GenerateStringKey": generate.generate_string_key,
            });
            if generate.exclude_punctuation {
                settings["ExcludePunctuation"] = json!(true);
            }
            if let Some(length) = generate.password_length {
                settings["PasswordLength"] = json!(length);
            }
            resource = resource.property("GenerateSecretString", settings);
        }

        let logical_id = stack.add_resource(&path, resource)?;
        // Ref on a secret resolves to its ARN
        Ok(Secret {
            path,
            arn: Expr::reference(logical_id),
            encryption_key_arn: props.encryption_key_arn.as_deref().map(Expr::literal),
        })
    }

    /// Reference an existing secret by ARN
    ///
    /// `id` is claimed in the stack so it cannot name a second store. Pass the
    /// KMS key ARN when the secret is encrypted with a customer-managed key.
    ///
    /// # Errors
    ///
    /// Fails with [`SynthError::DuplicatePath`] if `id` is taken.
    pub fn from_secret_arn(
        stack: &mut Stack,
        id: &str,
        arn: impl Into<String>,
        encryption_key_arn: Option<String>,
    ) -> Result<Self, SynthError> {
        let path = ConstructPath::root(id);
        stack.claim_path(&path)?;
        Ok(Secret {
            path,
            arn: Expr::literal(arn),
            encryption_key_arn: encryption_key_arn.map(Expr::literal),
        })
    }

    pub fn secret_arn(&self) -> &Expr {
        &self.arn
    }

    pub fn encryption_key_arn(&self) -> Option<&Expr> {
        self.encryption_key_arn.as_ref()
    }
}

impl BackingStore for Secret {
    fn path(&self) -> &ConstructPath {
        &self.path
    }

    fn value_arn(&self) -> Expr {
        self.arn.clone()
    }

    fn secret_type(&self) -> SecretType {
        SecretType::SecretManager
    }

    fn grant_read(&self, stack: &mut Stack, role: &Role) -> Result<(), SynthError> {
        role.add_to_policy(
            stack,
            &PolicyStatement::allow()
                .actions([
                    "secretsmanager:GetSecretValue",
                    "secretsmanager:DescribeSecret",
                ])
                .on(self.arn.clone()),
        )?;
        // Decryption is only allowed through Secrets Manager itself
        if let Some(key_arn) = &self.encryption_key_arn {
            role.add_to_policy(
                stack,
                &PolicyStatement::allow()
                    .actions(["kms:Decrypt"])
                    .on(key_arn.clone())
                    .condition(
                        "StringEquals",
                        "kms:ViaService",
                        Expr::sub(SECRETS_MANAGER_VIA_SERVICE),
                    ),
            )?;
        }
        Ok(())
    }
}

/// Properties of a declared string parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringParameterProps {
    pub parameter_name: Option<String>,
    pub value: String,
    pub description: Option<String>,
}

/// An SSM Parameter Store parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringParameter {
    path: ConstructPath,
    name: Expr,
    arn: Expr,
    encryption_key_arn: Option<Expr>,
}

impl StringParameter {
    /// Declare an `AWS::SSM::Parameter` of type `String`
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if `id` is taken.
    pub fn declare(
        stack: &mut Stack,
        id: &str,
        props: &StringParameterProps,
    ) -> Result<Self, SynthError> {
        let path = ConstructPath::root(id);
        let mut resource = Resource::new("AWS::SSM::Parameter")
            .property("Type", "String")
            .property("Value", props.value.as_str());
        if let Some(name) = &props.parameter_name {
            resource = resource.property("Name", name.as_str());
        }
        if let Some(description) = &props.description {
            resource = resource.property("Description", description.as_str());
        }

        let logical_id = stack.add_resource(&path, resource)?;
        // Ref resolves to the parameter name, which ties readers to the parameter's
        // creation. Generated names never start with a slash.
        let separator = match &props.parameter_name {
            Some(name) if name.starts_with('/') => "",
            _ => "/",
        };
        Ok(StringParameter {
            path,
            name: Expr::reference(&logical_id),
            arn: Expr::join(
                "",
                vec![
                    Expr::sub(format!("{PARAMETER_ARN_PREFIX}{separator}")),
                    Expr::reference(&logical_id),
                ],
            ),
            encryption_key_arn: None,
        })
    }

    /// Reference an existing parameter by name
    ///
    /// Pass the KMS key ARN for `SecureString` parameters encrypted with a
    /// customer-managed key so the access role can decrypt.
    ///
    /// # Errors
    ///
    /// Fails with [`SynthError::DuplicatePath`] if `id` is taken.
    pub fn from_parameter_name(
        stack: &mut Stack,
        id: &str,
        name: impl Into<String>,
        encryption_key_arn: Option<String>,
    ) -> Result<Self, SynthError> {
        let path = ConstructPath::root(id);
        stack.claim_path(&path)?;
        let name = name.into();
        Ok(StringParameter {
            path,
            arn: parameter_arn(&name),
            name: Expr::literal(name),
            encryption_key_arn: encryption_key_arn.map(Expr::literal),
        })
    }

    pub fn parameter_name(&self) -> &Expr {
        &self.name
    }

    pub fn parameter_arn(&self) -> &Expr {
        &self.arn
    }

    pub fn encryption_key_arn(&self) -> Option<&Expr> {
        self.encryption_key_arn.as_ref()
    }
}

impl BackingStore for StringParameter {
    fn path(&self) -> &ConstructPath {
        &self.path
    }

    fn value_arn(&self) -> Expr {
        self.arn.clone()
    }

    fn secret_type(&self) -> SecretType {
        SecretType::Ssm
    }

    fn grant_read(&self, stack: &mut Stack, role: &Role) -> Result<(), SynthError> {
        role.add_to_policy(
            stack,
            &PolicyStatement::allow()
                .actions([
                    "ssm:DescribeParameters",
                    "ssm:GetParameters",
                    "ssm:GetParameter",
                    "ssm:GetParameterHistory",
                ])
                .on(self.arn.clone()),
        )?;
        if let Some(key_arn) = &self.encryption_key_arn {
            role.add_to_policy(
                stack,
                &PolicyStatement::allow()
                    .actions(["kms:Decrypt"])
                    .on(key_arn.clone()),
            )?;
        }
        Ok(())
    }
}

fn parameter_arn(name: &str) -> Expr {
    if name.starts_with('/') {
        Expr::sub(format!("{PARAMETER_ARN_PREFIX}{name}"))
    } else {
        Expr::sub(format!("{PARAMETER_ARN_PREFIX}/{name}"))
    }
}
