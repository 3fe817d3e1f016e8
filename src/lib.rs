//! # Secret Template
//!
//! Exposes AWS Secrets Manager secrets and SSM Parameter Store parameters,
//! or a single field of a JSON value, to CloudFormation templates at deploy
//! time through a `Custom::SecretTemplate` resource.
//!
//! - [`synth`]: declares the provider, access roles and custom resources
//! - [`handler`]: resolves a value under the access role's credentials
//! - [`dispatch`]: bridges CloudFormation requests to the handler
//! - [`mapping`]: deep value mapping for JSON documents

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod mapping;
pub mod observability;
pub mod properties;
pub mod provider;
pub mod synth;

pub use properties::{SecretTemplateProperties, SecretType};
