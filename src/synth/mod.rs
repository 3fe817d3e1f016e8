//! # Template Synthesis
//!
//! Declares the CloudFormation resources that resolve a secret at deploy time.
//!
//! ```no_run
//! use secret_template::synth::{
//!     CodeLocation, Output, ProviderProps, Secret, SecretProps, SecretTemplateProvider,
//!     SecretTemplates, Stack,
//! };
//!
//! # fn main() -> Result<(), secret_template::error::SynthError> {
//! let mut stack = Stack::new("app");
//! let provider = SecretTemplateProvider::new(
//!     &mut stack,
//!     &ProviderProps::new(CodeLocation {
//!         bucket: "assets".to_string(),
//!         key: "secret-template/bootstrap.zip".to_string(),
//!     }),
//! )?;
//! let mut templates = SecretTemplates::new(provider);
//!
//! let secret = Secret::declare(&mut stack, "db", &SecretProps::default())?;
//! let password = templates.secret_manager_value(&mut stack, &secret, Some("password"))?;
//! stack.add_output("db-password", Output::new(password).export_name("DbPassword"))?;
//! # Ok(())
//! # }
//! ```

pub mod backing;
pub mod expr;
pub mod iam;
pub mod lambda;
pub mod provider;
pub mod secret_template;
pub mod stack;

pub use backing::{
    BackingStore, GeneratedSecret, Secret, SecretProps, StringParameter, StringParameterProps,
};
pub use expr::Expr;
pub use iam::{PolicyStatement, Principal, Role};
pub use lambda::{CodeLocation, Function, FunctionProps};
pub use provider::{ProviderProps, SecretTemplateProvider};
pub use secret_template::{SecretTemplate, SecretTemplates};
pub use stack::{ConstructPath, Output, Resource, Stack};
