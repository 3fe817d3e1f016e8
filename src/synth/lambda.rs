//! # Lambda Function Declarations

use crate::constants::{
    DEFAULT_LAMBDA_HANDLER, DEFAULT_LAMBDA_MEMORY_MB, DEFAULT_LAMBDA_RUNTIME,
    DEFAULT_LAMBDA_TIMEOUT_SECS,
};
use crate::error::SynthError;
use crate::synth::expr::Expr;
use crate::synth::stack::{ConstructPath, Resource, Stack};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Location of the packaged function code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocation {
    pub bucket: String,
    pub key: String,
}

/// Properties of a function declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionProps {
    pub code: CodeLocation,
    pub role_arn: Expr,
    pub runtime: String,
    pub handler: String,
    pub memory_size_mb: u32,
    pub timeout_secs: u32,
    pub environment: BTreeMap<String, Expr>,
}

impl FunctionProps {
    pub fn new(code: CodeLocation, role_arn: Expr) -> Self {
        FunctionProps {
            code,
            role_arn,
            runtime: DEFAULT_LAMBDA_RUNTIME.to_string(),
            handler: DEFAULT_LAMBDA_HANDLER.to_string(),
            memory_size_mb: DEFAULT_LAMBDA_MEMORY_MB,
            timeout_secs: DEFAULT_LAMBDA_TIMEOUT_SECS,
            environment: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn memory_size_mb(mut self, memory_size_mb: u32) -> Self {
        self.memory_size_mb = memory_size_mb;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// A declared `AWS::Lambda::Function`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    logical_id: String,
}

impl Function {
    /// Declare a function at `path`
    ///
    /// `depends_on` lists resources that must exist before the function runs,
    /// typically its role's default policy.
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if the path or logical id is taken.
    pub fn declare(
        stack: &mut Stack,
        path: &ConstructPath,
        props: &FunctionProps,
        depends_on: &[&str],
    ) -> Result<Self, SynthError> {
        let mut resource = Resource::new("AWS::Lambda::Function")
            .property(
                "Code",
                json!({ "S3Bucket": props.code.bucket, "S3Key": props.code.key }),
            )
            .expr_property("Role", &props.role_arn)
            .property("Runtime", props.runtime.as_str())
            .property("Handler", props.handler.as_str())
            .property("MemorySize", props.memory_size_mb)
            .property("Timeout", props.timeout_secs);

        if !props.environment.is_empty() {
            let variables: Map<String, Value> = props
                .environment
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect();
            resource = resource.property("Environment", json!({ "Variables": variables }));
        }
        for dependency in depends_on {
            resource = resource.depends_on(*dependency);
        }

        let logical_id = stack.add_resource(path, resource)?;
        Ok(Function { logical_id })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    pub fn function_name(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }
}
