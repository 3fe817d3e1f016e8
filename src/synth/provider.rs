//! # Secret Template Provider
//!
//! The shared handler and dispatcher functions behind every
//! `Custom::SecretTemplate` resource in a stack.
//!
//! A stack holds exactly one provider. It is constructed once by the caller and
//! handed to [`SecretTemplates`](crate::synth::SecretTemplates); declaring a
//! second one in the same stack fails because its construct paths are taken.

use crate::config::Mode;
use crate::constants::{
    DEFAULT_DISPATCHER_TIMEOUT_SECS, DEFAULT_LAMBDA_MEMORY_MB, DEFAULT_LAMBDA_TIMEOUT_SECS,
    HANDLER_FUNCTION_NAME_ENV, LAMBDA_BASIC_EXECUTION_POLICY, MODE_ENV, PROVIDER_CONSTRUCT_ID,
};
use crate::error::SynthError;
use crate::synth::expr::Expr;
use crate::synth::iam::{PolicyStatement, Principal, Role};
use crate::synth::lambda::{CodeLocation, Function, FunctionProps};
use crate::synth::stack::{ConstructPath, Stack};
use tracing::info;

const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";

/// Provider settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProps {
    /// Packaged `bootstrap` binary, shared by handler and dispatcher
    pub code: CodeLocation,
    pub memory_size_mb: u32,
    pub handler_timeout_secs: u32,
    pub dispatcher_timeout_secs: u32,
}

impl ProviderProps {
    pub fn new(code: CodeLocation) -> Self {
        ProviderProps {
            code,
            memory_size_mb: DEFAULT_LAMBDA_MEMORY_MB,
            handler_timeout_secs: DEFAULT_LAMBDA_TIMEOUT_SECS,
            dispatcher_timeout_secs: DEFAULT_DISPATCHER_TIMEOUT_SECS,
        }
    }
}

/// Handler + dispatcher pair for one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretTemplateProvider {
    stack_id: u64,
    stack_name: String,
    handler_role: Role,
    handler: Function,
    dispatcher: Function,
}

impl SecretTemplateProvider {
    /// Declare the provider in `stack`
    ///
    /// # Errors
    ///
    /// Fails with a declaration error if the stack already has a provider.
    pub fn new(stack: &mut Stack, props: &ProviderProps) -> Result<Self, SynthError> {
        let root = ConstructPath::root(PROVIDER_CONSTRUCT_ID);
        let basic_execution = [Expr::sub(LAMBDA_BASIC_EXECUTION_POLICY)];
        let lambda_principal = Principal::Service(LAMBDA_SERVICE.to_string());

        let handler_role = Role::declare(
            stack,
            &root.child("handler-role"),
            &lambda_principal,
            &basic_execution,
        )?;
        let handler = Function::declare(
            stack,
            &root.child("handler"),
            &FunctionProps::new(props.code.clone(), handler_role.arn())
                .env(MODE_ENV, Mode::Handler.as_str())
                .memory_size_mb(props.memory_size_mb)
                .timeout_secs(props.handler_timeout_secs),
            &[],
        )?;

        let dispatcher_role = Role::declare(
            stack,
            &root.child("dispatcher-role"),
            &lambda_principal,
            &basic_execution,
        )?;
        dispatcher_role.add_to_policy(
            stack,
            &PolicyStatement::allow()
                .actions(["lambda:InvokeFunction"])
                .on(handler.arn()),
        )?;
        let dispatcher_policy = dispatcher_role
            .default_policy_logical_id(stack)
            .map(str::to_string);
        let dispatcher_depends_on: Vec<&str> =
            dispatcher_policy.iter().map(String::as_str).collect();
        let dispatcher = Function::declare(
            stack,
            &root.child("dispatcher"),
            &FunctionProps::new(props.code.clone(), dispatcher_role.arn())
                .env(MODE_ENV, Mode::Dispatch.as_str())
                .env(HANDLER_FUNCTION_NAME_ENV, handler.function_name())
                .memory_size_mb(props.memory_size_mb)
                .timeout_secs(props.dispatcher_timeout_secs),
            &dispatcher_depends_on,
        )?;

        info!(
            stack = %stack.name(),
            handler = %handler.logical_id(),
            dispatcher = %dispatcher.logical_id(),
            "Declared secret template provider"
        );

        Ok(SecretTemplateProvider {
            stack_id: stack.id(),
            stack_name: stack.name().to_string(),
            handler_role,
            handler,
            dispatcher,
        })
    }

    /// Whether this provider was declared in `stack`
    pub fn belongs_to(&self, stack: &Stack) -> bool {
        self.stack_id == stack.id()
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// `ServiceToken` for custom resources served by this provider
    pub fn service_token(&self) -> Expr {
        self.dispatcher.arn()
    }

    /// Execution identity that assumes the access roles
    pub fn handler_role_arn(&self) -> Expr {
        self.handler_role.arn()
    }

    pub fn handler(&self) -> &Function {
        &self.handler
    }

    pub fn dispatcher(&self) -> &Function {
        &self.dispatcher
    }

    /// Allow the handler to assume `role_arn`
    ///
    /// Returns the logical id of the handler's policy so dependants can wait for it.
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if the policy cannot be declared.
    pub fn grant_assume(&self, stack: &mut Stack, role_arn: Expr) -> Result<String, SynthError> {
        self.handler_role.add_to_policy(
            stack,
            &PolicyStatement::allow()
                .actions(["sts:AssumeRole"])
                .on(role_arn),
        )?;
        // add_to_policy always leaves a default policy behind
        Ok(self
            .handler_role
            .default_policy_logical_id(stack)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props() -> ProviderProps {
        ProviderProps::new(CodeLocation {
            bucket: "assets".to_string(),
            key: "secret-template/bootstrap.zip".to_string(),
        })
    }

    #[test]
    fn test_provider_declares_functions_and_roles() {
        let mut stack = Stack::new("app");
        let provider = SecretTemplateProvider::new(&mut stack, &props()).unwrap();

        // handler role, handler, dispatcher role + policy, dispatcher
        assert_eq!(stack.resource_count(), 5);
        assert_eq!(stack.resources_of_type("AWS::Lambda::Function").count(), 2);

        let dispatcher = stack.resource(provider.dispatcher().logical_id()).unwrap();
        assert_eq!(
            dispatcher.properties["Environment"]["Variables"],
            json!({
                "HANDLER_FUNCTION_NAME": {"Ref": provider.handler().logical_id()},
                "SECRET_TEMPLATE_MODE": "dispatch"
            })
        );
        assert_eq!(dispatcher.properties["Timeout"], 900);
        assert_eq!(dispatcher.depends_on.len(), 1);

        let handler = stack.resource(provider.handler().logical_id()).unwrap();
        assert_eq!(
            handler.properties["Environment"]["Variables"]["SECRET_TEMPLATE_MODE"],
            "handler"
        );
        assert_eq!(provider.service_token(), provider.dispatcher().arn());
        assert_eq!(provider.stack_name(), "app");
        assert!(provider.belongs_to(&stack));
        assert!(!provider.belongs_to(&Stack::new("app")));
    }

    #[test]
    fn test_second_provider_in_same_stack_rejected() {
        let mut stack = Stack::new("app");
        SecretTemplateProvider::new(&mut stack, &props()).unwrap();
        let err = SecretTemplateProvider::new(&mut stack, &props()).unwrap_err();
        assert!(matches!(err, SynthError::DuplicatePath(_)));
    }

    #[test]
    fn test_grant_assume_accumulates_on_handler_policy() {
        let mut stack = Stack::new("app");
        let provider = SecretTemplateProvider::new(&mut stack, &props()).unwrap();

        let first = provider
            .grant_assume(&mut stack, Expr::get_att("RoleA", "Arn"))
            .unwrap();
        let second = provider
            .grant_assume(&mut stack, Expr::get_att("RoleB", "Arn"))
            .unwrap();
        assert_eq!(first, second);

        let policy = stack.resource(&first).unwrap();
        let statements = policy.properties["PolicyDocument"]["Statement"]
            .as_array()
            .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0]["Action"], "sts:AssumeRole");
    }
}
