//! # IAM Declarations
//!
//! Policy statements, principals and roles with a lazily created default
//! policy, as needed by the provider and the per-reference access roles.

use crate::error::SynthError;
use crate::synth::expr::Expr;
use crate::synth::stack::{ConstructPath, Resource, Stack};
use serde_json::{json, Map, Value};

const POLICY_VERSION: &str = "2012-10-17";
const DEFAULT_POLICY_ID: &str = "DefaultPolicy";

/// Who may assume a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// An IAM identity by ARN
    Arn(Expr),
    /// An AWS service, e.g. `lambda.amazonaws.com`
    Service(String),
}

impl Principal {
    fn to_json(&self) -> Value {
        match self {
            Principal::Arn(arn) => json!({ "AWS": arn.to_json() }),
            Principal::Service(service) => json!({ "Service": service }),
        }
    }
}

/// One `Allow` policy statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    actions: Vec<String>,
    resources: Vec<Expr>,
    conditions: Vec<(String, String, Expr)>,
}

impl PolicyStatement {
    pub fn allow() -> Self {
        PolicyStatement {
            actions: Vec::new(),
            resources: Vec::new(),
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn on(mut self, resource: Expr) -> Self {
        self.resources.push(resource);
        self
    }

    /// Restrict the statement with `{operator: {key: value}}`
    #[must_use]
    pub fn condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: Expr,
    ) -> Self {
        self.conditions.push((operator.into(), key.into(), value));
        self
    }

    pub fn to_json(&self) -> Value {
        let action = match self.actions.as_slice() {
            [single] => json!(single),
            many => json!(many),
        };
        let resource = match self.resources.as_slice() {
            [single] => single.to_json(),
            many => Value::Array(many.iter().map(Expr::to_json).collect()),
        };
        let mut statement = json!({
            "Effect": "Allow",
            "Action": action,
            "Resource": resource,
        });
        if !self.conditions.is_empty() {
            let mut conditions = Map::new();
            for (operator, key, value) in &self.conditions {
                let entry = conditions
                    .entry(operator.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(keys) = entry {
                    keys.insert(key.clone(), value.to_json());
                }
            }
            statement["Condition"] = Value::Object(conditions);
        }
        statement
    }
}

/// Trust policy allowing `principal` to assume a role
pub fn assume_role_policy(principal: &Principal) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": principal.to_json(),
            "Action": "sts:AssumeRole",
        }],
    })
}

/// A declared `AWS::IAM::Role`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    path: ConstructPath,
    logical_id: String,
}

impl Role {
    /// Declare a role at `path`
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if the path or logical id is taken.
    pub fn declare(
        stack: &mut Stack,
        path: &ConstructPath,
        assumed_by: &Principal,
        managed_policies: &[Expr],
    ) -> Result<Self, SynthError> {
        let mut resource = Resource::new("AWS::IAM::Role")
            .property("AssumeRolePolicyDocument", assume_role_policy(assumed_by));
        if !managed_policies.is_empty() {
            resource = resource.property(
                "ManagedPolicyArns",
                Value::Array(managed_policies.iter().map(Expr::to_json).collect()),
            );
        }
        let logical_id = stack.add_resource(path, resource)?;
        Ok(Role {
            path: path.clone(),
            logical_id,
        })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    fn default_policy_path(&self) -> ConstructPath {
        self.path.child(DEFAULT_POLICY_ID)
    }

    /// Logical id of the default policy, once a statement has been added
    pub fn default_policy_logical_id<'a>(&self, stack: &'a Stack) -> Option<&'a str> {
        stack.logical_id_at(&self.default_policy_path())
    }

    /// Add a statement to the role's default policy, creating the policy on first use
    ///
    /// Identical statements are only recorded once.
    ///
    /// # Errors
    ///
    /// Returns the stack's declaration error if the policy cannot be declared.
    pub fn add_to_policy(
        &self,
        stack: &mut Stack,
        statement: &PolicyStatement,
    ) -> Result<(), SynthError> {
        let policy_path = self.default_policy_path();
        let statement_json = statement.to_json();

        let Some(policy_logical_id) = stack.logical_id_at(&policy_path).map(str::to_string) else {
            let policy_name = policy_path.logical_id();
            let resource = Resource::new("AWS::IAM::Policy")
                .property("PolicyName", policy_name)
                .property(
                    "PolicyDocument",
                    json!({ "Version": POLICY_VERSION, "Statement": [statement_json] }),
                )
                .property("Roles", json!([{ "Ref": self.logical_id }]));
            stack.add_resource(&policy_path, resource)?;
            return Ok(());
        };

        if let Some(Value::Array(statements)) = stack
            .resource_mut(&policy_logical_id)
            .and_then(|policy| policy.properties.get_mut("PolicyDocument"))
            .and_then(|document| document.get_mut("Statement"))
        {
            if !statements.contains(&statement_json) {
                statements.push(statement_json);
            }
        }
        Ok(())
    }
}
