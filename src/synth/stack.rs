//! # Stack
//!
//! In-memory CloudFormation stack: declared resources keyed by logical id,
//! outputs, and the construct paths they were declared at.
//!
//! Logical ids are derived from construct paths the same way for every
//! resource: the alphanumeric parts of each path component followed by an
//! 8-character uppercase MD5 of the full path. Single-component paths keep
//! their sanitized id without a hash.

use crate::constants::{LOGICAL_ID_HASH_LEN, MAX_LOGICAL_ID_LEN};
use crate::error::SynthError;
use crate::synth::expr::Expr;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use tracing::debug;

static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9]")
        .expect("Failed to compile NON_ALPHANUMERIC regex - this should never happen")
});

static NEXT_STACK_ID: AtomicU64 = AtomicU64::new(1);

/// Path of a construct below the stack root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
    /// Path with a single component directly under the stack root
    pub fn root(id: impl Into<String>) -> Self {
        ConstructPath(vec![id.into()])
    }

    /// Path of a child construct
    #[must_use]
    pub fn child(&self, id: impl Into<String>) -> Self {
        let mut components = self.0.clone();
        components.push(id.into());
        ConstructPath(components)
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Deterministic CloudFormation logical id for this path
    pub fn logical_id(&self) -> String {
        if let [single] = self.0.as_slice() {
            let sanitized = NON_ALPHANUMERIC.replace_all(single, "").to_string();
            if !sanitized.is_empty() {
                return sanitized;
            }
        }

        let full_path = self.0.join("/");
        let hash = format!("{:x}", md5::compute(full_path.as_bytes())).to_uppercase();
        let hash = &hash[..LOGICAL_ID_HASH_LEN];

        // "Resource" is the conventional leaf name and adds nothing to the human part
        let human: String = self
            .0
            .iter()
            .filter(|component| component.as_str() != "Resource")
            .map(|component| NON_ALPHANUMERIC.replace_all(component, "").to_string())
            .collect();

        let max_human = MAX_LOGICAL_ID_LEN - LOGICAL_ID_HASH_LEN;
        let human = if human.len() > max_human {
            &human[human.len() - max_human..]
        } else {
            human.as_str()
        };

        format!("{human}{hash}")
    }
}

impl fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// A resource declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub resource_type: String,
    pub properties: Map<String, Value>,
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Resource {
            resource_type: resource_type.into(),
            properties: Map::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set a property, replacing any previous value
    #[must_use]
    pub fn property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Set a property from an expression
    #[must_use]
    pub fn expr_property(self, name: &str, value: &Expr) -> Self {
        self.property(name, value.to_json())
    }

    #[must_use]
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DeclaredResource {
    path: ConstructPath,
    resource: Resource,
}

/// A stack output
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub value: Expr,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

impl Output {
    pub fn new(value: Expr) -> Self {
        Output {
            value,
            description: None,
            export_name: None,
        }
    }

    #[must_use]
    pub fn export_name(mut self, name: impl Into<String>) -> Self {
        self.export_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A deployment unit
#[derive(Debug, Clone)]
pub struct Stack {
    id: u64,
    name: String,
    description: Option<String>,
    resources: BTreeMap<String, DeclaredResource>,
    paths: HashMap<ConstructPath, String>,
    claimed: HashSet<ConstructPath>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Stack {
            id: NEXT_STACK_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            description: None,
            resources: BTreeMap::new(),
            paths: HashMap::new(),
            claimed: HashSet::new(),
            outputs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process-unique identity; two stacks with the same name still differ
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Reserve `path` for a construct that declares no resource, such as an import
    ///
    /// # Errors
    ///
    /// Fails if the path is already declared or claimed.
    pub fn claim_path(&mut self, path: &ConstructPath) -> Result<(), SynthError> {
        if self.paths.contains_key(path) || !self.claimed.insert(path.clone()) {
            return Err(SynthError::DuplicatePath(path.to_string()));
        }
        debug!(stack = %self.name, path = %path, "Claimed construct path");
        Ok(())
    }

    /// Declare a resource at `path`, returning its logical id
    ///
    /// # Errors
    ///
    /// Fails if the path is already taken or another path maps to the same logical id.
    pub fn add_resource(
        &mut self,
        path: &ConstructPath,
        resource: Resource,
    ) -> Result<String, SynthError> {
        if self.paths.contains_key(path) || self.claimed.contains(path) {
            return Err(SynthError::DuplicatePath(path.to_string()));
        }

        let logical_id = path.logical_id();
        if let Some(existing) = self.resources.get(&logical_id) {
            return Err(SynthError::DuplicateLogicalId {
                logical_id,
                existing_path: existing.path.to_string(),
                path: path.to_string(),
            });
        }

        debug!(
            stack = %self.name,
            path = %path,
            logical_id = %logical_id,
            resource_type = %resource.resource_type,
            "Declared resource"
        );

        self.paths.insert(path.clone(), logical_id.clone());
        self.resources.insert(
            logical_id.clone(),
            DeclaredResource {
                path: path.clone(),
                resource,
            },
        );
        Ok(logical_id)
    }

    /// Logical id of the resource declared at `path`
    pub fn logical_id_at(&self, path: &ConstructPath) -> Option<&str> {
        self.paths.get(path).map(String::as_str)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id).map(|declared| &declared.resource)
    }

    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Resource> {
        self.resources
            .get_mut(logical_id)
            .map(|declared| &mut declared.resource)
    }

    /// Logical ids of all resources of `resource_type`
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a str> {
        self.resources
            .iter()
            .filter(move |(_, declared)| declared.resource.resource_type == resource_type)
            .map(|(logical_id, _)| logical_id.as_str())
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Declare an output
    ///
    /// # Errors
    ///
    /// Fails if an output with the same sanitized id exists.
    pub fn add_output(&mut self, id: &str, output: Output) -> Result<String, SynthError> {
        let output_id = ConstructPath::root(id).logical_id();
        if self.outputs.contains_key(&output_id) {
            return Err(SynthError::DuplicateOutput(output_id));
        }
        self.outputs.insert(output_id.clone(), output);
        Ok(output_id)
    }

    /// Render the CloudFormation template
    pub fn to_template(&self) -> Value {
        let mut template = Map::new();
        template.insert(
            "AWSTemplateFormatVersion".to_string(),
            json!("2010-09-09"),
        );
        if let Some(description) = &self.description {
            template.insert("Description".to_string(), json!(description));
        }

        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|(logical_id, declared)| {
                let mut body = Map::new();
                body.insert("Type".to_string(), json!(declared.resource.resource_type));
                if !declared.resource.properties.is_empty() {
                    body.insert(
                        "Properties".to_string(),
                        Value::Object(declared.resource.properties.clone()),
                    );
                }
                if !declared.resource.depends_on.is_empty() {
                    body.insert("DependsOn".to_string(), json!(declared.resource.depends_on));
                }
                body.insert(
                    "Metadata".to_string(),
                    json!({ "secret-template:path": format!("{}/{}", self.name, declared.path) }),
                );
                (logical_id.clone(), Value::Object(body))
            })
            .collect();
        template.insert("Resources".to_string(), Value::Object(resources));

        if !self.outputs.is_empty() {
            let outputs: Map<String, Value> = self
                .outputs
                .iter()
                .map(|(output_id, output)| {
                    let mut body = Map::new();
                    if let Some(description) = &output.description {
                        body.insert("Description".to_string(), json!(description));
                    }
                    body.insert("Value".to_string(), output.value.to_json());
                    if let Some(export_name) = &output.export_name {
                        body.insert("Export".to_string(), json!({ "Name": export_name }));
                    }
                    (output_id.clone(), Value::Object(body))
                })
                .collect();
            template.insert("Outputs".to_string(), Value::Object(outputs));
        }

        Value::Object(template)
    }
}
