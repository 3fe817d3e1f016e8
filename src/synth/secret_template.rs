//! # Secret Template Declarations
//!
//! Declares one `Custom::SecretTemplate` resource per (backing store, field)
//! pair. Each declaration owns an access role that can read exactly one store
//! and that the provider's handler may assume.
//!
//! Declarations are deduplicated through an explicit registry keyed by the
//! store's construct path and the requested field: asking twice for the same
//! pair returns the same [`Arc<SecretTemplate>`] and declares nothing new.

use crate::constants::{
    ACCESS_ROLE_CONSTRUCT_ID, CUSTOM_RESOURCE_CONSTRUCT_ID, SECRET_TEMPLATE_RESOURCE_TYPE,
    TEMPLATE_CONSTRUCT_PREFIX, VALUE_ATTRIBUTE,
};
use crate::error::SynthError;
use crate::properties::SecretType;
use crate::synth::backing::{BackingStore, Secret, StringParameter};
use crate::synth::expr::Expr;
use crate::synth::iam::{Principal, Role};
use crate::synth::provider::SecretTemplateProvider;
use crate::synth::stack::{ConstructPath, Resource, Stack};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type DeclarationKey = (ConstructPath, Option<String>);

/// One declared secret template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretTemplate {
    path: ConstructPath,
    logical_id: String,
    access_role: Role,
    secret_type: SecretType,
    json_prop: Option<String>,
}

impl SecretTemplate {
    /// Construct id of a declaration for `json_prop`
    pub fn construct_id(json_prop: Option<&str>) -> String {
        match json_prop {
            Some(field) => format!("{TEMPLATE_CONSTRUCT_PREFIX}-{field}"),
            None => TEMPLATE_CONSTRUCT_PREFIX.to_string(),
        }
    }

    pub fn path(&self) -> &ConstructPath {
        &self.path
    }

    /// Logical id of the custom resource
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn access_role(&self) -> &Role {
        &self.access_role
    }

    pub fn secret_type(&self) -> SecretType {
        self.secret_type
    }

    pub fn json_prop(&self) -> Option<&str> {
        self.json_prop.as_deref()
    }

    /// The resolved value, usable anywhere a string is accepted
    pub fn value(&self) -> Expr {
        Expr::get_att(&self.logical_id, VALUE_ATTRIBUTE)
    }
}

/// Registry of declarations for one stack
#[derive(Debug)]
pub struct SecretTemplates {
    provider: SecretTemplateProvider,
    declarations: HashMap<DeclarationKey, Arc<SecretTemplate>>,
}

impl SecretTemplates {
    pub fn new(provider: SecretTemplateProvider) -> Self {
        SecretTemplates {
            provider,
            declarations: HashMap::new(),
        }
    }

    pub fn provider(&self) -> &SecretTemplateProvider {
        &self.provider
    }

    /// Number of distinct declarations
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Declaration for a Secrets Manager secret, or the existing one for this field
    ///
    /// # Errors
    ///
    /// Fails if `stack` is not the provider's stack or a resource cannot be declared.
    pub fn secret_manager(
        &mut self,
        stack: &mut Stack,
        secret: &Secret,
        json_prop: Option<&str>,
    ) -> Result<Arc<SecretTemplate>, SynthError> {
        self.get_or_declare(stack, secret, json_prop)
    }

    /// Value of [`Self::secret_manager`]
    ///
    /// # Errors
    ///
    /// See [`Self::secret_manager`].
    pub fn secret_manager_value(
        &mut self,
        stack: &mut Stack,
        secret: &Secret,
        json_prop: Option<&str>,
    ) -> Result<Expr, SynthError> {
        Ok(self.secret_manager(stack, secret, json_prop)?.value())
    }

    /// Declaration for an SSM parameter, or the existing one for this field
    ///
    /// # Errors
    ///
    /// Fails if `stack` is not the provider's stack or a resource cannot be declared.
    pub fn ssm_secret(
        &mut self,
        stack: &mut Stack,
        parameter: &StringParameter,
        json_prop: Option<&str>,
    ) -> Result<Arc<SecretTemplate>, SynthError> {
        self.get_or_declare(stack, parameter, json_prop)
    }

    /// Value of [`Self::ssm_secret`]
    ///
    /// # Errors
    ///
    /// See [`Self::ssm_secret`].
    pub fn ssm_secret_value(
        &mut self,
        stack: &mut Stack,
        parameter: &StringParameter,
        json_prop: Option<&str>,
    ) -> Result<Expr, SynthError> {
        Ok(self.ssm_secret(stack, parameter, json_prop)?.value())
    }

    fn get_or_declare(
        &mut self,
        stack: &mut Stack,
        store: &dyn BackingStore,
        json_prop: Option<&str>,
    ) -> Result<Arc<SecretTemplate>, SynthError> {
        if !self.provider.belongs_to(stack) {
            return Err(SynthError::ForeignStack {
                provider_stack: self.provider.stack_name().to_string(),
                stack: stack.name().to_string(),
            });
        }

        let key: DeclarationKey = (store.path().clone(), json_prop.map(str::to_string));
        if let Some(existing) = self.declarations.get(&key) {
            debug!(
                store = %store.path(),
                json_prop = ?json_prop,
                "Reusing secret template declaration"
            );
            return Ok(Arc::clone(existing));
        }

        let declaration = Arc::new(self.declare(stack, store, json_prop)?);
        self.declarations.insert(key, Arc::clone(&declaration));
        Ok(declaration)
    }

    fn declare(
        &self,
        stack: &mut Stack,
        store: &dyn BackingStore,
        json_prop: Option<&str>,
    ) -> Result<SecretTemplate, SynthError> {
        let path = store.path().child(SecretTemplate::construct_id(json_prop));

        let access_role = Role::declare(
            stack,
            &path.child(ACCESS_ROLE_CONSTRUCT_ID),
            &Principal::Arn(self.provider.handler_role_arn()),
            &[],
        )?;
        store.grant_read(stack, &access_role)?;
        let handler_policy = self.provider.grant_assume(stack, access_role.arn())?;

        let mut resource = Resource::new(SECRET_TEMPLATE_RESOURCE_TYPE)
            .expr_property("ServiceToken", &self.provider.service_token())
            .expr_property("ValueARN", &store.value_arn())
            .property("SecretType", store.secret_type().as_str())
            .expr_property("AccessRole", &access_role.arn());
        if let Some(field) = json_prop {
            resource = resource.property("JSONProp", field);
        }
        // Both policies must be in place before the handler assumes the role and reads
        resource = resource.depends_on(handler_policy);
        if let Some(access_policy) = access_role.default_policy_logical_id(stack) {
            resource = resource.depends_on(access_policy);
        }

        let logical_id = stack.add_resource(&path.child(CUSTOM_RESOURCE_CONSTRUCT_ID), resource)?;
        info!(
            store = %store.path(),
            secret_type = %store.secret_type(),
            json_prop = ?json_prop,
            logical_id = %logical_id,
            "Declared secret template"
        );

        Ok(SecretTemplate {
            path,
            logical_id,
            access_role,
            secret_type: store.secret_type(),
            json_prop: json_prop.map(str::to_string),
        })
    }
}
