//! Declaration invariants of the synthesized template

use secret_template::constants::SECRET_TEMPLATE_RESOURCE_TYPE;
use secret_template::error::SynthError;
use secret_template::synth::{
    CodeLocation, ConstructPath, Output, ProviderProps, Secret, SecretProps,
    SecretTemplateProvider, SecretTemplates, Stack, StringParameter, StringParameterProps,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn provider(stack: &mut Stack) -> SecretTemplateProvider {
    SecretTemplateProvider::new(
        stack,
        &ProviderProps::new(CodeLocation {
            bucket: "assets".to_string(),
            key: "secret-template/bootstrap.zip".to_string(),
        }),
    )
    .expect("provider declares")
}

fn setup() -> (Stack, SecretTemplates) {
    let mut stack = Stack::new("test-stack");
    let templates = SecretTemplates::new(provider(&mut stack));
    (stack, templates)
}

fn policy_statements(stack: &Stack, role_logical_id: &str) -> Vec<Value> {
    stack
        .resources_of_type("AWS::IAM::Policy")
        .filter_map(|id| stack.resource(id))
        .filter(|policy| policy.properties["Roles"] == json!([{ "Ref": role_logical_id }]))
        .flat_map(|policy| {
            policy.properties["PolicyDocument"]["Statement"]
                .as_array()
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_same_store_and_field_reuses_declaration() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::declare(&mut stack, "test-secret", &SecretProps::default()).unwrap();

    let first = templates
        .secret_manager(&mut stack, &secret, Some("password"))
        .unwrap();
    let resources_after_first = stack.resource_count();
    let second = templates
        .secret_manager(&mut stack, &secret, Some("password"))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(stack.resource_count(), resources_after_first);
    assert_eq!(templates.len(), 1);
    assert_eq!(
        stack.resources_of_type(SECRET_TEMPLATE_RESOURCE_TYPE).count(),
        1
    );
}

#[test]
fn test_two_fields_get_two_roles_scoped_to_the_secret() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::declare(&mut stack, "test-secret", &SecretProps::default()).unwrap();

    let username = templates
        .secret_manager(&mut stack, &secret, Some("username"))
        .unwrap();
    let password = templates
        .secret_manager(&mut stack, &secret, Some("password"))
        .unwrap();

    assert!(!Arc::ptr_eq(&username, &password));
    assert_ne!(username.logical_id(), password.logical_id());
    assert_ne!(
        username.access_role().logical_id(),
        password.access_role().logical_id()
    );

    let secret_ref = json!({ "Ref": stack.logical_id_at(&secret_path()).unwrap() });
    for template in [&username, &password] {
        let statements = policy_statements(&stack, template.access_role().logical_id());
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0]["Resource"], secret_ref);
        assert_eq!(
            statements[0]["Action"],
            json!(["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"])
        );
    }
}

fn secret_path() -> ConstructPath {
    ConstructPath::root("test-secret")
}

#[test]
fn test_field_and_whole_value_are_distinct_declarations() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::declare(&mut stack, "test-secret", &SecretProps::default()).unwrap();

    let whole = templates.secret_manager(&mut stack, &secret, None).unwrap();
    let field = templates
        .secret_manager(&mut stack, &secret, Some("password"))
        .unwrap();

    assert!(!Arc::ptr_eq(&whole, &field));
    assert_eq!(templates.len(), 2);
}

#[test]
fn test_custom_resource_properties() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::declare(&mut stack, "test-secret", &SecretProps::default()).unwrap();
    let template = templates
        .secret_manager(&mut stack, &secret, Some("password"))
        .unwrap();

    let resource = stack.resource(template.logical_id()).unwrap();
    assert_eq!(resource.resource_type, SECRET_TEMPLATE_RESOURCE_TYPE);
    assert_eq!(resource.properties["SecretType"], "SECRET_MANAGER");
    assert_eq!(resource.properties["JSONProp"], "password");
    assert_eq!(
        resource.properties["ValueARN"],
        json!({ "Ref": stack.logical_id_at(&secret_path()).unwrap() })
    );
    assert_eq!(
        resource.properties["AccessRole"],
        json!({ "Fn::GetAtt": [template.access_role().logical_id(), "Arn"] })
    );
    assert_eq!(
        resource.properties["ServiceToken"],
        json!({ "Fn::GetAtt": [templates.provider().dispatcher().logical_id(), "Arn"] })
    );
    assert_eq!(resource.depends_on.len(), 2);
}

#[test]
fn test_access_role_trusts_handler_role() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::declare(&mut stack, "test-secret", &SecretProps::default()).unwrap();
    let template = templates.secret_manager(&mut stack, &secret, None).unwrap();

    let role = stack.resource(template.access_role().logical_id()).unwrap();
    let statement = &role.properties["AssumeRolePolicyDocument"]["Statement"][0];
    assert_eq!(statement["Action"], "sts:AssumeRole");
    assert_eq!(
        statement["Principal"]["AWS"],
        templates.provider().handler_role_arn().to_json()
    );

    let handler_role_arn = templates.provider().handler_role_arn().to_json();
    let handler_role_id = handler_role_arn["Fn::GetAtt"][0].as_str().unwrap();
    let assume = policy_statements(&stack, handler_role_id);
    assert!(assume.iter().any(|statement| {
        statement["Action"] == "sts:AssumeRole"
            && statement["Resource"] == template.access_role().arn().to_json()
    }));
}

#[test]
fn test_ssm_parameter_with_key_grants_decrypt() {
    let (mut stack, mut templates) = setup();
    let parameter = StringParameter::from_parameter_name(
        &mut stack,
        "db-url",
        "/app/db-url",
        Some("arn:aws:kms:eu-west-1:123456789012:key/abcd".to_string()),
    )
    .unwrap();

    let template = templates.ssm_secret(&mut stack, &parameter, None).unwrap();
    let resource = stack.resource(template.logical_id()).unwrap();
    assert_eq!(resource.properties["SecretType"], "SSM");
    assert!(resource.properties.get("JSONProp").is_none());

    let statements = policy_statements(&stack, template.access_role().logical_id());
    assert!(statements.iter().any(|statement| {
        statement["Resource"] == parameter.parameter_arn().to_json()
            && statement["Action"]
                .as_array()
                .is_some_and(|actions| actions.contains(&json!("ssm:GetParameter")))
    }));
    assert!(statements.iter().any(|statement| {
        statement["Action"] == "kms:Decrypt"
            && statement["Resource"] == "arn:aws:kms:eu-west-1:123456789012:key/abcd"
    }));
}

#[test]
fn test_declared_ssm_parameter_has_no_decrypt() {
    let (mut stack, mut templates) = setup();
    let parameter = StringParameter::declare(
        &mut stack,
        "greeting",
        &StringParameterProps {
            parameter_name: Some("/app/greeting".to_string()),
            value: "hello".to_string(),
            description: None,
        },
    )
    .unwrap();

    let template = templates.ssm_secret(&mut stack, &parameter, None).unwrap();
    let statements = policy_statements(&stack, template.access_role().logical_id());
    assert!(statements
        .iter()
        .all(|statement| statement["Action"] != "kms:Decrypt"));
}

#[test]
fn test_named_ssm_parameter_declaration_refers_to_parameter() {
    let (mut stack, mut templates) = setup();
    let parameter = StringParameter::declare(
        &mut stack,
        "greeting",
        &StringParameterProps {
            parameter_name: Some("/app/greeting".to_string()),
            value: "hello".to_string(),
            description: None,
        },
    )
    .unwrap();
    let parameter_id = stack
        .logical_id_at(&ConstructPath::root("greeting"))
        .unwrap()
        .to_string();

    let template = templates.ssm_secret(&mut stack, &parameter, None).unwrap();
    let resource = stack.resource(template.logical_id()).unwrap();
    // CloudFormation orders creation by Ref, so the handler never runs before the parameter exists
    assert_eq!(
        resource.properties["ValueARN"]["Fn::Join"][1][1],
        json!({ "Ref": parameter_id })
    );

    let statements = policy_statements(&stack, template.access_role().logical_id());
    assert_eq!(statements[0]["Resource"], resource.properties["ValueARN"]);
}

#[test]
fn test_secret_with_key_grants_decrypt_through_secrets_manager() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::from_secret_arn(
        &mut stack,
        "db",
        "arn:aws:secretsmanager:eu-west-1:123456789012:secret:db-AbCdEf",
        Some("arn:aws:kms:eu-west-1:123456789012:key/abcd".to_string()),
    )
    .unwrap();

    let template = templates.secret_manager(&mut stack, &secret, None).unwrap();
    let statements = policy_statements(&stack, template.access_role().logical_id());
    let decrypt = statements
        .iter()
        .find(|statement| statement["Action"] == "kms:Decrypt")
        .expect("decrypt grant");
    assert_eq!(decrypt["Resource"], "arn:aws:kms:eu-west-1:123456789012:key/abcd");
    assert_eq!(
        decrypt["Condition"]["StringEquals"]["kms:ViaService"],
        json!({ "Fn::Sub": "secretsmanager.${AWS::Region}.amazonaws.com" })
    );
}

#[test]
fn test_imports_cannot_share_an_id() {
    let (mut stack, mut templates) = setup();
    let first = Secret::from_secret_arn(
        &mut stack,
        "db",
        "arn:aws:secretsmanager:us-east-1:123456789012:secret:A",
        None,
    )
    .unwrap();
    templates.secret_manager(&mut stack, &first, None).unwrap();

    let err = Secret::from_secret_arn(
        &mut stack,
        "db",
        "arn:aws:secretsmanager:us-east-1:123456789012:secret:B",
        None,
    )
    .unwrap_err();
    assert_eq!(err, SynthError::DuplicatePath("db".to_string()));
    assert_eq!(templates.len(), 1);
}

#[test]
fn test_foreign_stack_rejected() {
    let (_, mut templates) = setup();
    let mut other = Stack::new("other-stack");
    let secret = Secret::from_secret_arn(
        &mut other,
        "imported",
        "arn:aws:secretsmanager:us-east-1:123456789012:secret:db-AbCdEf",
        None,
    )
    .unwrap();

    let err = templates
        .secret_manager(&mut other, &secret, None)
        .unwrap_err();
    assert_eq!(
        err,
        SynthError::ForeignStack {
            provider_stack: "test-stack".to_string(),
            stack: "other-stack".to_string(),
        }
    );
}

#[test]
fn test_stack_with_same_name_is_still_foreign() {
    let (_, mut templates) = setup();
    let mut other = Stack::new("test-stack");
    let secret = Secret::declare(&mut other, "test-secret", &SecretProps::default()).unwrap();

    let err = templates
        .secret_manager(&mut other, &secret, None)
        .unwrap_err();
    assert!(matches!(err, SynthError::ForeignStack { .. }));
    assert_eq!(other.resource_count(), 1);
}

#[test]
fn test_template_renders_value_output() {
    let (mut stack, mut templates) = setup();
    let secret = Secret::declare(&mut stack, "test-secret", &SecretProps::default()).unwrap();
    let value = templates
        .secret_manager_value(&mut stack, &secret, Some("password"))
        .unwrap();
    stack
        .add_output("test-value", Output::new(value).export_name("Password"))
        .unwrap();

    let template = stack.to_template();
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(template["Outputs"]["testvalue"]["Export"]["Name"], "Password");
    assert_eq!(
        template["Outputs"]["testvalue"]["Value"]["Fn::GetAtt"][1],
        "Value"
    );
}
