//! Unit tests for type translation, descriptors and codegen grouping.
mod common;
use common::*;
use seiyaku::codegen::{infer_domain, SecurityPipeline, SecurityStage};
use seiyaku::prelude::*;

fn type_rules() -> ConstraintSet {
    ConstraintSet::empty()
        .with_constraint(Constraint::new(
            "status-enum",
            ConstraintKind::TypeSafety,
            TargetSelector::AllNodes,
            Rule::FieldOneOf {
                path: "properties.status".to_string(),
                allowed: vec!["active".to_string(), "inactive".to_string()],
            },
            Severity::Error,
            50,
            "status must be a known state",
        ))
        .with_constraint(Constraint::new(
            "note-optional",
            ConstraintKind::TypeSafety,
            TargetSelector::AllNodes,
            Rule::FieldOptional {
                path: "properties.note".to_string(),
            },
            Severity::Info,
            10,
            "note may be absent",
        ))
        .with_constraint(Constraint::new(
            "tags-array",
            ConstraintKind::TypeSafety,
            TargetSelector::AllNodes,
            Rule::FieldIsArray {
                path: "properties.tags".to_string(),
            },
            Severity::Error,
            40,
            "tags must be a list",
        ))
}

fn annotated_node() -> Node {
    let mut node = valid_node("n", NodeType::Transform, ExecutionContext::Backend);
    node.properties.insert("status".to_string(), serde_json::json!("active"));
    node.properties.insert("note".to_string(), serde_json::json!("hello"));
    node.properties.insert("tags".to_string(), serde_json::json!(["a", "b"]));
    node.inputs.push(Port::new("value", DataType::Integer));
    node
}

#[test]
fn translation_maps_constraints_to_descriptors() {
    let constraints = type_rules();
    let node = annotated_node();
    let selected: Vec<&Constraint> = constraints.iter().collect();

    let mut translator = TypeTranslator::new();
    let descriptors = translator.translate(&node, &selected);

    assert_eq!(
        descriptors.get("value"),
        Some(&TypeDescriptor::Scalar(DataType::Integer))
    );
    assert_eq!(
        descriptors.get("status"),
        Some(&TypeDescriptor::OneOf(vec![
            "active".to_string(),
            "inactive".to_string()
        ]))
    );
    assert_eq!(
        descriptors.get("note"),
        Some(&TypeDescriptor::Optional(Box::new(TypeDescriptor::Scalar(
            DataType::Text
        ))))
    );
    assert!(matches!(
        descriptors.get("tags"),
        Some(TypeDescriptor::List(_))
    ));
}

#[test]
fn translation_is_idempotent() {
    let constraints = type_rules();
    let node = annotated_node();
    let selected: Vec<&Constraint> = constraints.iter().collect();

    let mut translator = TypeTranslator::new();
    let first = translator.translate(&node, &selected);
    let second = translator.translate(&node, &selected);
    assert_eq!(first, second);

    // A fresh translator must agree too; the cache is an optimization, not
    // part of the contract.
    let mut fresh = TypeTranslator::new();
    assert_eq!(first, fresh.translate(&node, &selected));
}

#[test]
fn changed_properties_bypass_the_cache() {
    let constraints = type_rules();
    let mut node = annotated_node();
    let selected: Vec<&Constraint> = constraints.iter().collect();

    let mut translator = TypeTranslator::new();
    let before = translator.translate(&node, &selected);

    node.properties.insert("note".to_string(), serde_json::json!(12));
    let after = translator.translate(&node, &selected);

    assert_ne!(before.get("note"), after.get("note"));
    assert_eq!(
        after.get("note"),
        Some(&TypeDescriptor::Optional(Box::new(TypeDescriptor::Scalar(
            DataType::Integer
        ))))
    );
}

#[test]
fn descriptor_compatibility_is_equality_plus_declared_widening() {
    let int = TypeDescriptor::Scalar(DataType::Integer);
    let float = TypeDescriptor::Scalar(DataType::Float);
    let text = TypeDescriptor::Scalar(DataType::Text);

    assert!(int.compatible(&int));
    assert!(int.compatible(&float), "integer widens into float");
    assert!(!float.compatible(&int), "narrowing is never implicit");
    assert!(!int.compatible(&text));

    let list_int = TypeDescriptor::List(Box::new(int.clone()));
    let list_float = TypeDescriptor::List(Box::new(float.clone()));
    assert!(list_int.compatible(&list_float));

    let states = TypeDescriptor::OneOf(vec!["on".to_string(), "off".to_string()]);
    assert!(states.compatible(&text), "closed sets travel as text");
    assert!(!text.compatible(&states));
}

#[test]
fn domain_inference_follows_node_type_keywords() {
    let backend = ExecutionContext::Backend;
    assert_eq!(infer_domain(&valid_node("n", NodeType::DataSource, backend)), "data");
    assert_eq!(infer_domain(&valid_node("n", NodeType::ApiCall, backend)), "integration");
    assert_eq!(infer_domain(&valid_node("n", NodeType::UiComponent, backend)), "ui");
    assert_eq!(
        infer_domain(&valid_node("n", NodeType::Transform, backend)),
        "business-logic"
    );
    assert_eq!(
        infer_domain(&valid_node("n", NodeType::Condition, backend)),
        "business-logic"
    );
}

#[test]
fn security_stage_order_is_fixed() {
    assert_eq!(
        SecurityPipeline::STAGES,
        [
            SecurityStage::Authenticate,
            SecurityStage::Authorize,
            SecurityStage::ValidateInput,
            SecurityStage::SanitizeOutput,
            SecurityStage::AuditLog,
        ]
    );
}

#[test]
fn sensitivity_covers_data_access_external_calls_and_tainted_transforms() {
    let backend = ExecutionContext::Backend;
    assert!(valid_node("n", NodeType::DataSource, backend).is_security_sensitive());
    assert!(valid_node("n", NodeType::ApiCall, backend).is_security_sensitive());
    assert!(!valid_node("n", NodeType::Transform, backend).is_security_sensitive());
    assert!(!valid_node("n", NodeType::UiComponent, backend).is_security_sensitive());

    let mut tainted = valid_node("n", NodeType::Transform, backend);
    tainted
        .properties
        .insert("sensitive_fields".to_string(), serde_json::json!(["ssn"]));
    assert!(tainted.is_security_sensitive());

    let mut clean = valid_node("n", NodeType::Transform, backend);
    clean
        .properties
        .insert("sensitive_fields".to_string(), serde_json::json!([]));
    assert!(!clean.is_security_sensitive());
}
