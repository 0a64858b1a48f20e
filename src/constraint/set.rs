use regex::Regex;

use super::{Constraint, ConstraintKind, Severity, TargetSelector};
use super::rule::Rule;
use crate::graph::NodeType;

/// Priority of the security gate. Kept above every other standard
/// constraint so the gate is always evaluated first for a node.
pub const SECURITY_GATE_PRIORITY: i32 = 100;

/// An immutable, ordered collection of constraints.
///
/// Built once at process start and passed by reference into
/// validate/plan/generate calls; the engine never mutates a set after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in constraint catalogue: the non-negotiable security gate,
    /// structural integrity rules, type compatibility, and a few hygiene
    /// checks at lower severities.
    pub fn standard() -> Self {
        let mut set = Self::empty();
        register_standard_constraints(&mut set);
        set
    }

    /// Adds a constraint, builder-style. Application-specific rules layer on
    /// top of the standard catalogue this way.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Constraints applying to a node of the given type, sorted by
    /// descending priority (id as a stable tie-break).
    pub fn for_node_type(&self, node_type: NodeType) -> Vec<&Constraint> {
        let mut selected: Vec<&Constraint> = self
            .constraints
            .iter()
            .filter(|c| c.applies_to_node(node_type))
            .collect();
        selected.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        selected
    }

    /// Connection-scoped constraints, sorted by descending priority.
    pub fn for_connections(&self) -> Vec<&Constraint> {
        self.for_target(TargetSelector::Connections)
    }

    /// Graph-scoped constraints, sorted by descending priority.
    pub fn for_graph(&self) -> Vec<&Constraint> {
        self.for_target(TargetSelector::Graph)
    }

    fn for_target(&self, target: TargetSelector) -> Vec<&Constraint> {
        let mut selected: Vec<&Constraint> = self
            .constraints
            .iter()
            .filter(|c| c.target == target)
            .collect();
        selected.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        selected
    }
}

fn register_standard_constraints(set: &mut ConstraintSet) {
    let mut add = |c: Constraint| set.constraints.push(c);

    add(Constraint::new(
        "security-gate",
        ConstraintKind::Security,
        TargetSelector::AllNodes,
        Rule::SensitiveNodeHasAuth,
        Severity::Error,
        SECURITY_GATE_PRIORITY,
        "Security-sensitive nodes must declare an enabled auth block",
    ));
    add(Constraint::new(
        "parameterized-queries",
        ConstraintKind::Security,
        TargetSelector::NodeType(NodeType::DataSource),
        Rule::FieldForbids {
            path: "properties.query".to_string(),
            // String concatenation or template interpolation inside a query
            // body marks it as non-parameterized.
            pattern: Regex::new(r#"['"]\s*\+|\$\{"#).expect("static pattern"),
        },
        Severity::Error,
        90,
        "Data-source queries must be parameterized, not concatenated",
    ));
    add(Constraint::new(
        "https-endpoints",
        ConstraintKind::Security,
        TargetSelector::NodeType(NodeType::ApiCall),
        Rule::FieldMatches {
            path: "properties.url".to_string(),
            pattern: Regex::new(r"^https://").expect("static pattern"),
        },
        Severity::Error,
        85,
        "External calls must target https endpoints",
    ));
    add(Constraint::new(
        "node-ids-unique",
        ConstraintKind::Structural,
        TargetSelector::Graph,
        Rule::NodeIdsUnique,
        Severity::Error,
        95,
        "Node ids must be unique within a graph",
    ));
    add(Constraint::new(
        "connection-endpoints",
        ConstraintKind::Structural,
        TargetSelector::Connections,
        Rule::ConnectionEndpointsExist,
        Severity::Error,
        80,
        "Connections must reference existing nodes and ports",
    ));
    add(Constraint::new(
        "no-self-loop",
        ConstraintKind::Structural,
        TargetSelector::Connections,
        Rule::NoSelfLoop,
        Severity::Error,
        75,
        "A node cannot feed its own input",
    ));
    add(Constraint::new(
        "connection-type-match",
        ConstraintKind::TypeSafety,
        TargetSelector::Connections,
        Rule::PortTypesCompatible,
        Severity::Error,
        70,
        "Connected ports and the declared data type must be compatible",
    ));
    add(Constraint::new(
        "acyclic",
        ConstraintKind::Structural,
        TargetSelector::Graph,
        Rule::AcyclicGraph,
        Severity::Error,
        60,
        "The dependency graph must not contain cycles",
    ));
    add(Constraint::new(
        "required-inputs-connected",
        ConstraintKind::Structural,
        TargetSelector::Graph,
        Rule::RequiredInputsConnected,
        Severity::Error,
        55,
        "Every declared input port must be fed by a connection",
    ));
    add(Constraint::new(
        "transform-expression",
        ConstraintKind::Precondition,
        TargetSelector::NodeType(NodeType::Transform),
        Rule::FieldPresent {
            path: "properties.expression".to_string(),
        },
        Severity::Error,
        50,
        "Transform nodes must declare an expression",
    ));
    add(Constraint::new(
        "condition-predicate",
        ConstraintKind::Precondition,
        TargetSelector::NodeType(NodeType::Condition),
        Rule::FieldPresent {
            path: "properties.predicate".to_string(),
        },
        Severity::Error,
        50,
        "Condition nodes must declare a predicate",
    ));
    add(Constraint::new(
        "output-destination",
        ConstraintKind::Postcondition,
        TargetSelector::NodeType(NodeType::Output),
        Rule::FieldPresent {
            path: "properties.destination".to_string(),
        },
        Severity::Error,
        50,
        "Output nodes must declare a destination",
    ));
    add(Constraint::new(
        "api-timeout",
        ConstraintKind::Performance,
        TargetSelector::NodeType(NodeType::ApiCall),
        Rule::FieldPresent {
            path: "properties.timeout_ms".to_string(),
        },
        Severity::Warning,
        20,
        "External calls should declare a timeout",
    ));
    add(Constraint::new(
        "component-label",
        ConstraintKind::Precondition,
        TargetSelector::NodeType(NodeType::UiComponent),
        Rule::FieldPresent {
            path: "properties.label".to_string(),
        },
        Severity::Info,
        10,
        "Components should carry a display label",
    ));
}
