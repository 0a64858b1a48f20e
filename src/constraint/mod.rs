pub mod rule;
pub mod set;
pub mod validator;
pub mod violation;

pub use rule::*;
pub use set::*;
pub use validator::*;
pub use violation::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::NodeType;

/// What aspect of the graph a constraint guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Precondition,
    Postcondition,
    TypeSafety,
    Security,
    Performance,
    Structural,
}

/// How severe a violation of a constraint is. Only `Error` violations make a
/// graph invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Numeric weight used for ordering violations (higher sorts first).
    pub fn weight(&self) -> u8 {
        match self {
            Severity::Error => 3,
            Severity::Warning => 2,
            Severity::Info => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        write!(f, "{}", s)
    }
}

/// Selects which graph elements a constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// Every node, regardless of type.
    AllNodes,
    /// Only nodes of the given type.
    NodeType(NodeType),
    /// Every connection.
    Connections,
    /// The graph as a whole, evaluated once per validation run.
    Graph,
}

/// A declarative rule gating validity, typing or security of a node,
/// connection or graph.
///
/// Constraints are plain configuration values: build a [`ConstraintSet`]
/// once at startup and pass it by reference into validate/plan/generate.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub id: String,
    pub kind: ConstraintKind,
    pub target: TargetSelector,
    pub rule: Rule,
    pub severity: Severity,
    /// Higher priorities are evaluated first. The security gate carries the
    /// maximum priority in the standard set so it always runs before any
    /// other constraint for a given node.
    pub priority: i32,
    /// Human-readable statement of what the constraint requires, used as the
    /// violation message.
    pub message: String,
}

impl Constraint {
    pub fn new(
        id: impl Into<String>,
        kind: ConstraintKind,
        target: TargetSelector,
        rule: Rule,
        severity: Severity,
        priority: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            target,
            rule,
            severity,
            priority,
            message: message.into(),
        }
    }

    pub fn applies_to_node(&self, node_type: NodeType) -> bool {
        match self.target {
            TargetSelector::AllNodes => true,
            TargetSelector::NodeType(t) => t == node_type,
            _ => false,
        }
    }
}
