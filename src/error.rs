use crate::graph::ExecutionContext;
use thiserror::Error;

/// Errors that can occur while layering a graph into an execution plan.
#[derive(Error, Debug, Clone)]
pub enum PlanError {
    #[error("Dependency cycle detected involving nodes: {}", nodes.join(", "))]
    CycleDetected { nodes: Vec<String> },

    #[error("Connection references unknown node '{missing_node_id}' (declared by a connection touching '{peer_node_id}')")]
    UnknownNode {
        missing_node_id: String,
        peer_node_id: String,
    },
}

/// Errors that can occur while evaluating a single constraint rule.
///
/// A `RuleError` never aborts validation; the validator downgrades it to an
/// INFO violation so a malformed rule cannot hide other findings.
#[derive(Error, Debug, Clone)]
pub enum RuleError {
    #[error("Rule references property path '{path}' with unknown root segment '{root}'")]
    UnknownPathRoot { path: String, root: String },

    #[error("Rule property path is empty")]
    EmptyPath,

    #[error("Custom rule failed on node '{node_id}': {message}")]
    CustomRuleFailed { node_id: String, message: String },
}

/// Errors that can occur during code generation.
///
/// Generation is all-or-nothing: any of these refuses the whole request and
/// no partial artifacts are returned.
#[derive(Error, Debug, Clone)]
pub enum CodegenError {
    #[error("Refusing to generate code for an invalid graph ({error_count} error-severity violations)")]
    InvalidGraph { error_count: usize },

    #[error("No emitter registered for execution context '{context}' (required by node '{node_id}')")]
    MissingEmitter {
        context: ExecutionContext,
        node_id: String,
    },
}

/// Errors that abort an entire execution run before any node is dispatched.
///
/// Per-node failures are *not* errors at this level; they are collected in
/// the run's [`GraphExecutionResult`](crate::executor::GraphExecutionResult).
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("No runtime adapter registered for node type '{node_type}' (required by node '{node_id}')")]
    MissingRuntime { node_type: String, node_id: String },

    #[error("Plan does not belong to graph '{graph_id}' (plan was built for '{plan_graph_id}')")]
    PlanMismatch {
        graph_id: String,
        plan_graph_id: String,
    },

    #[error("Plan layer {layer} references node '{node_id}' which is not in the graph")]
    UnknownPlanNode { layer: usize, node_id: String },
}

/// Error returned by a node's runtime adapter.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct NodeRunError {
    pub message: String,
}

impl NodeRunError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can occur when converting a custom user format into a [`Graph`](crate::graph::Graph).
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("Invalid graph data: {0}")]
    ValidationError(String),
}

/// Errors that can occur when round-tripping a compiled plan artifact.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Plan serialization failed: {0}")]
    Encode(String),

    #[error("Plan deserialization failed: {0}")]
    Decode(String),
}
