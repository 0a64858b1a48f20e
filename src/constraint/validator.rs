use tracing::debug;

use super::set::ConstraintSet;
use super::violation::{ValidationResult, Violation};
use super::{Constraint, ConstraintKind, Severity};
use crate::graph::{Connection, Graph};

/// Evaluates a constraint set against a graph snapshot.
///
/// Validation is a pure function of the snapshot: it never mutates the graph
/// and always terminates with a result, downgrading malformed rules to INFO
/// findings instead of failing the run.
pub struct Validator;

impl Validator {
    /// Runs the node, connection and graph passes and collects every
    /// violation into an ordered [`ValidationResult`].
    pub fn validate(graph: &Graph, constraints: &ConstraintSet) -> ValidationResult {
        let mut violations = Vec::new();

        // Node pass, in stable id order. Constraints arrive sorted by
        // descending priority, so the security gate runs first; a Security
        // ERROR short-circuits the remaining constraints for that node only.
        let mut nodes: Vec<&crate::graph::Node> = graph.nodes.iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        for node in nodes {
            let selected = constraints.for_node_type(node.node_type);
            for constraint in selected {
                match constraint.rule.eval_node(node, graph) {
                    Ok(true) => {}
                    Ok(false) => {
                        violations.push(violation_for(constraint, node.id.clone()));
                        if constraint.kind == ConstraintKind::Security
                            && constraint.severity == Severity::Error
                        {
                            debug!(
                                node = %node.id,
                                constraint = %constraint.id,
                                "security gate failed, skipping remaining node constraints"
                            );
                            break;
                        }
                    }
                    Err(err) => violations.push(rule_failure(constraint, node.id.clone(), err)),
                }
            }
        }

        // Connection pass, in declaration order.
        let connection_constraints = constraints.for_connections();
        for conn in &graph.connections {
            for constraint in &connection_constraints {
                match constraint.rule.eval_connection(conn, graph) {
                    Ok(true) => {}
                    Ok(false) => violations.push(violation_for(constraint, connection_label(conn))),
                    Err(err) => {
                        violations.push(rule_failure(constraint, connection_label(conn), err))
                    }
                }
            }
        }

        // Graph pass, once per run.
        for constraint in constraints.for_graph() {
            match constraint.rule.eval_graph(graph) {
                Ok(true) => {}
                Ok(false) => violations.push(violation_for(constraint, graph.id.clone())),
                Err(err) => violations.push(rule_failure(constraint, graph.id.clone(), err)),
            }
        }

        let result = ValidationResult::from_violations(violations);
        debug!(
            graph = %graph.id,
            valid = result.is_valid,
            violations = result.violations.len(),
            "validation finished"
        );
        result
    }
}

fn violation_for(constraint: &Constraint, subject: String) -> Violation {
    Violation {
        constraint_id: constraint.id.clone(),
        subject,
        kind: constraint.kind,
        severity: constraint.severity,
        priority: constraint.priority,
        message: constraint.message.clone(),
    }
}

fn rule_failure(constraint: &Constraint, subject: String, err: crate::error::RuleError) -> Violation {
    Violation {
        constraint_id: constraint.id.clone(),
        subject,
        kind: constraint.kind,
        severity: Severity::Info,
        priority: constraint.priority,
        message: format!("rule evaluation failed: {}", err),
    }
}

pub(crate) fn connection_label(conn: &Connection) -> String {
    format!(
        "{}.{} -> {}.{}",
        conn.source, conn.source_port, conn.target, conn.target_port
    )
}
