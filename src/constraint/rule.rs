use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::RuleError;
use crate::graph::{Connection, Graph, Node, NodeType};
use crate::types::TypeDescriptor;

/// Signature for user-supplied predicate rules.
pub type CustomCheck = Arc<dyn Fn(&Node, &Graph) -> Result<bool, String> + Send + Sync>;

/// A closed, interpreter-evaluated predicate.
///
/// Rules are tagged variants rather than an expression language: every rule
/// the engine can evaluate is named here, which keeps rule evaluation free of
/// any string-executed code path while `Custom` preserves extensibility.
///
/// Property paths are dotted and must start with the `properties` scope
/// (e.g. `properties.query`). A path with an unknown root is a malformed
/// rule; the validator reports it as an INFO violation instead of failing
/// the run.
#[derive(Clone)]
pub enum Rule {
    /// The field exists (may still be null).
    FieldPresent { path: String },
    /// The field exists and is not null.
    FieldNonNull { path: String },
    /// The field may be absent. Always satisfied; exists to drive optional
    /// type descriptors in the translator.
    FieldOptional { path: String },
    /// The field is a JSON array.
    FieldIsArray { path: String },
    /// The field's string value is one of the allowed literals.
    FieldOneOf { path: String, allowed: Vec<String> },
    /// The field's string value matches the pattern.
    FieldMatches { path: String, pattern: Regex },
    /// The field's string value does NOT match the pattern.
    FieldForbids { path: String, pattern: Regex },
    /// Security-sensitive nodes must declare `properties.auth.enabled == true`.
    /// Nodes outside the sensitive set satisfy this trivially.
    SensitiveNodeHasAuth,
    /// The node has at least one upstream node of the given type.
    UpstreamOfType { node_type: NodeType },
    /// Connection scope: both endpoints name existing nodes and ports.
    ConnectionEndpointsExist,
    /// Connection scope: source is not target.
    NoSelfLoop,
    /// Connection scope: declared data type, source port and target port are
    /// mutually compatible per the type translator's table.
    PortTypesCompatible,
    /// Graph scope: node ids are unique.
    NodeIdsUnique,
    /// Graph scope: the dependency graph has no cycle.
    AcyclicGraph,
    /// Graph scope: every declared input port has at least one incoming
    /// connection.
    RequiredInputsConnected,
    /// User-supplied node predicate.
    Custom { name: String, check: CustomCheck },
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::FieldPresent { path } => write!(f, "FieldPresent({})", path),
            Rule::FieldNonNull { path } => write!(f, "FieldNonNull({})", path),
            Rule::FieldOptional { path } => write!(f, "FieldOptional({})", path),
            Rule::FieldIsArray { path } => write!(f, "FieldIsArray({})", path),
            Rule::FieldOneOf { path, allowed } => write!(f, "FieldOneOf({}, {:?})", path, allowed),
            Rule::FieldMatches { path, pattern } => {
                write!(f, "FieldMatches({}, /{}/)", path, pattern)
            }
            Rule::FieldForbids { path, pattern } => {
                write!(f, "FieldForbids({}, /{}/)", path, pattern)
            }
            Rule::SensitiveNodeHasAuth => write!(f, "SensitiveNodeHasAuth"),
            Rule::UpstreamOfType { node_type } => write!(f, "UpstreamOfType({})", node_type),
            Rule::ConnectionEndpointsExist => write!(f, "ConnectionEndpointsExist"),
            Rule::NoSelfLoop => write!(f, "NoSelfLoop"),
            Rule::PortTypesCompatible => write!(f, "PortTypesCompatible"),
            Rule::NodeIdsUnique => write!(f, "NodeIdsUnique"),
            Rule::AcyclicGraph => write!(f, "AcyclicGraph"),
            Rule::RequiredInputsConnected => write!(f, "RequiredInputsConnected"),
            Rule::Custom { name, .. } => write!(f, "Custom({})", name),
        }
    }
}

impl Rule {
    pub fn custom(
        name: impl Into<String>,
        check: impl Fn(&Node, &Graph) -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        Rule::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// The property path this rule inspects, if it is a field rule. Used by
    /// the type translator to match constraints to ports and properties.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Rule::FieldPresent { path }
            | Rule::FieldNonNull { path }
            | Rule::FieldOptional { path }
            | Rule::FieldIsArray { path }
            | Rule::FieldOneOf { path, .. }
            | Rule::FieldMatches { path, .. }
            | Rule::FieldForbids { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Evaluates a node-scoped rule. `Ok(true)` means satisfied.
    pub fn eval_node(&self, node: &Node, graph: &Graph) -> Result<bool, RuleError> {
        match self {
            Rule::FieldPresent { path } => Ok(resolve_path(node, path)?.is_some()),
            Rule::FieldNonNull { path } => {
                Ok(matches!(resolve_path(node, path)?, Some(v) if !v.is_null()))
            }
            Rule::FieldOptional { path } => {
                // Typing hint only, but still validate the path shape so a
                // typo is surfaced like any other malformed rule.
                resolve_path(node, path)?;
                Ok(true)
            }
            Rule::FieldIsArray { path } => {
                Ok(matches!(resolve_path(node, path)?, Some(v) if v.is_array()))
            }
            Rule::FieldOneOf { path, allowed } => Ok(match resolve_path(node, path)? {
                Some(v) => v.as_str().is_some_and(|s| allowed.iter().any(|a| a == s)),
                None => false,
            }),
            Rule::FieldMatches { path, pattern } => Ok(match resolve_path(node, path)? {
                Some(v) => v.as_str().is_some_and(|s| pattern.is_match(s)),
                None => false,
            }),
            Rule::FieldForbids { path, pattern } => Ok(match resolve_path(node, path)? {
                Some(v) => !v.as_str().is_some_and(|s| pattern.is_match(s)),
                None => true,
            }),
            Rule::SensitiveNodeHasAuth => {
                if !node.is_security_sensitive() {
                    return Ok(true);
                }
                let enabled = node
                    .property("auth")
                    .and_then(|auth| auth.get("enabled"))
                    .and_then(|v| v.as_bool());
                Ok(enabled == Some(true))
            }
            Rule::UpstreamOfType { node_type } => Ok(graph
                .incoming(&node.id)
                .filter_map(|c| graph.node(&c.source))
                .any(|n| n.node_type == *node_type)),
            Rule::Custom { check, .. } => {
                check(node, graph).map_err(|message| RuleError::CustomRuleFailed {
                    node_id: node.id.clone(),
                    message,
                })
            }
            // Connection- and graph-scoped rules are vacuously true against a
            // single node; target selectors keep them out of node passes.
            _ => Ok(true),
        }
    }

    /// Evaluates a connection-scoped rule.
    pub fn eval_connection(&self, conn: &Connection, graph: &Graph) -> Result<bool, RuleError> {
        match self {
            Rule::ConnectionEndpointsExist => {
                let source_ok = graph
                    .node(&conn.source)
                    .is_some_and(|n| n.outputs.iter().any(|p| p.name == conn.source_port));
                let target_ok = graph
                    .node(&conn.target)
                    .is_some_and(|n| n.inputs.iter().any(|p| p.name == conn.target_port));
                Ok(source_ok && target_ok)
            }
            Rule::NoSelfLoop => Ok(conn.source != conn.target),
            Rule::PortTypesCompatible => {
                // Unresolvable endpoints are flagged by ConnectionEndpointsExist;
                // this rule stays vacuous for them to avoid double-reporting.
                let Some(source_port) = graph
                    .node(&conn.source)
                    .and_then(|n| n.outputs.iter().find(|p| p.name == conn.source_port))
                else {
                    return Ok(true);
                };
                let Some(target_port) = graph
                    .node(&conn.target)
                    .and_then(|n| n.inputs.iter().find(|p| p.name == conn.target_port))
                else {
                    return Ok(true);
                };
                let declared = TypeDescriptor::Scalar(conn.data_type);
                let emitted = TypeDescriptor::Scalar(source_port.data_type);
                let expected = TypeDescriptor::Scalar(target_port.data_type);
                Ok(emitted.compatible(&declared) && declared.compatible(&expected))
            }
            _ => Ok(true),
        }
    }

    /// Evaluates a graph-scoped rule.
    pub fn eval_graph(&self, graph: &Graph) -> Result<bool, RuleError> {
        match self {
            Rule::NodeIdsUnique => {
                let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
                ids.sort_unstable();
                Ok(ids.windows(2).all(|w| w[0] != w[1]))
            }
            Rule::AcyclicGraph => {
                Ok(crate::plan::DependencyAnalyzer::new().plan(graph).is_ok())
            }
            Rule::RequiredInputsConnected => {
                for node in &graph.nodes {
                    for port in &node.inputs {
                        let fed = graph
                            .incoming(&node.id)
                            .any(|c| c.target_port == port.name);
                        if !fed {
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }
}

/// Resolves a dotted property path against a node.
///
/// `Ok(None)` means the path is well-formed but the field is absent; that is
/// a predicate outcome, not a malformed rule.
fn resolve_path<'a>(node: &'a Node, path: &str) -> Result<Option<&'a serde_json::Value>, RuleError> {
    let mut segments = path.split('.');
    let root = segments.next().filter(|s| !s.is_empty()).ok_or(RuleError::EmptyPath)?;
    if root != "properties" {
        return Err(RuleError::UnknownPathRoot {
            path: path.to_string(),
            root: root.to_string(),
        });
    }

    let mut current: Option<&serde_json::Value> = None;
    for (i, segment) in segments.enumerate() {
        current = match i {
            0 => node.property(segment),
            _ => current.and_then(|v| v.get(segment)),
        };
        if current.is_none() {
            return Ok(None);
        }
    }
    Ok(current)
}
