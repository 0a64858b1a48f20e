use std::fmt::Write;

use ahash::AHashMap;

use crate::graph::Node;
use crate::types::TypeDescriptor;

/// The fixed stages wrapped around security-sensitive backend logic, in
/// execution order. The pipeline is composed structurally at generation
/// time; there is no emitter code path that produces a sensitive unit
/// without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityStage {
    Authenticate,
    Authorize,
    ValidateInput,
    SanitizeOutput,
    AuditLog,
}

impl SecurityStage {
    /// The runtime helper each stage calls in emitted code. Tests assert on
    /// these markers appearing in order.
    pub fn marker(&self) -> &'static str {
        match self {
            SecurityStage::Authenticate => "requireAuthenticated",
            SecurityStage::Authorize => "requireScopes",
            SecurityStage::ValidateInput => "validateInput",
            SecurityStage::SanitizeOutput => "sanitizeOutput",
            SecurityStage::AuditLog => "auditLog",
        }
    }
}

/// Composes the non-removable security wrapper around a node's logic.
pub struct SecurityPipeline;

impl SecurityPipeline {
    /// Stage order is a constant, not configuration.
    pub const STAGES: [SecurityStage; 5] = [
        SecurityStage::Authenticate,
        SecurityStage::Authorize,
        SecurityStage::ValidateInput,
        SecurityStage::SanitizeOutput,
        SecurityStage::AuditLog,
    ];

    /// Emits the full wrapped handler body: authenticate, authorize,
    /// validate the input against the node's descriptors, run the logic,
    /// sanitize the output, write the audit record.
    pub fn wrap(
        node: &Node,
        logic: &str,
        descriptors: &AHashMap<String, TypeDescriptor>,
    ) -> String {
        let scope = format!("{}:{}", node.node_type.tag(), node.id);
        let schema = input_schema_literal(node, descriptors);

        let mut body = String::new();
        let _ = writeln!(body, "  await requireAuthenticated(ctx);");
        let _ = writeln!(body, "  await requireScopes(ctx, [\"{}\"]);", scope);
        let _ = writeln!(body, "  validateInput(input, {});", schema);
        let _ = writeln!(body, "  const result = await (async () => {{");
        for line in logic.lines() {
            let _ = writeln!(body, "    {}", line);
        }
        let _ = writeln!(body, "  }})();");
        let _ = writeln!(body, "  const sanitized = sanitizeOutput(result);");
        let _ = writeln!(body, "  await auditLog(ctx, \"{}\", sanitized);", node.id);
        let _ = writeln!(body, "  return sanitized;");
        body
    }
}

/// Inline schema literal the validation stage checks the input against,
/// derived from the node's input-port descriptors.
fn input_schema_literal(node: &Node, descriptors: &AHashMap<String, TypeDescriptor>) -> String {
    let mut fields: Vec<String> = node
        .inputs
        .iter()
        .map(|port| {
            let descriptor = descriptors
                .get(&port.name)
                .cloned()
                .unwrap_or(TypeDescriptor::Scalar(port.data_type));
            format!("{}: \"{}\"", port.name, descriptor)
        })
        .collect();
    fields.sort();
    format!("{{ {} }}", fields.join(", "))
}
