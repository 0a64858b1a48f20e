use std::fmt::Write;

use ahash::AHashMap;

use super::grouping::CodegenUnit;
use super::security::SecurityPipeline;
use super::{GeneratedArtifact, UnitDescriptors};
use crate::error::CodegenError;
use crate::graph::{DataType, ExecutionContext, Node};
use crate::types::TypeDescriptor;

/// Emits source text for one execution context.
///
/// Emitters are registered on the [`CodeGenerator`](super::CodeGenerator)
/// keyed by context; a unit whose context has no emitter refuses the whole
/// generation request.
pub trait ContextEmitter: Send + Sync {
    fn context(&self) -> ExecutionContext;
    fn emit(
        &self,
        unit: &CodegenUnit<'_>,
        descriptors: &UnitDescriptors,
    ) -> Result<Vec<GeneratedArtifact>, CodegenError>;
}

/// Emits presentation-layer units: one typed component per node.
pub struct FrontendEmitter;

impl ContextEmitter for FrontendEmitter {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Frontend
    }

    fn emit(
        &self,
        unit: &CodegenUnit<'_>,
        descriptors: &UnitDescriptors,
    ) -> Result<Vec<GeneratedArtifact>, CodegenError> {
        Ok(vec![frontend_artifact(unit, descriptors, "frontend")])
    }
}

/// Emits business-logic units. Security-sensitive nodes are emitted through
/// the [`SecurityPipeline`]; the branch below is the only path for them.
pub struct BackendEmitter;

impl ContextEmitter for BackendEmitter {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Backend
    }

    fn emit(
        &self,
        unit: &CodegenUnit<'_>,
        descriptors: &UnitDescriptors,
    ) -> Result<Vec<GeneratedArtifact>, CodegenError> {
        Ok(vec![backend_artifact(unit, descriptors, "backend")])
    }
}

/// Emits both halves of a context-straddling unit plus the bridge that
/// marshals data across the boundary. Both sides and the bridge are derived
/// from the same descriptors, so their shapes cannot drift apart.
pub struct HybridEmitter;

impl ContextEmitter for HybridEmitter {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Hybrid
    }

    fn emit(
        &self,
        unit: &CodegenUnit<'_>,
        descriptors: &UnitDescriptors,
    ) -> Result<Vec<GeneratedArtifact>, CodegenError> {
        let backend = backend_artifact(unit, descriptors, "hybrid/backend");
        let bridge = bridge_artifact(unit, descriptors, &backend.path_hint);
        let frontend = frontend_artifact(unit, descriptors, "hybrid/frontend");
        Ok(vec![frontend, backend, bridge])
    }
}

fn frontend_artifact(
    unit: &CodegenUnit<'_>,
    descriptors: &UnitDescriptors,
    prefix: &str,
) -> GeneratedArtifact {
    let mut content = String::new();
    let _ = writeln!(content, "// Generated unit '{}', do not edit.", unit.name);
    let _ = writeln!(content, "import {{ renderComponent }} from \"runtime/frontend\";");

    for node in &unit.nodes {
        let component = pascal_case(&node.id);
        let _ = writeln!(content);
        let _ = writeln!(content, "export interface {}Props {{", component);
        for (name, descriptor) in input_port_descriptors(node, descriptors) {
            let _ = writeln!(content, "  {}{}: {};", name, optional_marker(&descriptor), ts_type(&descriptor));
        }
        let _ = writeln!(content, "}}");
        let _ = writeln!(content);
        let _ = writeln!(
            content,
            "export function {}(props: {}Props) {{",
            component, component
        );
        let _ = writeln!(
            content,
            "  return renderComponent(\"{}\", props);",
            node.id
        );
        let _ = writeln!(content, "}}");
    }

    GeneratedArtifact {
        path_hint: format!("{}/{}/{}.tsx", prefix, unit.domain, unit.name),
        content,
        dependencies: vec!["runtime/frontend".to_string()],
    }
}

fn backend_artifact(
    unit: &CodegenUnit<'_>,
    descriptors: &UnitDescriptors,
    prefix: &str,
) -> GeneratedArtifact {
    let sensitive = unit.nodes.iter().any(|n| n.is_security_sensitive());

    let mut content = String::new();
    let _ = writeln!(content, "// Generated unit '{}', do not edit.", unit.name);
    let _ = writeln!(
        content,
        "import {{ RequestContext, evaluateNode }} from \"runtime/backend\";"
    );
    if sensitive {
        let _ = writeln!(
            content,
            "import {{ requireAuthenticated, requireScopes, validateInput, sanitizeOutput, auditLog }} from \"runtime/security\";"
        );
    }

    for node in &unit.nodes {
        let handler = pascal_case(&node.id);
        let empty = AHashMap::new();
        let node_descriptors = descriptors.get(&node.id).unwrap_or(&empty);

        let _ = writeln!(content);
        let _ = writeln!(content, "export interface {}Input {{", handler);
        for (name, descriptor) in input_port_descriptors(node, descriptors) {
            let _ = writeln!(content, "  {}{}: {};", name, optional_marker(&descriptor), ts_type(&descriptor));
        }
        let _ = writeln!(content, "}}");
        let _ = writeln!(content);
        let _ = writeln!(
            content,
            "export async function run{}(ctx: RequestContext, input: {}Input): Promise<unknown> {{",
            handler, handler
        );
        let logic = format!("return evaluateNode(\"{}\", input);", node.id);
        if node.is_security_sensitive() {
            content.push_str(&SecurityPipeline::wrap(node, &logic, node_descriptors));
        } else {
            let _ = writeln!(content, "  {}", logic);
        }
        let _ = writeln!(content, "}}");
    }

    let mut dependencies = vec!["runtime/backend".to_string()];
    if sensitive {
        dependencies.push("runtime/security".to_string());
    }

    GeneratedArtifact {
        path_hint: format!("{}/{}/{}.ts", prefix, unit.domain, unit.name),
        content,
        dependencies,
    }
}

fn bridge_artifact(
    unit: &CodegenUnit<'_>,
    descriptors: &UnitDescriptors,
    backend_path: &str,
) -> GeneratedArtifact {
    let mut content = String::new();
    let _ = writeln!(content, "// Generated bridge for unit '{}', do not edit.", unit.name);
    let _ = writeln!(
        content,
        "import {{ invokeBackend, marshal, unmarshal }} from \"runtime/bridge\";"
    );

    for node in &unit.nodes {
        let handler = pascal_case(&node.id);
        let shape = shape_literal(node, descriptors);
        let _ = writeln!(content);
        let _ = writeln!(
            content,
            "export async function call{}(input: unknown): Promise<unknown> {{",
            handler
        );
        let _ = writeln!(content, "  const payload = marshal(input, {});", shape);
        let _ = writeln!(
            content,
            "  const response = await invokeBackend(\"{}\", payload);",
            node.id
        );
        let _ = writeln!(content, "  return unmarshal(response, {});", shape);
        let _ = writeln!(content, "}}");
    }

    GeneratedArtifact {
        path_hint: format!("hybrid/bridge/{}.ts", unit.name),
        content,
        dependencies: vec!["runtime/bridge".to_string(), backend_path.to_string()],
    }
}

/// Input-port descriptors for a node, in declaration order.
fn input_port_descriptors(
    node: &Node,
    descriptors: &UnitDescriptors,
) -> Vec<(String, TypeDescriptor)> {
    node.inputs
        .iter()
        .map(|port| {
            let descriptor = descriptors
                .get(&node.id)
                .and_then(|d| d.get(&port.name))
                .cloned()
                .unwrap_or(TypeDescriptor::Scalar(port.data_type));
            (port.name.clone(), descriptor)
        })
        .collect()
}

/// Wire-shape literal shared by both marshalling directions of a bridge.
fn shape_literal(node: &Node, descriptors: &UnitDescriptors) -> String {
    let mut fields: Vec<String> = input_port_descriptors(node, descriptors)
        .into_iter()
        .map(|(name, descriptor)| format!("{}: \"{}\"", name, descriptor))
        .collect();
    fields.sort();
    format!("{{ {} }}", fields.join(", "))
}

fn optional_marker(descriptor: &TypeDescriptor) -> &'static str {
    if descriptor.is_optional() { "?" } else { "" }
}

/// TypeScript rendering of a descriptor.
fn ts_type(descriptor: &TypeDescriptor) -> String {
    match descriptor {
        TypeDescriptor::Scalar(DataType::Text) => "string".to_string(),
        TypeDescriptor::Scalar(DataType::Integer) | TypeDescriptor::Scalar(DataType::Float) => {
            "number".to_string()
        }
        TypeDescriptor::Scalar(DataType::Boolean) => "boolean".to_string(),
        TypeDescriptor::Scalar(DataType::Json) => "unknown".to_string(),
        TypeDescriptor::Optional(inner) => format!("{} | null", ts_type(inner)),
        TypeDescriptor::List(inner) => format!("{}[]", ts_type(inner)),
        TypeDescriptor::OneOf(values) => values
            .iter()
            .map(|v| format!("\"{}\"", v))
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

/// `fetch_orders` → `FetchOrders`; non-alphanumerics split words.
fn pascal_case(id: &str) -> String {
    id.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
