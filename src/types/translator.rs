use ahash::AHashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::descriptor::TypeDescriptor;
use crate::constraint::{Constraint, ConstraintKind, Rule};
use crate::graph::{DataType, Node};

/// Maps satisfied TypeSafety constraints onto static type descriptors.
///
/// Translation is deterministic: the same (node, constraint-set) pair always
/// yields the same descriptors, so results are memoized under a content hash
/// of the node's properties, ports and resolved constraint ids.
pub struct TypeTranslator {
    cache: AHashMap<u64, AHashMap<String, TypeDescriptor>>,
}

impl Default for TypeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTranslator {
    pub fn new() -> Self {
        Self {
            cache: AHashMap::new(),
        }
    }

    /// Produces one descriptor per port and declared property of the node.
    ///
    /// Ports start from their declared data-type tag; properties start from
    /// the JSON shape of their value. TypeSafety constraints whose field path
    /// ends in the entry's name then refine the base descriptor:
    /// `FieldOptional` wraps it, `FieldIsArray` lifts it into a list,
    /// `FieldOneOf` closes it over the allowed literals, and `FieldNonNull`
    /// pins it required.
    pub fn translate(
        &mut self,
        node: &Node,
        constraints: &[&Constraint],
    ) -> AHashMap<String, TypeDescriptor> {
        let key = content_hash(node, constraints);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let mut descriptors: AHashMap<String, TypeDescriptor> = AHashMap::new();
        for port in node.inputs.iter().chain(node.outputs.iter()) {
            descriptors.insert(port.name.clone(), TypeDescriptor::Scalar(port.data_type));
        }
        for (name, value) in &node.properties {
            descriptors
                .entry(name.clone())
                .or_insert_with(|| infer_from_value(value));
        }

        // Refine in stable constraint-id order so overlapping rules resolve
        // the same way on every call.
        let mut type_rules: Vec<&Constraint> = constraints
            .iter()
            .copied()
            .filter(|c| c.kind == ConstraintKind::TypeSafety)
            .collect();
        type_rules.sort_by(|a, b| a.id.cmp(&b.id));

        for constraint in type_rules {
            let Some(path) = constraint.rule.field_path() else {
                continue;
            };
            let Some(name) = path.rsplit('.').next() else {
                continue;
            };
            let Some(existing) = descriptors.get(name).cloned() else {
                continue;
            };
            let refined = match &constraint.rule {
                Rule::FieldNonNull { .. } | Rule::FieldPresent { .. } => match existing {
                    TypeDescriptor::Optional(inner) => *inner,
                    other => other,
                },
                Rule::FieldOptional { .. } => {
                    if existing.is_optional() {
                        existing
                    } else {
                        TypeDescriptor::Optional(Box::new(existing))
                    }
                }
                Rule::FieldIsArray { .. } => match existing {
                    list @ TypeDescriptor::List(_) => list,
                    other => TypeDescriptor::List(Box::new(other)),
                },
                Rule::FieldOneOf { allowed, .. } => TypeDescriptor::OneOf(allowed.clone()),
                _ => existing,
            };
            descriptors.insert(name.to_string(), refined);
        }

        self.cache.insert(key, descriptors.clone());
        descriptors
    }
}

/// Base descriptor inferred from a property's JSON value.
fn infer_from_value(value: &serde_json::Value) -> TypeDescriptor {
    match value {
        serde_json::Value::Bool(_) => TypeDescriptor::Scalar(DataType::Boolean),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => {
            TypeDescriptor::Scalar(DataType::Integer)
        }
        serde_json::Value::Number(_) => TypeDescriptor::Scalar(DataType::Float),
        serde_json::Value::String(_) => TypeDescriptor::Scalar(DataType::Text),
        serde_json::Value::Array(items) => {
            let inner = items
                .first()
                .map(infer_from_value)
                .unwrap_or(TypeDescriptor::Scalar(DataType::Json));
            TypeDescriptor::List(Box::new(inner))
        }
        serde_json::Value::Null => {
            TypeDescriptor::Optional(Box::new(TypeDescriptor::Scalar(DataType::Json)))
        }
        serde_json::Value::Object(_) => TypeDescriptor::Scalar(DataType::Json),
    }
}

/// Content hash over everything translation depends on. `serde_json::Map`
/// keeps keys sorted, so serializing the property bag is stable.
fn content_hash(node: &Node, constraints: &[&Constraint]) -> u64 {
    let mut hasher = DefaultHasher::new();
    node.id.hash(&mut hasher);
    if let Ok(props) = serde_json::to_string(&node.properties) {
        props.hash(&mut hasher);
    }
    for port in node.inputs.iter().chain(node.outputs.iter()) {
        port.name.hash(&mut hasher);
        port.data_type.hash(&mut hasher);
    }
    let mut ids: Vec<&str> = constraints.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    for id in ids {
        id.hash(&mut hasher);
    }
    hasher.finish()
}
