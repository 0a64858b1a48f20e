use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::DataType;

/// A static type derived from a port declaration and the TypeSafety
/// constraints satisfied by a node.
///
/// Descriptors are the contract shared between validation, code generation
/// and the hybrid bridge: two connected ports must carry compatible
/// descriptors or validation fails, and both sides of a context boundary are
/// generated from the same descriptor so their shapes cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// A required scalar of the given data type.
    Scalar(DataType),
    /// A value that may be absent.
    Optional(Box<TypeDescriptor>),
    /// An ordered sequence of the inner type.
    List(Box<TypeDescriptor>),
    /// A closed set of string literals.
    OneOf(Vec<String>),
}

impl TypeDescriptor {
    /// Structural compatibility: equality, or an explicitly allowed widening
    /// (`Integer` flows into `Float`). Nothing is ever silently coerced
    /// beyond this table; mismatches surface as TypeSafety violations.
    pub fn compatible(&self, other: &TypeDescriptor) -> bool {
        use TypeDescriptor::*;
        match (self, other) {
            (Scalar(a), Scalar(b)) => a == b || widens(*a, *b),
            (Optional(a), Optional(b)) => a.compatible(b),
            (List(a), List(b)) => a.compatible(b),
            (OneOf(a), OneOf(b)) => a == b,
            // A closed string set still travels as text on the wire.
            (OneOf(_), Scalar(DataType::Text)) => true,
            _ => false,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }
}

fn widens(from: DataType, to: DataType) -> bool {
    matches!((from, to), (DataType::Integer, DataType::Float))
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(dt) => write!(f, "{}", dt),
            TypeDescriptor::Optional(inner) => write!(f, "{}?", inner),
            TypeDescriptor::List(inner) => write!(f, "[{}]", inner),
            TypeDescriptor::OneOf(values) => write!(f, "{{{}}}", values.join(" | ")),
        }
    }
}
