use serde::{Deserialize, Serialize};

use super::{ConstraintKind, Severity};

/// A single constraint violation, pointing at the offending graph element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub constraint_id: String,
    /// Node id, or a `source.port -> target.port` label for connections, or
    /// the graph id for graph-scoped findings.
    pub subject: String,
    pub kind: ConstraintKind,
    pub severity: Severity,
    pub priority: i32,
    pub message: String,
}

/// The outcome of validating a graph against a constraint set.
///
/// Violations are ordered by descending severity weight, then descending
/// constraint priority; the graph is valid iff no ERROR-severity violation
/// exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub(crate) fn from_violations(mut violations: Vec<Violation>) -> Self {
        violations.sort_by(|a, b| {
            b.severity
                .weight()
                .cmp(&a.severity.weight())
                .then_with(|| b.priority.cmp(&a.priority))
        });
        let is_valid = !violations.iter().any(|v| v.severity == Severity::Error);
        Self {
            is_valid,
            violations,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}
