use std::fmt::Write;

use crate::constraint::ValidationResult;
use crate::executor::{GraphExecutionResult, NodeStatus};

/// Formats validation and execution results into human-readable summaries
/// for editor and monitoring collaborators.
pub struct ReportFormatter;

impl ReportFormatter {
    /// One line per violation, already in severity order.
    pub fn format_validation(result: &ValidationResult) -> String {
        let mut out = String::new();
        let verdict = if result.is_valid { "VALID" } else { "INVALID" };
        let _ = writeln!(
            out,
            "{} ({} violations, {} errors)",
            verdict,
            result.violations.len(),
            result.error_count()
        );
        for violation in &result.violations {
            let _ = writeln!(
                out,
                "  [{}] {} @ {}: {}",
                violation.severity, violation.constraint_id, violation.subject, violation.message
            );
        }
        out
    }

    /// One line per node record, in plan order.
    pub fn format_execution(result: &GraphExecutionResult) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {:?} in {:?} ({} nodes)",
            result.run_id,
            result.state,
            result.duration,
            result.records.len()
        );
        for record in &result.records {
            match record.status {
                NodeStatus::Succeeded => {
                    let _ = writeln!(out, "  ok    {} ({:?})", record.node_id, record.duration);
                }
                _ => {
                    let cause = record
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    let _ = writeln!(out, "  error {}: {}", record.node_id, cause);
                }
            }
        }
        out
    }
}
