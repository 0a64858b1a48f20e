//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! seiyaku crate. Import this module to get access to the core functionality
//! without having to import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use seiyaku::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! // Validate a graph snapshot against the standard constraint catalogue
//! let graph = Graph::new("example");
//! let constraints = ConstraintSet::standard();
//! let validation = Validator::validate(&graph, &constraints);
//!
//! // Layer it into an execution plan
//! let plan = DependencyAnalyzer::new().plan(&graph)?;
//!
//! println!("{}", ReportFormatter::format_validation(&validation));
//! println!("{} layers", plan.layers.len());
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{
    Connection, DataType, ExecutionContext, Graph, IntoGraph, Node, NodeType, Port,
};

// Constraints and validation
pub use crate::constraint::{
    Constraint, ConstraintKind, ConstraintSet, Rule, Severity, TargetSelector, ValidationResult,
    Validator, Violation,
};

// Type translation
pub use crate::types::{TypeDescriptor, TypeTranslator};

// Planning
pub use crate::plan::{DependencyAnalyzer, ExecutionLayer, ExecutionPlan};

// Code generation
pub use crate::codegen::{CodeGenerator, ContextEmitter, GeneratedArtifact, SecurityPipeline};

// Execution
pub use crate::executor::{
    CancelHandle, CancelSignal, ErrorCause, Executor, GraphExecutionResult, NodeExecutionRecord,
    NodeInputs, NodeRuntime, NodeStatus, RunState,
};

// Error types
pub use crate::error::{
    CodegenError, ExecutionError, GraphConversionError, NodeRunError, PlanError,
};

// Report formatting
pub use crate::report::ReportFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
