//! # Seiyaku - Constraint-Driven Graph Compilation and Execution Engine
//!
//! **Seiyaku** takes a typed node/edge graph annotated with declarative
//! constraints and turns it into running software: it validates the graph,
//! translates satisfied constraints into static type descriptors, layers the
//! dependency graph into a parallel execution plan, generates typed source
//! units per execution context, and orchestrates plan execution across
//! heterogeneous runtimes.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic. It operates on a canonical snapshot model
//! of a graph. The primary workflow is:
//!
//! 1.  **Load Your Data**: Parse your editor or store format into your own Rust structs.
//! 2.  **Convert to Seiyaku's Model**: Implement the `IntoGraph` trait for your structs to provide a translation layer into the canonical `Graph` snapshot.
//! 3.  **Validate**: Run `Validator::validate` against a `ConstraintSet` built once at startup. Violations come back as ordered data, never as exceptions.
//! 4.  **Plan**: `DependencyAnalyzer::plan` partitions the graph into ordered parallel layers, refusing cyclic graphs.
//! 5.  **Generate**: `CodeGenerator::generate` emits typed source units per execution context; security-sensitive backend logic is always wrapped in the fixed security pipeline.
//! 6.  **Execute**: `Executor::execute` runs a plan layer by layer against registered runtime adapters, isolating per-node failures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seiyaku::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! // A two-node pipeline: fetch data, then ship it to a destination.
//! let mut graph = Graph::new("orders");
//! graph.nodes.push(Node {
//!     id: "fetch".to_string(),
//!     node_type: NodeType::DataSource,
//!     execution_context: ExecutionContext::Backend,
//!     properties: serde_json::json!({
//!         "query": "select * from orders where id = $1",
//!         "auth": { "enabled": true },
//!     })
//!     .as_object()
//!     .cloned()
//!     .unwrap_or_default(),
//!     inputs: vec![],
//!     outputs: vec![Port::new("rows", DataType::Json)],
//! });
//! graph.nodes.push(Node {
//!     id: "ship".to_string(),
//!     node_type: NodeType::Output,
//!     execution_context: ExecutionContext::Backend,
//!     properties: serde_json::json!({ "destination": "warehouse" })
//!         .as_object()
//!         .cloned()
//!         .unwrap_or_default(),
//!     inputs: vec![Port::new("rows", DataType::Json)],
//!     outputs: vec![],
//! });
//! graph.connections.push(Connection {
//!     source: "fetch".to_string(),
//!     source_port: "rows".to_string(),
//!     target: "ship".to_string(),
//!     target_port: "rows".to_string(),
//!     data_type: DataType::Json,
//! });
//!
//! // Validate against the standard catalogue.
//! let constraints = ConstraintSet::standard();
//! let validation = Validator::validate(&graph, &constraints);
//! assert!(validation.is_valid, "{}", ReportFormatter::format_validation(&validation));
//!
//! // Compile the dependency graph into parallel layers.
//! let plan = DependencyAnalyzer::new().plan(&graph)?;
//!
//! // Generate typed source units.
//! let generator = CodeGenerator::builder(constraints).build();
//! let artifacts = generator.generate(&graph, &validation)?;
//! for artifact in &artifacts {
//!     println!("{}", artifact.path_hint);
//! }
//!
//! // Execute the plan with runtime adapters registered per node type.
//! struct Echo;
//! #[async_trait::async_trait]
//! impl NodeRuntime for Echo {
//!     async fn run(
//!         &self,
//!         node: &Node,
//!         inputs: NodeInputs,
//!     ) -> std::result::Result<serde_json::Value, NodeRunError> {
//!         Ok(serde_json::json!({ "node": node.id, "inputs": inputs.len() }))
//!     }
//! }
//!
//! let executor = Executor::builder()
//!     .with_runtime(NodeType::DataSource, Arc::new(Echo))
//!     .with_runtime(NodeType::Output, Arc::new(Echo))
//!     .build();
//! let result = executor.execute(&graph, &plan, CancelSignal::none()).await?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod constraint;
pub mod error;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod prelude;
pub mod report;
pub mod types;
