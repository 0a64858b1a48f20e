use super::definition::Graph;
use crate::error::GraphConversionError;

/// A trait for custom data models that can be converted into a [`Graph`].
///
/// This is the primary extension point for making seiyaku format-agnostic.
/// Editors and graph stores keep their own wire formats; implementing this
/// trait on the parsed form provides the translation layer into the
/// canonical snapshot model the compiler operates on.
///
/// # Example
///
/// ```rust,no_run
/// use seiyaku::prelude::*;
/// use seiyaku::error::GraphConversionError;
/// // The prelude's 1-arg `Result<T>` alias shadows std's 2-arg `Result` under
/// // the glob import; restore std's Result for the trait signature below.
/// use std::result::Result;
///
/// // 1. Define your custom structs for parsing your format.
/// struct MyCanvasNode { id: String, kind: String }
/// struct MyCanvas { nodes: Vec<MyCanvasNode> }
///
/// // 2. Implement `IntoGraph` for your top-level struct.
/// impl IntoGraph for MyCanvas {
///     fn into_graph(self) -> Result<Graph, GraphConversionError> {
///         let mut graph = Graph::new("my-canvas");
///         for node in self.nodes {
///             let node_type = match node.kind.as_str() {
///                 "query" => NodeType::DataSource,
///                 "http" => NodeType::ApiCall,
///                 other => {
///                     return Err(GraphConversionError::ValidationError(format!(
///                         "unknown node kind '{}'",
///                         other
///                     )));
///                 }
///             };
///             graph.nodes.push(Node {
///                 id: node.id,
///                 node_type,
///                 execution_context: ExecutionContext::Backend,
///                 properties: Default::default(),
///                 inputs: vec![],
///                 outputs: vec![],
///             });
///         }
///         Ok(graph)
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into a canonical graph snapshot.
    fn into_graph(self) -> Result<Graph, GraphConversionError>;
}
