use ahash::AHashMap;
use async_trait::async_trait;

use crate::error::NodeRunError;
use crate::graph::Node;

/// Resolved upstream outputs for a node, keyed by the input-port name each
/// connection feeds.
pub type NodeInputs = AHashMap<String, serde_json::Value>;

/// The runtime capability the orchestrator depends on but does not
/// implement: given a node and its resolved inputs, produce an output or an
/// error, asynchronously.
///
/// Adapters are registered per node type on the
/// [`Executor`](super::Executor) builder. They may suspend on I/O; the
/// orchestrator awaits them without blocking sibling nodes in the same
/// layer.
#[async_trait]
pub trait NodeRuntime: Send + Sync {
    async fn run(&self, node: &Node, inputs: NodeInputs) -> Result<serde_json::Value, NodeRunError>;
}
