use ahash::{AHashMap, AHashSet};
use tracing::debug;

use super::{ExecutionLayer, ExecutionPlan};
use crate::error::PlanError;
use crate::graph::Graph;

/// Partitions a graph into ordered parallel-execution layers.
///
/// The analyzer builds the dependency adjacency once from the connection
/// list and then extracts frontiers Kahn-style: layer 0 holds every node
/// with no unresolved dependency, layer k every remaining node whose
/// dependencies all sit in layers below k. An iteration that places no node
/// while nodes remain means a cycle, which is an error, not a plan.
pub struct DependencyAnalyzer;

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, graph: &Graph) -> Result<ExecutionPlan, PlanError> {
        // target depends on source
        let mut dependencies: AHashMap<&str, AHashSet<&str>> = AHashMap::new();
        for node in &graph.nodes {
            dependencies.entry(node.id.as_str()).or_default();
        }
        for conn in &graph.connections {
            if !dependencies.contains_key(conn.source.as_str()) {
                return Err(PlanError::UnknownNode {
                    missing_node_id: conn.source.clone(),
                    peer_node_id: conn.target.clone(),
                });
            }
            if !dependencies.contains_key(conn.target.as_str()) {
                return Err(PlanError::UnknownNode {
                    missing_node_id: conn.target.clone(),
                    peer_node_id: conn.source.clone(),
                });
            }
            dependencies
                .entry(conn.target.as_str())
                .or_default()
                .insert(conn.source.as_str());
        }

        let mut placed: AHashSet<&str> = AHashSet::new();
        let mut layers: Vec<ExecutionLayer> = Vec::new();

        while placed.len() < graph.nodes.len() {
            let mut frontier: Vec<&str> = dependencies
                .iter()
                .filter(|(id, deps)| {
                    !placed.contains(*id) && deps.iter().all(|d| placed.contains(d))
                })
                .map(|(id, _)| *id)
                .collect();

            if frontier.is_empty() {
                // No progress with nodes remaining: the rest are on a cycle
                // or depend on one.
                let mut stuck: Vec<String> = dependencies
                    .keys()
                    .filter(|id| !placed.contains(*id))
                    .map(|id| id.to_string())
                    .collect();
                stuck.sort_unstable();
                return Err(PlanError::CycleDetected { nodes: stuck });
            }

            // Stable order keeps plans deterministic across repeated calls.
            frontier.sort_unstable();
            placed.extend(frontier.iter().copied());
            layers.push(ExecutionLayer::new(
                frontier.into_iter().map(String::from).collect(),
            ));
        }

        debug!(graph = %graph.id, layers = layers.len(), "plan computed");
        Ok(ExecutionPlan {
            graph_id: graph.id.clone(),
            layers,
        })
    }
}
