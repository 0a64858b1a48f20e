pub mod analyzer;

pub use analyzer::*;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

/// A set of mutually independent nodes whose dependencies all lie in
/// strictly earlier layers. Safe to execute concurrently within one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLayer {
    pub node_ids: Vec<String>,
}

impl ExecutionLayer {
    pub fn new(node_ids: Vec<String>) -> Self {
        Self { node_ids }
    }
}

/// A dependency-respecting schedule covering every node of a graph exactly
/// once. A plan exists iff the dependency graph is acyclic.
///
/// Plans are the contract between the analyzer, the code generator's
/// ordering decisions and the execution orchestrator; they serialize to a
/// compact byte artifact so callers can persist compiled plans (the core
/// itself never touches the filesystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub graph_id: String,
    pub layers: Vec<ExecutionLayer>,
}

impl ExecutionPlan {
    pub fn node_count(&self) -> usize {
        self.layers.iter().map(|l| l.node_ids.len()).sum()
    }

    /// Zero-based layer index of a node, if the plan contains it.
    pub fn layer_of(&self, node_id: &str) -> Option<usize> {
        self.layers
            .iter()
            .position(|l| l.node_ids.iter().any(|id| id == node_id))
    }

    /// Serializes the plan into a compact byte artifact.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    /// Deserializes a plan from a byte artifact.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(plan, _)| plan) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }
}
