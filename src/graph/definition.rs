use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of node kinds a graph may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    DataSource,
    Transform,
    ApiCall,
    UiComponent,
    Condition,
    Output,
}

impl NodeType {
    /// Stable tag used in selectors, registries and messages.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeType::DataSource => "data-source",
            NodeType::Transform => "transform",
            NodeType::ApiCall => "api-call",
            NodeType::UiComponent => "ui-component",
            NodeType::Condition => "condition",
            NodeType::Output => "output",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Where a node's generated code lives and which runtime adapter applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    Frontend,
    Backend,
    Hybrid,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionContext::Frontend => "frontend",
            ExecutionContext::Backend => "backend",
            ExecutionContext::Hybrid => "hybrid",
        };
        write!(f, "{}", s)
    }
}

/// The closed set of data-type tags a port or connection may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Integer,
    Float,
    Boolean,
    Json,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::Json => "json",
        };
        write!(f, "{}", s)
    }
}

/// A named, typed input or output slot on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub data_type: DataType,
}

impl Port {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A single unit of graph-expressed logic with typed ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub execution_context: ExecutionContext,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl Node {
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Whether generated backend logic for this node must pass through the
    /// security pipeline. Data access and external calls always qualify;
    /// transforms qualify when they declare sensitive fields.
    pub fn is_security_sensitive(&self) -> bool {
        match self.node_type {
            NodeType::DataSource | NodeType::ApiCall => true,
            NodeType::Transform => self
                .property("sensitive_fields")
                .and_then(|v| v.as_array())
                .is_some_and(|fields| !fields.is_empty()),
            _ => false,
        }
    }
}

/// A typed data-flow edge between two node ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub source_port: String,
    pub target: String,
    pub target_port: String,
    pub data_type: DataType,
}

/// An immutable snapshot of a node graph, handed in by the graph-store
/// collaborator. The core never mutates a snapshot; every product
/// (validation result, plan, artifacts, execution result) is a derived value
/// owned by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub id: String,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Connections feeding into the given node, in declaration order.
    pub fn incoming(&self, node_id: &str) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.target == node_id)
    }

    /// Connections leaving the given node, in declaration order.
    pub fn outgoing(&self, node_id: &str) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.source == node_id)
    }

    /// Node ids in stable ascending order. Validation, planning and codegen
    /// all iterate in this order so results are deterministic across calls.
    pub fn sorted_node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}
