//! Common test utilities for building graph snapshots.
use seiyaku::prelude::*;

/// Creates a node of the given type with properties that satisfy the
/// standard constraint catalogue, so tests start from a valid baseline and
/// break one thing at a time.
#[allow(dead_code)]
pub fn valid_node(id: &str, node_type: NodeType, context: ExecutionContext) -> Node {
    let properties = match node_type {
        NodeType::DataSource => serde_json::json!({
            "query": "select total from orders where id = $1",
            "auth": { "enabled": true, "roles": ["service"] },
        }),
        NodeType::ApiCall => serde_json::json!({
            "url": "https://api.example.com/v1/orders",
            "timeout_ms": 2000,
            "auth": { "enabled": true },
        }),
        NodeType::Transform => serde_json::json!({
            "expression": "total * 2",
        }),
        NodeType::Condition => serde_json::json!({
            "predicate": "total > 0",
        }),
        NodeType::Output => serde_json::json!({
            "destination": "warehouse",
        }),
        NodeType::UiComponent => serde_json::json!({
            "label": "Orders",
        }),
    };

    Node {
        id: id.to_string(),
        node_type,
        execution_context: context,
        properties: properties.as_object().cloned().unwrap_or_default(),
        inputs: vec![],
        outputs: vec![],
    }
}

#[allow(dead_code)]
pub fn connect(
    source: &str,
    source_port: &str,
    target: &str,
    target_port: &str,
    data_type: DataType,
) -> Connection {
    Connection {
        source: source.to_string(),
        source_port: source_port.to_string(),
        target: target.to_string(),
        target_port: target_port.to_string(),
        data_type,
    }
}

/// `a (data-source) -> b (transform) -> c (output)`, all backend, integer
/// `value` ports throughout.
#[allow(dead_code)]
pub fn pipeline_graph() -> Graph {
    let mut a = valid_node("a", NodeType::DataSource, ExecutionContext::Backend);
    a.outputs.push(Port::new("value", DataType::Integer));

    let mut b = valid_node("b", NodeType::Transform, ExecutionContext::Backend);
    b.inputs.push(Port::new("value", DataType::Integer));
    b.outputs.push(Port::new("value", DataType::Integer));

    let mut c = valid_node("c", NodeType::Output, ExecutionContext::Backend);
    c.inputs.push(Port::new("value", DataType::Integer));

    let mut graph = Graph::new("pipeline");
    graph.nodes.extend([a, b, c]);
    graph.connections.push(connect("a", "value", "b", "value", DataType::Integer));
    graph.connections.push(connect("b", "value", "c", "value", DataType::Integer));
    graph
}

/// `a` and `b` independent, both feeding `c`: plan must be `[[a, b], [c]]`.
#[allow(dead_code)]
pub fn fan_in_graph() -> Graph {
    let mut a = valid_node("a", NodeType::DataSource, ExecutionContext::Backend);
    a.outputs.push(Port::new("value", DataType::Integer));

    let mut b = valid_node("b", NodeType::DataSource, ExecutionContext::Backend);
    b.outputs.push(Port::new("value", DataType::Integer));

    let mut c = valid_node("c", NodeType::Transform, ExecutionContext::Backend);
    c.inputs.push(Port::new("left", DataType::Integer));
    c.inputs.push(Port::new("right", DataType::Integer));
    c.outputs.push(Port::new("value", DataType::Integer));

    let mut graph = Graph::new("fan-in");
    graph.nodes.extend([a, b, c]);
    graph.connections.push(connect("a", "value", "c", "left", DataType::Integer));
    graph.connections.push(connect("b", "value", "c", "right", DataType::Integer));
    graph
}

/// Three nodes wired in a ring.
#[allow(dead_code)]
pub fn cyclic_graph() -> Graph {
    let mut graph = Graph::new("ring");
    for id in ["x", "y", "z"] {
        let mut node = valid_node(id, NodeType::Transform, ExecutionContext::Backend);
        node.inputs.push(Port::new("in", DataType::Json));
        node.outputs.push(Port::new("out", DataType::Json));
        graph.nodes.push(node);
    }
    graph.connections.push(connect("x", "out", "y", "in", DataType::Json));
    graph.connections.push(connect("y", "out", "z", "in", DataType::Json));
    graph.connections.push(connect("z", "out", "x", "in", DataType::Json));
    graph
}
