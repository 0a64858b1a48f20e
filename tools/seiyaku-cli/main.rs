use clap::Parser;
use seiyaku::prelude::*;
use serde::Deserialize;
use std::fs;
use std::time::Instant;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the editor's export format and are only used here for
// conversion into the canonical graph model.

#[derive(Deserialize)]
struct RawGraph {
    id: String,
    nodes: Vec<RawNode>,
    #[serde(default)]
    connections: Vec<RawConnection>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(alias = "nodeType")]
    node_type: String,
    #[serde(alias = "executionContext")]
    execution_context: String,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    inputs: Vec<RawPort>,
    #[serde(default)]
    outputs: Vec<RawPort>,
}

#[derive(Deserialize)]
struct RawPort {
    name: String,
    #[serde(alias = "dataType")]
    data_type: String,
}

#[derive(Deserialize)]
struct RawConnection {
    source: String,
    #[serde(alias = "sourcePort")]
    source_port: String,
    target: String,
    #[serde(alias = "targetPort")]
    target_port: String,
    #[serde(alias = "dataType")]
    data_type: String,
}

// --- Converter Implementation ---
// Implements the conversion from the raw JSON model to the canonical Graph.

fn parse_node_type(tag: &str) -> Result<NodeType, GraphConversionError> {
    match tag {
        "data-source" => Ok(NodeType::DataSource),
        "transform" => Ok(NodeType::Transform),
        "api-call" => Ok(NodeType::ApiCall),
        "ui-component" => Ok(NodeType::UiComponent),
        "condition" => Ok(NodeType::Condition),
        "output" => Ok(NodeType::Output),
        other => Err(GraphConversionError::ValidationError(format!(
            "unknown node type '{}'",
            other
        ))),
    }
}

fn parse_context(tag: &str) -> Result<ExecutionContext, GraphConversionError> {
    match tag {
        "frontend" => Ok(ExecutionContext::Frontend),
        "backend" => Ok(ExecutionContext::Backend),
        "hybrid" => Ok(ExecutionContext::Hybrid),
        other => Err(GraphConversionError::ValidationError(format!(
            "unknown execution context '{}'",
            other
        ))),
    }
}

fn parse_data_type(tag: &str) -> Result<DataType, GraphConversionError> {
    match tag {
        "text" | "string" => Ok(DataType::Text),
        "integer" => Ok(DataType::Integer),
        "float" | "number" => Ok(DataType::Float),
        "boolean" => Ok(DataType::Boolean),
        "json" | "object" => Ok(DataType::Json),
        other => Err(GraphConversionError::ValidationError(format!(
            "unknown data type '{}'",
            other
        ))),
    }
}

fn parse_port(raw: RawPort) -> Result<Port, GraphConversionError> {
    Ok(Port::new(raw.name, parse_data_type(&raw.data_type)?))
}

impl IntoGraph for RawGraph {
    fn into_graph(self) -> Result<Graph, GraphConversionError> {
        let mut graph = Graph::new(self.id);
        for raw in self.nodes {
            graph.nodes.push(Node {
                id: raw.id,
                node_type: parse_node_type(&raw.node_type)?,
                execution_context: parse_context(&raw.execution_context)?,
                properties: raw.properties,
                inputs: raw.inputs.into_iter().map(parse_port).collect::<Result<_, _>>()?,
                outputs: raw.outputs.into_iter().map(parse_port).collect::<Result<_, _>>()?,
            });
        }
        for raw in self.connections {
            graph.connections.push(Connection {
                source: raw.source,
                source_port: raw.source_port,
                target: raw.target,
                target_port: raw.target_port,
                data_type: parse_data_type(&raw.data_type)?,
            });
        }
        Ok(graph)
    }
}

/// A constraint-driven graph compiler CLI: validate a graph snapshot, layer
/// it into an execution plan and optionally print the generated source units.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the graph snapshot JSON file
    graph_path: String,
    /// Print generated artifacts to stdout after validation
    #[arg(long)]
    emit: bool,
    /// Print the compiled plan as bytes length instead of layer listing
    #[arg(long)]
    plan_bytes: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let raw_json = fs::read_to_string(&cli.graph_path)?;
    let raw: RawGraph = serde_json::from_str(&raw_json)?;
    let graph = raw.into_graph()?;

    let constraints = ConstraintSet::standard();

    let start = Instant::now();
    let validation = Validator::validate(&graph, &constraints);
    println!("Validation took {:?}", start.elapsed());
    print!("{}", ReportFormatter::format_validation(&validation));

    if !validation.is_valid {
        std::process::exit(1);
    }

    let start = Instant::now();
    let plan = DependencyAnalyzer::new().plan(&graph)?;
    println!("Planning took {:?}", start.elapsed());

    if cli.plan_bytes {
        let bytes = plan.to_bytes()?;
        println!("Compiled plan artifact: {} bytes", bytes.len());
    } else {
        for (index, layer) in plan.layers.iter().enumerate() {
            println!("  layer {}: {}", index, layer.node_ids.join(", "));
        }
    }

    if cli.emit {
        let start = Instant::now();
        let generator = CodeGenerator::builder(constraints).build();
        let artifacts = generator.generate(&graph, &validation)?;
        println!("Generation took {:?}", start.elapsed());
        for artifact in artifacts {
            println!("\n=== {} ===", artifact.path_hint);
            print!("{}", artifact.content);
        }
    }

    Ok(())
}
