use ahash::AHashSet;
use itertools::Itertools;

use crate::graph::{DataType, ExecutionContext, Graph, Node};

/// A coalesced generation unit: nodes that share an execution context, an
/// inferred functional domain and enough port-type overlap to live in one
/// emitted file.
#[derive(Debug)]
pub struct CodegenUnit<'a> {
    pub name: String,
    pub domain: &'static str,
    pub context: ExecutionContext,
    pub nodes: Vec<&'a Node>,
}

/// Functional domain inferred purely from the node-type tag's keywords.
/// Anything without a clear keyword falls back to the generic
/// business-logic domain.
pub fn infer_domain(node: &Node) -> &'static str {
    let tag = node.node_type.tag();
    if tag.contains("auth") {
        "auth"
    } else if tag.contains("data") {
        "data"
    } else if tag.contains("api") {
        "integration"
    } else if tag.contains("ui") {
        "ui"
    } else {
        "business-logic"
    }
}

/// Groups a graph's nodes into generation units.
///
/// Nodes merge into an existing unit only when context and domain match and
/// their port-type sets overlap by at least half (Jaccard), which keeps one
/// file per cohesive cluster instead of one file per node.
pub fn coalesce(graph: &Graph) -> Vec<CodegenUnit<'_>> {
    let buckets = graph
        .nodes
        .iter()
        .sorted_by(|a, b| a.id.cmp(&b.id))
        .into_group_map_by(|n| (n.execution_context, infer_domain(n)));

    let mut units: Vec<CodegenUnit<'_>> = Vec::new();
    for ((context, domain), nodes) in buckets
        .into_iter()
        .sorted_by_key(|((ctx, domain), _)| (format!("{}", ctx), *domain))
    {
        let mut open: Vec<(AHashSet<DataType>, Vec<&Node>)> = Vec::new();
        for node in nodes {
            let types = port_types(node);
            match open.iter().position(|(seen, _)| jaccard(seen, &types) >= 0.5) {
                Some(index) => {
                    let (seen, members) = &mut open[index];
                    seen.extend(types);
                    members.push(node);
                }
                None => open.push((types, vec![node])),
            }
        }

        for (index, (_, members)) in open.into_iter().enumerate() {
            let name = if index == 0 {
                domain.replace('-', "_")
            } else {
                format!("{}_{}", domain.replace('-', "_"), index)
            };
            units.push(CodegenUnit {
                name,
                domain,
                context,
                nodes: members,
            });
        }
    }
    units
}

fn port_types(node: &Node) -> AHashSet<DataType> {
    node.inputs
        .iter()
        .chain(node.outputs.iter())
        .map(|p| p.data_type)
        .collect()
}

fn jaccard(a: &AHashSet<DataType>, b: &AHashSet<DataType>) -> f64 {
    if a.is_empty() && b.is_empty() {
        // Two portless nodes overlap trivially.
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}
