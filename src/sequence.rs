//! Interleaving the linear order with edge records for rendering.

use crate::graph::Graph;
use crate::models::Instruction;
use std::collections::HashSet;
use tracing::debug;

/// Walk `order` and emit each node followed by its outgoing edge records.
///
/// Edges follow the node's declared successor order and use the first edge
/// record whose `(source, target)` matches. A successor without an edge
/// record emits nothing. Ids already emitted, or unknown to the graph, are
/// skipped, so every node appears at most once and every edge at most once.
pub fn sequence(graph: &Graph, order: &[String]) -> Vec<Instruction> {
    let mut emitted_nodes: HashSet<&str> = HashSet::with_capacity(order.len());
    let mut emitted_edges: HashSet<&str> = HashSet::new();
    let mut instructions = Vec::with_capacity(order.len() + graph.edges().len());

    for id in order {
        if !graph.contains(id) {
            debug!(%id, "skipping id unknown to the graph");
            continue;
        }
        if !emitted_nodes.insert(id.as_str()) {
            continue;
        }
        instructions.push(Instruction::node(id.as_str()));

        for successor in graph.successors(id) {
            let Some(edge) = graph.edge_between(id, successor) else {
                continue;
            };
            if emitted_edges.insert(edge.id.as_str()) {
                instructions.push(Instruction::edge(edge.id.as_str()));
            }
        }
    }

    debug!(
        nodes = emitted_nodes.len(),
        edges = emitted_edges.len(),
        "sequenced graph"
    );
    instructions
}
