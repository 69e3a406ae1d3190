//! Total ordering of a possibly cyclic graph.

use super::Graph;
use super::cycle::{CyclePath, find_cycle};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Result of linearizing a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Linearization {
    pub has_cycle: bool,
    /// First cycle found by the depth-first pass
    pub cycle: Option<CyclePath>,
    /// Every node id exactly once
    pub order: Vec<String>,
    /// Tail of `order` that never reached in-degree zero
    pub unresolved: Vec<String>,
    /// Dequeue operations performed by the Kahn pass
    pub dequeues: usize,
}

/// Produce a complete, deterministic order over all nodes of `graph`.
///
/// The cycle check runs first and only sets the diagnostic flag. Ordering is
/// Kahn's algorithm with a FIFO queue seeded in lexicographic id order, capped
/// at `2 × |nodes|` dequeues. Ids that never reach in-degree zero are appended
/// afterwards by ascending original in-degree, then id. On an acyclic graph
/// the result is a topological order.
pub fn linearize(graph: &Graph) -> Linearization {
    let cycle = find_cycle(graph);
    if let Some(path) = &cycle {
        warn!(cycle = %path.format(), "graph contains a cycle");
    }

    let ceiling = 2 * graph.len();
    let mut remaining: HashMap<&str, usize> = graph
        .node_ids()
        .map(|id| (id, graph.in_degree(id)))
        .collect();
    let mut queue: VecDeque<&str> = graph
        .node_ids()
        .filter(|id| graph.in_degree(id) == 0)
        .collect();
    let mut placed: HashSet<&str> = HashSet::with_capacity(graph.len());
    let mut order: Vec<String> = Vec::with_capacity(graph.len());
    let mut dequeues = 0;

    while dequeues < ceiling {
        let Some(id) = queue.pop_front() else {
            break;
        };
        dequeues += 1;

        if !placed.insert(id) {
            continue;
        }
        order.push(id.to_string());

        for successor in graph.successors(id) {
            let Some(degree) = remaining.get_mut(successor.as_str()) else {
                continue;
            };
            if *degree == 0 {
                continue;
            }
            *degree -= 1;
            if *degree == 0 && !placed.contains(successor.as_str()) {
                queue.push_back(successor.as_str());
            }
        }
    }

    let mut leftover: Vec<&str> = graph.node_ids().filter(|id| !placed.contains(id)).collect();
    leftover.sort_by_key(|id| (graph.in_degree(id), *id));
    let unresolved: Vec<String> = leftover.into_iter().map(str::to_string).collect();
    order.extend(unresolved.iter().cloned());

    debug!(
        nodes = graph.len(),
        dequeues,
        unresolved = unresolved.len(),
        "linearized graph"
    );

    Linearization {
        has_cycle: cycle.is_some(),
        cycle,
        order,
        unresolved,
        dequeues,
    }
}
