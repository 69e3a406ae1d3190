//! Cycle detection over the successor adjacency.

use super::Graph;
use serde::Serialize;
use std::collections::HashMap;

/// A closed path through the graph: the first and last ids are the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CyclePath {
    pub path: Vec<String>,
}

impl CyclePath {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    /// Format the cycle as `a → b → a`.
    pub fn format(&self) -> String {
        self.path.join(" → ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Depth-first search for any cycle.
///
/// Roots are tried in lexicographic order and successors in declaration
/// order, so the reported cycle is deterministic. The walk keeps an explicit
/// frame stack; a successor already on the stack closes a cycle.
pub fn find_cycle(graph: &Graph) -> Option<CyclePath> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());

    for root in graph.node_ids() {
        if marks.contains_key(root) {
            continue;
        }

        // (node, index of the next successor to visit)
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::OnStack);

        while let Some(&(node, cursor)) = stack.last() {
            let Some(next) = graph.successors(node).get(cursor) else {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            };
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }

            match marks.get(next.as_str()) {
                None => {
                    marks.insert(next.as_str(), Mark::OnStack);
                    stack.push((next.as_str(), 0));
                }
                Some(Mark::OnStack) => {
                    let start = stack
                        .iter()
                        .position(|&(id, _)| id == next.as_str())
                        .unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|&(id, _)| id.to_string()).collect();
                    path.push(next.clone());
                    return Some(CyclePath::new(path));
                }
                Some(Mark::Done) => {}
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeRecord, Record};

    fn graph(nodes: &[(&str, &[&str])]) -> Graph {
        Graph::build(nodes.iter().map(|(id, successors)| {
            Record::from(NodeRecord::new(*id).with_successors(successors.iter().copied()))
        }))
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        assert!(find_cycle(&g).is_none());
    }

    #[test]
    fn test_no_cycle_in_diamond() {
        // Shared descendant reached twice is not a cycle
        let g = graph(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])]);
        assert!(find_cycle(&g).is_none());
    }

    #[test]
    fn test_two_cycle() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        let cycle = find_cycle(&g).unwrap();
        assert_eq!(cycle.path, vec!["a", "b", "a"]);
        assert_eq!(cycle.format(), "a → b → a");
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("a", &["a"])]);
        assert_eq!(find_cycle(&g).unwrap().path, vec!["a", "a"]);
    }

    #[test]
    fn test_cycle_below_acyclic_prefix() {
        // root -> x -> y -> z -> x
        let g = graph(&[
            ("root", &["x"]),
            ("x", &["y"]),
            ("y", &["z"]),
            ("z", &["x"]),
        ]);
        let cycle = find_cycle(&g).unwrap();
        assert_eq!(cycle.path, vec!["x", "y", "z", "x"]);
    }

    #[test]
    fn test_cycle_path_format() {
        let path = CyclePath::new(vec!["a".into(), "b".into(), "c".into(), "a".into()]);
        assert_eq!(path.format(), "a → b → c → a");
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("n{i:06}")).collect();
        let records = ids.iter().enumerate().map(|(i, id)| {
            let node = NodeRecord::new(id.clone());
            match ids.get(i + 1) {
                Some(next) => Record::from(node.with_successors([next.clone()])),
                None => Record::from(node),
            }
        });
        let g = Graph::build(records);
        assert!(find_cycle(&g).is_none());
    }
}
