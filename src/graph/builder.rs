//! Graph construction from parsed records.

use crate::models::{EdgeRecord, GraphStats, NodeRecord, Record, RecordIssue, RecordKind, ReferenceField};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Adjacency view over one immutable snapshot of records.
///
/// Connectivity comes only from each node's `successors` list. Edge records
/// are kept for payload lookup by the sequencer and never add adjacency.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<String, NodeRecord>,
    edges: Vec<EdgeRecord>,
    adjacency: BTreeMap<String, Vec<String>>,
    in_degree: BTreeMap<String, usize>,
    /// First edge record per (source, target)
    edge_between: HashMap<(String, String), usize>,
    edge_ids: HashMap<String, usize>,
    issues: Vec<RecordIssue>,
}

impl Graph {
    /// Build a graph from records.
    ///
    /// Never fails: duplicate ids keep their first record, and references to
    /// unknown nodes are dropped. Both are reported through [`Graph::issues`].
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut graph = Graph::default();

        for record in records {
            match record {
                Record::Node(node) => graph.insert_node(node),
                Record::Edge(edge) => graph.insert_edge(edge),
            }
        }

        graph.link_successors();
        graph.index_edges();

        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            adjacency_pairs = graph.adjacency_pairs(),
            issues = graph.issues.len(),
            "built graph"
        );
        graph
    }

    fn insert_node(&mut self, node: NodeRecord) {
        if self.nodes.contains_key(&node.id) {
            warn!(id = %node.id, "duplicate node id ignored");
            self.issues.push(RecordIssue::DuplicateId {
                id: node.id,
                record_kind: RecordKind::Node,
            });
            return;
        }
        self.nodes.insert(node.id.clone(), node);
    }

    fn insert_edge(&mut self, edge: EdgeRecord) {
        if self.edge_ids.contains_key(&edge.id) {
            warn!(id = %edge.id, "duplicate edge id ignored");
            self.issues.push(RecordIssue::DuplicateId {
                id: edge.id,
                record_kind: RecordKind::Edge,
            });
            return;
        }
        self.edge_ids.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge);
    }

    fn link_successors(&mut self) {
        for id in self.nodes.keys() {
            self.in_degree.insert(id.clone(), 0);
        }

        for (id, node) in &self.nodes {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut targets = Vec::with_capacity(node.successors.len());

            for successor in &node.successors {
                if !self.nodes.contains_key(successor) {
                    warn!(node = %id, missing = %successor, "dropping dangling successor");
                    self.issues.push(RecordIssue::DanglingReference {
                        record: id.clone(),
                        field: ReferenceField::Successors,
                        missing: successor.clone(),
                    });
                    continue;
                }
                if !seen.insert(successor.as_str()) {
                    continue;
                }
                if let Some(degree) = self.in_degree.get_mut(successor) {
                    *degree += 1;
                }
                targets.push(successor.clone());
            }

            self.adjacency.insert(id.clone(), targets);
        }
    }

    fn index_edges(&mut self) {
        for (position, edge) in self.edges.iter().enumerate() {
            let mut dangling = false;
            for (field, endpoint) in [
                (ReferenceField::Source, &edge.source),
                (ReferenceField::Target, &edge.target),
            ] {
                if !self.nodes.contains_key(endpoint) {
                    warn!(edge = %edge.id, field = field.as_str(), missing = %endpoint, "edge references unknown node");
                    self.issues.push(RecordIssue::DanglingReference {
                        record: edge.id.clone(),
                        field,
                        missing: endpoint.clone(),
                    });
                    dangling = true;
                }
            }
            if dangling {
                continue;
            }

            self.edge_between
                .entry((edge.source.clone(), edge.target.clone()))
                .or_insert(position);
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node ids in lexicographic order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Edge records in input order, including ones with unknown endpoints
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeRecord> {
        self.edge_ids.get(id).map(|&position| &self.edges[position])
    }

    /// The first edge record connecting `source` to `target`, if both are known
    pub fn edge_between(&self, source: &str, target: &str) -> Option<&EdgeRecord> {
        self.edge_between
            .get(&(source.to_string(), target.to_string()))
            .map(|&position| &self.edges[position])
    }

    /// Known successors of `id` in declaration order; empty for unknown ids
    pub fn successors(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming adjacency references to `id`; zero for unknown ids
    pub fn in_degree(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0)
    }

    pub fn adjacency_pairs(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Problems found while building, in discovery order
    pub fn issues(&self) -> &[RecordIssue] {
        &self.issues
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            adjacency_pairs: self.adjacency_pairs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, successors: &[&str]) -> Record {
        NodeRecord::new(id).with_successors(successors.iter().copied()).into()
    }

    fn edge(id: &str, source: &str, target: &str) -> Record {
        EdgeRecord::new(id, source, target).into()
    }

    #[test]
    fn test_build_empty() {
        let graph = Graph::build(Vec::new());
        assert!(graph.is_empty());
        assert_eq!(graph.adjacency_pairs(), 0);
        assert!(graph.issues().is_empty());
    }

    #[test]
    fn test_build_adjacency_and_in_degree() {
        let graph = Graph::build(vec![
            node("a", &["b", "c"]),
            node("b", &["d"]),
            node("c", &["d"]),
            node("d", &[]),
        ]);

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.successors("a"), ["b", "c"]);
        assert_eq!(graph.in_degree("a"), 0);
        assert_eq!(graph.in_degree("b"), 1);
        assert_eq!(graph.in_degree("d"), 2);
        assert_eq!(graph.adjacency_pairs(), 4);
    }

    #[test]
    fn test_in_degree_matches_adjacency() {
        let graph = Graph::build(vec![
            node("a", &["b", "c", "a"]),
            node("b", &["c", "a"]),
            node("c", &["a"]),
        ]);

        for id in graph.node_ids() {
            let incoming = graph
                .node_ids()
                .filter(|source| graph.successors(source).iter().any(|t| t == id))
                .count();
            assert_eq!(graph.in_degree(id), incoming, "in-degree of {id}");
        }
    }

    #[test]
    fn test_dangling_successor_dropped() {
        let graph = Graph::build(vec![node("x", &["y"])]);

        assert!(graph.successors("x").is_empty());
        assert_eq!(
            graph.issues(),
            [RecordIssue::DanglingReference {
                record: "x".to_string(),
                field: ReferenceField::Successors,
                missing: "y".to_string(),
            }]
        );
    }

    #[test]
    fn test_repeated_successor_counted_once() {
        let graph = Graph::build(vec![node("a", &["b", "b"]), node("b", &[])]);

        assert_eq!(graph.successors("a"), ["b"]);
        assert_eq!(graph.in_degree("b"), 1);
    }

    #[test]
    fn test_edges_do_not_add_connectivity() {
        let graph = Graph::build(vec![
            node("a", &["b"]),
            node("b", &[]),
            edge("e1", "a", "b"),
            edge("e2", "b", "a"),
        ]);

        assert!(graph.successors("b").is_empty());
        assert_eq!(graph.in_degree("a"), 0);
        assert_eq!(graph.edge_between("a", "b").map(|e| e.id.as_str()), Some("e1"));
        assert_eq!(graph.edge_between("b", "a").map(|e| e.id.as_str()), Some("e2"));
    }

    #[test]
    fn test_first_matching_edge_wins() {
        let graph = Graph::build(vec![
            node("a", &["b"]),
            node("b", &[]),
            edge("first", "a", "b"),
            edge("second", "a", "b"),
        ]);

        assert_eq!(graph.edge_between("a", "b").map(|e| e.id.as_str()), Some("first"));
        assert_eq!(graph.edges().len(), 2);
        assert!(graph.edge("second").is_some());
    }

    #[test]
    fn test_dangling_edge_kept_but_not_indexed() {
        let graph = Graph::build(vec![node("a", &[]), edge("e1", "a", "ghost")]);

        assert_eq!(graph.edges().len(), 1);
        assert!(graph.edge_between("a", "ghost").is_none());
        assert_eq!(graph.issues().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let graph = Graph::build(vec![
            NodeRecord::new("a").with_title("first").into(),
            NodeRecord::new("a").with_title("second").into(),
            edge("e", "a", "a"),
            edge("e", "a", "a"),
        ]);

        assert_eq!(graph.node("a").and_then(|n| n.title.as_deref()), Some("first"));
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(
            graph.issues(),
            [
                RecordIssue::DuplicateId {
                    id: "a".to_string(),
                    record_kind: RecordKind::Node,
                },
                RecordIssue::DuplicateId {
                    id: "e".to_string(),
                    record_kind: RecordKind::Edge,
                },
            ]
        );
    }

    #[test]
    fn test_node_ids_are_lexicographic() {
        let graph = Graph::build(vec![node("c", &[]), node("a", &[]), node("b", &[])]);
        let ids: Vec<&str> = graph.node_ids().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
