use std::collections::{BTreeMap, BTreeSet};

/// Undirected graph over entity identifiers for one analysis period.
///
/// Built once through [`PeriodGraphBuilder`] and immutable afterwards, so a
/// finished graph can be shared freely across threads. Backed by ordered
/// adjacency sets, which makes node and neighbor iteration deterministic.
///
/// Invariants: edges are symmetric, there are no self-loops, and every edge
/// endpoint is a node.
#[derive(Debug, Clone)]
pub struct PeriodGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl PeriodGraph {
    /// Iterate over all nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Neighbors of `entity`, empty if the node is absent or isolated.
    pub fn neighbors(&self, entity: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(entity)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(b))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

/// Accumulates nodes and edges, then freezes into a [`PeriodGraph`].
#[derive(Debug, Default)]
pub struct PeriodGraphBuilder {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl PeriodGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without any edges. Idempotent.
    pub fn add_node(&mut self, entity: &str) {
        self.adjacency.entry(entity.to_string()).or_default();
    }

    /// Add an undirected edge, inserting both endpoints as nodes.
    ///
    /// Self-loops are ignored: an entity referencing itself carries no
    /// cross-entity signal.
    pub fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    pub fn build(self) -> PeriodGraph {
        PeriodGraph {
            adjacency: self.adjacency,
        }
    }
}
