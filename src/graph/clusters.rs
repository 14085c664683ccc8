use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::graph::period::PeriodGraph;
use crate::TARGET_GRAPH;

/// Enumerate all maximal cliques of at least `min_size` nodes.
///
/// Used for explicit graphs, where an edge is strong evidence and a cluster
/// should be fully pairwise connected. Bron–Kerbosch with pivoting; node
/// order comes from the graph's ordered adjacency map, so the result order
/// is deterministic.
pub fn maximal_cliques(graph: &PeriodGraph, min_size: usize) -> Vec<BTreeSet<String>> {
    let adjacency: BTreeMap<&str, BTreeSet<&str>> = graph
        .nodes()
        .map(|n| (n, graph.neighbors(n).collect()))
        .collect();

    let mut cliques = Vec::new();
    let mut current = BTreeSet::new();
    let candidates: BTreeSet<&str> = adjacency.keys().copied().collect();
    bron_kerbosch(
        &adjacency,
        &mut current,
        candidates,
        BTreeSet::new(),
        &mut cliques,
    );

    let clusters: Vec<BTreeSet<String>> = cliques
        .into_iter()
        .filter(|c| c.len() >= min_size)
        .map(|c| c.into_iter().map(str::to_string).collect())
        .collect();

    debug!(
        target: TARGET_GRAPH,
        "Extracted {} cliques of size >= {}", clusters.len(), min_size
    );
    clusters
}

fn bron_kerbosch<'a>(
    adjacency: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    current: &mut BTreeSet<&'a str>,
    mut candidates: BTreeSet<&'a str>,
    mut excluded: BTreeSet<&'a str>,
    cliques: &mut Vec<BTreeSet<&'a str>>,
) {
    if candidates.is_empty() && excluded.is_empty() {
        cliques.push(current.clone());
        return;
    }

    // Pivot on the node covering the most candidates, which prunes the
    // branches expanded below.
    let pivot = candidates
        .union(&excluded)
        .max_by_key(|n| adjacency[*n].intersection(&candidates).count())
        .copied();
    let pivot_neighbors = pivot.map(|p| adjacency[p].clone()).unwrap_or_default();

    let branch_nodes: Vec<&str> = candidates.difference(&pivot_neighbors).copied().collect();

    for node in branch_nodes {
        let neighbors = &adjacency[node];
        current.insert(node);
        bron_kerbosch(
            adjacency,
            current,
            candidates.intersection(neighbors).copied().collect(),
            excluded.intersection(neighbors).copied().collect(),
            cliques,
        );
        current.remove(node);
        candidates.remove(node);
        excluded.insert(node);
    }
}

/// Enumerate connected components of at least `min_size` nodes.
///
/// Used for implicit graphs, where a similarity edge is looser evidence and
/// transitive connectivity is enough to group entities.
pub fn connected_components(graph: &PeriodGraph, min_size: usize) -> Vec<BTreeSet<String>> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components = Vec::new();

    for start in graph.nodes() {
        if visited.contains(start) {
            continue;
        }
        let mut component = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            component.insert(node.to_string());
            stack.extend(graph.neighbors(node).filter(|n| !visited.contains(n)));
        }
        if component.len() >= min_size {
            components.push(component);
        }
    }

    debug!(
        target: TARGET_GRAPH,
        "Extracted {} components of size >= {}", components.len(), min_size
    );
    components
}
