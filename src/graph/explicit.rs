use std::collections::BTreeMap;
use tracing::debug;

use crate::edit::EditRecord;
use crate::graph::period::{PeriodGraph, PeriodGraphBuilder};
use crate::TARGET_GRAPH;

/// Build the explicit reference graph for one period's edits.
///
/// An edge `(A, B)` requires a *mutual*, *temporally co-located* reference:
/// some edit of A referencing B and some edit of B referencing A, made at
/// most `delta_days` whole days apart. A one-directional reference never
/// produces an edge.
///
/// This is a nested join: for every referencing edit, the referenced
/// entity's edit history is scanned for a counter-reference inside the
/// window.
pub fn build_explicit_graph(edits: &[&EditRecord], delta_days: i64) -> PeriodGraph {
    let mut builder = PeriodGraphBuilder::new();

    let mut edits_by_entity: BTreeMap<&str, Vec<&EditRecord>> = BTreeMap::new();
    for &edit in edits {
        edits_by_entity.entry(edit.entity.as_str()).or_default().push(edit);
    }
    for entity_edits in edits_by_entity.values_mut() {
        entity_edits.sort_by_key(|e| e.timestamp);
    }

    for (entity, entity_edits) in &edits_by_entity {
        for edit in entity_edits {
            for referenced in &edit.referenced_entities {
                if referenced == entity {
                    continue;
                }
                // Only entities that were themselves edited can reciprocate.
                let Some(candidate_edits) = edits_by_entity.get(referenced.as_str()) else {
                    continue;
                };
                let reciprocated = candidate_edits.iter().any(|other| {
                    (other.timestamp - edit.timestamp).abs().num_days() <= delta_days
                        && other.referenced_entities.contains(*entity)
                });
                if reciprocated {
                    builder.add_edge(entity, referenced);
                }
            }
        }
    }

    let graph = builder.build();
    debug!(
        target: TARGET_GRAPH,
        "Explicit graph: {} nodes, {} edges from {} edits",
        graph.node_count(),
        graph.edge_count(),
        edits.len()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(entity: &str, timestamp: &str, added: &str) -> EditRecord {
        EditRecord::new(entity, timestamp, vec![added.to_string()], vec![]).unwrap()
    }

    #[test]
    fn test_mutual_reference_within_window() {
        let edits = vec![
            edit("A", "2021-10-01T12:00:00Z", "see [[B]]"),
            edit("B", "2021-10-02T12:00:00Z", "see [[A]]"),
        ];
        let refs: Vec<&EditRecord> = edits.iter().collect();
        let graph = build_explicit_graph(&refs, 2);
        assert!(graph.has_edge("A", "B"));
        assert!(graph.has_edge("B", "A"));
    }

    #[test]
    fn test_zero_window_excludes_day_apart_edits() {
        let edits = vec![
            edit("A", "2021-10-01T12:00:00Z", "see [[B]]"),
            edit("B", "2021-10-02T12:00:00Z", "see [[A]]"),
        ];
        let refs: Vec<&EditRecord> = edits.iter().collect();
        let graph = build_explicit_graph(&refs, 0);
        assert!(!graph.has_edge("A", "B"));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_one_directional_reference_is_not_enough() {
        let edits = vec![
            edit("A", "2021-10-01T12:00:00Z", "see [[B]]"),
            edit("B", "2021-10-01T13:00:00Z", "unrelated text"),
        ];
        let refs: Vec<&EditRecord> = edits.iter().collect();
        let graph = build_explicit_graph(&refs, 2);
        assert!(!graph.has_edge("A", "B"));
    }

    #[test]
    fn test_reference_to_unedited_entity_ignored() {
        let edits = vec![edit("A", "2021-10-01T12:00:00Z", "see [[Ghost]]")];
        let refs: Vec<&EditRecord> = edits.iter().collect();
        let graph = build_explicit_graph(&refs, 2);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_self_reference_ignored() {
        let edits = vec![edit("A", "2021-10-01T12:00:00Z", "see [[A]]")];
        let refs: Vec<&EditRecord> = edits.iter().collect();
        let graph = build_explicit_graph(&refs, 2);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_counter_reference_outside_window() {
        let edits = vec![
            edit("A", "2021-10-01T12:00:00Z", "see [[B]]"),
            edit("B", "2021-10-05T12:00:00Z", "see [[A]]"),
        ];
        let refs: Vec<&EditRecord> = edits.iter().collect();
        let graph = build_explicit_graph(&refs, 2);
        assert!(!graph.has_edge("A", "B"));
    }
}
