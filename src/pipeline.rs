use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::aggregation::{aggregate, Event, MergeStrategy};
use crate::edit::EditRecord;
use crate::graph::{
    build_explicit_graph, build_implicit_graph, connected_components, detect_bursts,
    maximal_cliques, BurstMap, TokenCache,
};
use crate::TARGET_GRAPH;

/// How period graphs are built and clusters are matched across periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMode {
    /// Mutual temporally-co-located references; clique clusters; overlap
    /// coefficient merging.
    Explicit,
    /// Shared activity bursts plus text similarity; component clusters;
    /// shared-entity merging.
    Implicit,
}

/// Tunable parameters of the detection pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: GraphMode,
    /// Max whole days between mutual references (explicit mode).
    pub delta_days: i64,
    /// Percentile of an entity's daily-count distribution at which a day
    /// counts as a burst (implicit mode).
    pub burst_percentile: f64,
    /// Minimum added-text Jaccard on a shared burst day (implicit mode).
    pub similarity_threshold: f64,
    /// Minimum overlap coefficient for merging a cluster into an open event
    /// (explicit mode).
    pub gamma: f64,
    /// Smallest cluster worth tracking.
    pub min_cluster_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: GraphMode::Implicit,
            delta_days: 2,
            burst_percentile: 90.0,
            similarity_threshold: 0.3,
            gamma: 0.8,
            min_cluster_size: 3,
        }
    }
}

impl PipelineConfig {
    /// The merge strategy implied by the configured mode.
    pub fn merge_strategy(&self) -> MergeStrategy {
        match self.mode {
            GraphMode::Explicit => MergeStrategy::Explicit { gamma: self.gamma },
            GraphMode::Implicit => MergeStrategy::Implicit,
        }
    }
}

/// Run the full detection pipeline over a batch of edits.
///
/// Edits are partitioned by calendar day; each day gets one period graph and
/// one cluster set (days yielding no clusters are skipped); the per-period
/// cluster sets are then folded into events in ascending day order. The
/// whole computation is deterministic and performs no I/O.
pub fn run(edits: &[EditRecord], config: &PipelineConfig) -> Vec<Event> {
    let mut edits_by_day: BTreeMap<NaiveDate, Vec<&EditRecord>> = BTreeMap::new();
    for edit in edits {
        edits_by_day.entry(edit.period()).or_default().push(edit);
    }

    let mut periods: BTreeMap<NaiveDate, Vec<BTreeSet<String>>> = BTreeMap::new();

    match config.mode {
        GraphMode::Explicit => {
            for (&day, day_edits) in &edits_by_day {
                let graph = build_explicit_graph(day_edits, config.delta_days);
                if graph.is_empty() {
                    continue;
                }
                let clusters = maximal_cliques(&graph, config.min_cluster_size);
                if !clusters.is_empty() {
                    periods.insert(day, clusters);
                }
            }
        }
        GraphMode::Implicit => {
            // The burst map covers the full history and is read-only below.
            let mut edits_by_entity: BTreeMap<&str, Vec<&EditRecord>> = BTreeMap::new();
            for edit in edits {
                edits_by_entity
                    .entry(edit.entity.as_str())
                    .or_default()
                    .push(edit);
            }
            let burst_map: BurstMap = edits_by_entity
                .iter()
                .map(|(entity, entity_edits)| {
                    (
                        entity.to_string(),
                        detect_bursts(entity_edits, config.burst_percentile),
                    )
                })
                .collect();
            debug!(
                target: TARGET_GRAPH,
                "Burst map covers {} entities",
                burst_map.len()
            );

            let mut cache = TokenCache::new();
            for (&day, day_edits) in &edits_by_day {
                let graph = build_implicit_graph(
                    day_edits,
                    &burst_map,
                    config.similarity_threshold,
                    &mut cache,
                );
                // Token sets are derived from this day's edits only.
                cache.flush();
                if graph.is_empty() {
                    continue;
                }
                let clusters = connected_components(&graph, config.min_cluster_size);
                if !clusters.is_empty() {
                    periods.insert(day, clusters);
                }
            }
        }
    }

    info!(
        target: TARGET_GRAPH,
        "Built cluster sets for {} of {} active days",
        periods.len(),
        edits_by_day.len()
    );

    aggregate(&periods, config.merge_strategy())
}
