use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::edit::EditRecord;
use crate::graph::period::{PeriodGraph, PeriodGraphBuilder};
use crate::similarity::{jaccard, tokenize};
use crate::TARGET_GRAPH;

/// Burst days per entity, computed once over the full edit history and
/// read-only while period graphs are built.
pub type BurstMap = HashMap<String, BTreeSet<NaiveDate>>;

/// Detect the burst days of one entity's edit history.
///
/// A day bursts when its edit count reaches the given percentile of the
/// entity's own daily-count distribution. The percentile is nearest-rank
/// over the ascending counts (zero-based index `ceil(p/100 * n)`, clamped),
/// so a lone spike over a uniform baseline is the only burst day at p=90.
///
/// An entity with no edits has no burst days.
pub fn detect_bursts(edits: &[&EditRecord], threshold_percentile: f64) -> BTreeSet<NaiveDate> {
    let mut daily_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for edit in edits {
        *daily_counts.entry(edit.period()).or_insert(0) += 1;
    }

    if daily_counts.is_empty() {
        return BTreeSet::new();
    }

    let mut counts: Vec<usize> = daily_counts.values().copied().collect();
    counts.sort_unstable();
    let threshold = percentile_nearest_rank(&counts, threshold_percentile);

    daily_counts
        .into_iter()
        .filter(|&(_, count)| count >= threshold)
        .map(|(day, _)| day)
        .collect()
}

/// Nearest-rank percentile over ascending `counts` (must be non-empty).
fn percentile_nearest_rank(counts: &[usize], percentile: f64) -> usize {
    let rank = ((percentile / 100.0) * counts.len() as f64).ceil() as usize;
    counts[rank.min(counts.len() - 1)]
}

/// Caller-owned cache of per-(entity, day) added-text token sets.
///
/// Computing a day's token set walks every edit of the entity, so the
/// co-activity pass would otherwise redo that work for every pair the
/// entity appears in. The cache is owned by the pipeline, passed in
/// explicitly, and flushed between periods — the cached sets are derived
/// from one period's edits and must not leak into the next.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: HashMap<(String, NaiveDate), HashSet<String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and store the token set for `entity` on `day` if absent.
    pub fn ensure(&mut self, entity: &str, day: NaiveDate, edits: &[&EditRecord]) {
        self.tokens
            .entry((entity.to_string(), day))
            .or_insert_with(|| {
                let mut tokens = HashSet::new();
                for edit in edits {
                    if edit.period() == day {
                        tokens.extend(tokenize(&edit.added_text()));
                    }
                }
                tokens
            });
    }

    pub fn get(&self, entity: &str, day: NaiveDate) -> Option<&HashSet<String>> {
        self.tokens.get(&(entity.to_string(), day))
    }

    /// Drop all cached token sets.
    pub fn flush(&mut self) {
        self.tokens.clear();
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Build the implicit co-activity graph for one period's edits.
///
/// An edge `(A, B)` requires a shared burst day and a maximum added-text
/// token Jaccard across the shared burst days of at least
/// `similarity_threshold`. Pairs without a shared burst day are skipped
/// outright — no similarity is computed for them, and no amount of textual
/// overlap can connect them.
pub fn build_implicit_graph(
    edits: &[&EditRecord],
    burst_map: &BurstMap,
    similarity_threshold: f64,
    cache: &mut TokenCache,
) -> PeriodGraph {
    let mut builder = PeriodGraphBuilder::new();

    let mut edits_by_entity: BTreeMap<&str, Vec<&EditRecord>> = BTreeMap::new();
    for &edit in edits {
        edits_by_entity.entry(edit.entity.as_str()).or_default().push(edit);
    }

    // Every entity active this period is a node, even if it ends up isolated.
    for entity in edits_by_entity.keys() {
        builder.add_node(entity);
    }

    let empty_days = BTreeSet::new();
    let entities: Vec<&str> = edits_by_entity.keys().copied().collect();

    for (i, &e1) in entities.iter().enumerate() {
        let bursts1 = burst_map.get(e1).unwrap_or(&empty_days);
        for &e2 in &entities[i + 1..] {
            let bursts2 = burst_map.get(e2).unwrap_or(&empty_days);

            let shared_days: Vec<NaiveDate> = bursts1.intersection(bursts2).copied().collect();
            if shared_days.is_empty() {
                // No shared burst: no edge, and no similarity computed.
                continue;
            }

            let mut max_similarity: f64 = 0.0;
            for day in shared_days {
                cache.ensure(e1, day, &edits_by_entity[e1]);
                cache.ensure(e2, day, &edits_by_entity[e2]);
                let similarity = match (cache.get(e1, day), cache.get(e2, day)) {
                    (Some(a), Some(b)) => jaccard(a, b),
                    _ => 0.0,
                };
                max_similarity = max_similarity.max(similarity);
            }

            if max_similarity >= similarity_threshold {
                builder.add_edge(e1, e2);
            }
        }
    }

    let graph = builder.build();
    debug!(
        target: TARGET_GRAPH,
        "Implicit graph: {} nodes, {} edges from {} edits",
        graph.node_count(),
        graph.edge_count(),
        edits.len()
    );
    graph
}
