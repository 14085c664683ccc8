use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::TARGET_AGGREGATION;

/// A temporally persistent, monotonically growing cluster of entities.
///
/// `entities` only ever grows; `start` and `end` are inclusive period keys
/// with `start <= end`. Events are never deleted: once created they stay in
/// the output, frozen or not.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub entities: BTreeSet<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// How a new period's cluster is matched against an open event.
///
/// Selected once at configuration time; no mode strings are threaded through
/// the fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeStrategy {
    /// Merge when the overlap coefficient (shared entities over the smaller
    /// set) reaches `gamma`. Identical sets score 1.0, disjoint sets 0.0,
    /// and a cluster that strictly grew out of an open event also scores
    /// 1.0, so a clique gaining members keeps extending the same event.
    Explicit { gamma: f64 },
    /// Merge when any entity is shared; the score is the overlap size.
    Implicit,
}

impl MergeStrategy {
    /// Score a candidate merge, or `None` when the pair must not merge.
    ///
    /// Scores are only compared among candidates for the same cluster, so
    /// the two variants' scales never mix.
    pub fn merge_score(&self, open: &BTreeSet<String>, cluster: &BTreeSet<String>) -> Option<f64> {
        let shared = open.intersection(cluster).count();
        match *self {
            MergeStrategy::Explicit { gamma } => {
                let smaller = open.len().min(cluster.len());
                if smaller == 0 {
                    return None;
                }
                let coefficient = shared as f64 / smaller as f64;
                (coefficient >= gamma).then_some(coefficient)
            }
            MergeStrategy::Implicit => (shared > 0).then_some(shared as f64),
        }
    }
}

/// Fold per-period cluster sets into a list of events.
///
/// Periods are processed in ascending key order. Each cluster either merges
/// into the best-scoring open event (ties go to the earliest-created one) or
/// founds a new event. After a period, the open set is exactly the events
/// touched in that period; untouched events freeze but remain in the output.
pub fn aggregate(
    periods: &BTreeMap<NaiveDate, Vec<BTreeSet<String>>>,
    strategy: MergeStrategy,
) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();
    // Indices into `events`, ascending, for the previous period's touched events.
    let mut open: Vec<usize> = Vec::new();

    for (&period, clusters) in periods {
        let mut touched: Vec<usize> = Vec::new();

        for cluster in clusters {
            let mut best: Option<(usize, f64)> = None;
            for &idx in &open {
                if let Some(score) = strategy.merge_score(&events[idx].entities, cluster) {
                    // Strict comparison keeps the earliest-created event on ties.
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((idx, score));
                    }
                }
            }

            match best {
                Some((idx, score)) => {
                    let event = &mut events[idx];
                    event.entities.extend(cluster.iter().cloned());
                    event.end = period;
                    debug!(
                        target: TARGET_AGGREGATION,
                        "Merged cluster of {} entities into event {} (score {:.3})",
                        cluster.len(),
                        idx,
                        score
                    );
                    if !touched.contains(&idx) {
                        touched.push(idx);
                    }
                }
                None => {
                    debug!(
                        target: TARGET_AGGREGATION,
                        "Opened new event {} with {} entities at {}",
                        events.len(),
                        cluster.len(),
                        period
                    );
                    touched.push(events.len());
                    events.push(Event {
                        entities: cluster.clone(),
                        start: period,
                        end: period,
                    });
                }
            }
        }

        touched.sort_unstable();
        open = touched;
    }

    info!(
        target: TARGET_AGGREGATION,
        "Aggregated {} periods into {} events",
        periods.len(),
        events.len()
    );
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 10, d).unwrap()
    }

    fn cluster(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn periods(days: &[(u32, Vec<BTreeSet<String>>)]) -> BTreeMap<NaiveDate, Vec<BTreeSet<String>>> {
        days.iter().map(|(d, c)| (day(*d), c.clone())).collect()
    }

    #[test]
    fn test_growing_clique_spans_both_periods() {
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["A", "B", "C", "D"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Explicit { gamma: 0.8 });

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entities, cluster(&["A", "B", "C", "D"]));
        assert_eq!(events[0].start, day(1));
        assert_eq!(events[0].end, day(2));
    }

    #[test]
    fn test_entities_grow_monotonically() {
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["A", "B", "C", "D"])]),
            (3, vec![cluster(&["A", "B", "C", "D", "E"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Explicit { gamma: 0.8 });

        assert_eq!(events.len(), 1);
        let founding = cluster(&["A", "B", "C"]);
        assert!(founding.is_subset(&events[0].entities));
        assert!(events[0].start <= events[0].end);
    }

    #[test]
    fn test_disjoint_clusters_never_merge() {
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["X", "Y", "Z"])]),
        ]);

        for strategy in [MergeStrategy::Explicit { gamma: 0.8 }, MergeStrategy::Implicit] {
            let events = aggregate(&input, strategy);
            assert_eq!(events.len(), 2);
            assert!(events[0].entities.is_disjoint(&events[1].entities));
        }
    }

    #[test]
    fn test_implicit_single_shared_entity_merges() {
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["C", "X", "Y"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Implicit);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entities, cluster(&["A", "B", "C", "X", "Y"]));
        assert_eq!(events[0].end, day(2));
    }

    #[test]
    fn test_explicit_partial_overlap_below_gamma_opens_new_event() {
        // Overlap coefficient 1/3 against gamma 0.8.
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["C", "X", "Y"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Explicit { gamma: 0.8 });
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_frozen_event_cannot_absorb_later_clusters() {
        // The {A,B,C} event is untouched at period 2, so it is frozen; the
        // identical period-3 cluster founds a new event.
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["X", "Y", "Z"])]),
            (3, vec![cluster(&["A", "B", "C"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Explicit { gamma: 0.8 });

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].end, day(1));
        assert_eq!(events[2].start, day(3));
        assert_eq!(events[0].entities, events[2].entities);
    }

    #[test]
    fn test_frozen_events_remain_in_output() {
        let input = periods(&[
            (1, vec![cluster(&["A", "B", "C"])]),
            (2, vec![cluster(&["X", "Y", "Z"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Implicit);
        // The period-1 event froze but was not dropped.
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start, day(1));
    }

    #[test]
    fn test_best_scoring_open_event_wins() {
        // Both open events share entities with the period-2 cluster; the
        // one with the larger overlap absorbs it.
        let input = periods(&[
            (
                1,
                vec![cluster(&["A", "B", "C"]), cluster(&["C", "D", "E", "F"])],
            ),
            (2, vec![cluster(&["D", "E", "X"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Implicit);

        assert_eq!(events.len(), 2);
        // Second event shares {D, E}; first shares nothing.
        assert!(events[1].entities.contains("X"));
        assert!(!events[0].entities.contains("X"));
    }

    #[test]
    fn test_tie_goes_to_earliest_created_event() {
        let input = periods(&[
            (
                1,
                vec![cluster(&["A", "B", "C"]), cluster(&["A", "D", "E"])],
            ),
            (2, vec![cluster(&["A", "X", "Y"])]),
        ]);
        let events = aggregate(&input, MergeStrategy::Implicit);

        assert_eq!(events.len(), 2);
        assert!(events[0].entities.contains("X"));
        assert!(!events[1].entities.contains("X"));
    }

    #[test]
    fn test_empty_input_yields_no_events() {
        let input = BTreeMap::new();
        assert!(aggregate(&input, MergeStrategy::Implicit).is_empty());
    }
}
