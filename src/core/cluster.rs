//! Clustering: partition valid items by primary category.

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::{Category, Cluster, ScoredItem};

/// Below this many valid items, everything lands in one catch-all
/// cluster instead of per-category partitions.
const MIN_ITEMS_FOR_PARTITION: usize = 3;

/// Partition valid items into clusters.
///
/// Returns clusters ordered by descending member count, ties broken by
/// category priority, so downstream stages see a deterministic lead
/// story.
pub fn run(items: Vec<ScoredItem>) -> Vec<Cluster> {
    if items.is_empty() {
        return Vec::new();
    }

    if items.len() < MIN_ITEMS_FOR_PARTITION {
        let members = items.into_iter().map(|s| s.item).collect();
        let cluster = Cluster::new(Category::General, members);
        info!(clusters = 1, "too few items to partition, using catch-all cluster");
        return vec![cluster];
    }

    // BTreeMap keys iterate in category priority order, which makes
    // the sort below stable across runs
    let mut by_category: BTreeMap<Category, Vec<_>> = BTreeMap::new();
    for scored in items {
        by_category
            .entry(scored.primary)
            .or_default()
            .push(scored.item);
    }

    let mut clusters: Vec<Cluster> = by_category
        .into_iter()
        .map(|(category, members)| Cluster::new(category, members))
        .collect();

    clusters.sort_by(|a, b| b.len().cmp(&a.len()));

    info!(clusters = clusters.len(), "clustering finished");
    clusters
}
