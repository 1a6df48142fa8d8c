use analysis_core::{Metric, MetricRecord, PeerStat};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};

/// Reduces a peer group's raw metric records into per-metric mean/median.
pub struct PeerStatsAggregator;

impl PeerStatsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Mean and median per metric, computed over exactly the peers that
    /// report a finite numeric value for that metric. Peers with a missing
    /// or non-numeric entry are left out of the aggregate, never zero-filled.
    /// An empty numeric subset yields an all-absent stat.
    pub fn compute(
        &self,
        peer_group: &HashMap<String, MetricRecord>,
        metrics: &[Metric],
    ) -> BTreeMap<Metric, PeerStat> {
        let mut stats = BTreeMap::new();

        for &metric in metrics {
            let mut values: Vec<f64> = peer_group
                .values()
                .filter_map(|record| record.numeric(metric))
                .collect();

            let stat = if values.is_empty() {
                PeerStat::default()
            } else {
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                PeerStat {
                    mean: Some(values.as_slice().mean()),
                    median: Some(median_of_sorted(&values)),
                }
            };
            stats.insert(metric, stat);
        }

        stats
    }
}

impl Default for PeerStatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard statistical median: middle element for odd counts, average of
/// the two central elements for even counts.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
