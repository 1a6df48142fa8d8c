use analysis_core::{AnalysisError, Metric, MetricRecord, PeerAnalysis};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::score::ScoringEngine;
use crate::stats::PeerStatsAggregator;
use crate::table::ComparisonTableFormatter;

/// Runs the full peer comparison for one target ticker: peer-group split,
/// aggregation, table rendering, scoring, result assembly.
pub struct PeerAnalysisPipeline {
    aggregator: PeerStatsAggregator,
    formatter: ComparisonTableFormatter,
    scorer: ScoringEngine,
}

impl PeerAnalysisPipeline {
    pub fn new() -> Self {
        Self {
            aggregator: PeerStatsAggregator::new(),
            formatter: ComparisonTableFormatter::new(),
            scorer: ScoringEngine::new(),
        }
    }

    /// Analyze `target_ticker` against every other entry in
    /// `metrics_by_ticker`.
    ///
    /// Ticker matching is exact-string; callers normalise case before
    /// calling. Returns `MissingTarget` when the target has no record and
    /// `NoPeers` when nothing is left after excluding the target — both are
    /// signals for the caller to route on, not process failures.
    pub fn analyze(
        &self,
        target_ticker: &str,
        metrics_by_ticker: &HashMap<String, MetricRecord>,
    ) -> Result<PeerAnalysis, AnalysisError> {
        let Some(target) = metrics_by_ticker.get(target_ticker) else {
            warn!(ticker = target_ticker, "target absent from provided records");
            return Err(AnalysisError::MissingTarget(target_ticker.to_string()));
        };

        let peer_group: HashMap<String, MetricRecord> = metrics_by_ticker
            .iter()
            .filter(|(ticker, _)| ticker.as_str() != target_ticker)
            .map(|(ticker, record)| (ticker.clone(), record.clone()))
            .collect();

        if peer_group.is_empty() {
            warn!(ticker = target_ticker, "no peers to compare against");
            return Err(AnalysisError::NoPeers(target_ticker.to_string()));
        }

        debug!(
            ticker = target_ticker,
            peers = peer_group.len(),
            "aggregating peer statistics"
        );
        let mut peer_stats = self.aggregator.compute(&peer_group, &Metric::NUMERIC);

        let comparison_table = self.formatter.render(target, &peer_stats);
        let summary_score = self.scorer.score(target, &peer_stats);

        // A metric no peer reports carries no information; keep the result compact.
        peer_stats.retain(|_, stat| !stat.is_empty());

        Ok(PeerAnalysis {
            ticker: target_ticker.to_string(),
            peer_stats,
            comparison_table,
            summary_score,
        })
    }
}

impl Default for PeerAnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}
