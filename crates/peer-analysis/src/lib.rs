//! Peer-relative scoring pipeline: peer-group statistics, tolerant numeric
//! comparison, weighted heuristic scoring, and comparison-table rendering.

pub mod pipeline;
pub mod score;
pub mod stats;
pub mod table;

pub use pipeline::PeerAnalysisPipeline;
pub use score::{ScoringEngine, BASELINE_SCORE};
pub use stats::PeerStatsAggregator;
pub use table::ComparisonTableFormatter;
