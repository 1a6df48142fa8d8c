use analysis_core::{Metric, MetricRecord, PeerStat};
use std::collections::BTreeMap;

/// Baseline before any peer-relative adjustment; parity with the group.
pub const BASELINE_SCORE: i64 = 50;

/// Which side of the scaled peer mean a band covers.
#[derive(Debug, Clone, Copy)]
enum Side {
    Below,
    Above,
}

/// One scoring band: fires when the target lies on `side` of
/// `multiplier * peer_mean`. Bands are checked in order and the first hit
/// wins, which keeps them mutually exclusive without overlap guards.
#[derive(Debug, Clone, Copy)]
struct Band {
    side: Side,
    multiplier: f64,
    points: i64,
}

const fn band(side: Side, multiplier: f64, points: i64) -> Band {
    Band {
        side,
        multiplier,
        points,
    }
}

/// Lower is better (P/E, Forward P/E, PEG). Only applied when the peer
/// mean is strictly positive; a negative-earnings peer group makes these
/// ratios meaningless.
const VALUATION_BANDS: [Band; 4] = [
    band(Side::Below, 0.8, 5),  // significantly cheaper
    band(Side::Below, 1.0, 2),  // cheaper
    band(Side::Above, 1.5, -5), // significantly more expensive
    band(Side::Above, 1.0, -2), // more expensive
];

/// Higher is better (ROE, margins, growth). No positivity guard: a
/// negative peer mean is still a meaningful bar to clear.
const STRENGTH_BANDS: [Band; 4] = [
    band(Side::Above, 1.5, 7),
    band(Side::Above, 1.0, 3),
    band(Side::Below, 0.8, -7),
    band(Side::Below, 1.0, -3),
];

/// Debt/Equity: lower is better, with wider bands and bigger swings than
/// the valuation metrics.
const LEVERAGE_BANDS: [Band; 4] = [
    band(Side::Below, 0.5, 7),
    band(Side::Below, 1.0, 3),
    band(Side::Above, 1.5, -7),
    band(Side::Above, 1.0, -3),
];

const VALUATION_METRICS: [Metric; 3] = [Metric::PeRatio, Metric::ForwardPe, Metric::PegRatio];

const STRENGTH_METRICS: [Metric; 5] = [
    Metric::Roe,
    Metric::OperatingMargin,
    Metric::GrossMargin,
    Metric::RevenueGrowth,
    Metric::EpsGrowth,
];

/// Converts target-vs-peer-mean deltas into a single bounded score.
/// Deterministic and stateless.
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Summary score in 0..=100. Starts at [`BASELINE_SCORE`], applies the
    /// band adjustment for every scored metric where both sides are
    /// numeric, then clamps.
    pub fn score(&self, target: &MetricRecord, peer_stats: &BTreeMap<Metric, PeerStat>) -> i64 {
        let mut score = BASELINE_SCORE;

        for metric in VALUATION_METRICS {
            score += self.adjustment(target, peer_stats, metric, &VALUATION_BANDS, true);
        }
        for metric in STRENGTH_METRICS {
            score += self.adjustment(target, peer_stats, metric, &STRENGTH_BANDS, false);
        }
        score += self.adjustment(target, peer_stats, Metric::DebtEquity, &LEVERAGE_BANDS, false);

        score.clamp(0, 100)
    }

    /// Points from the first matching band for one metric, or 0 when either
    /// side lacks a numeric value or the positivity guard rejects the peer
    /// mean. A target exactly on the peer mean matches no band: every
    /// comparison is strict.
    fn adjustment(
        &self,
        target: &MetricRecord,
        peer_stats: &BTreeMap<Metric, PeerStat>,
        metric: Metric,
        bands: &[Band],
        require_positive_mean: bool,
    ) -> i64 {
        let Some(target_val) = target.numeric(metric) else {
            return 0;
        };
        let Some(peer_mean) = peer_stats.get(&metric).and_then(|s| s.mean) else {
            return 0;
        };
        if require_positive_mean && peer_mean <= 0.0 {
            return 0;
        }

        for band in bands {
            let hit = match band.side {
                Side::Below => target_val < peer_mean * band.multiplier,
                Side::Above => target_val > peer_mean * band.multiplier,
            };
            if hit {
                return band.points;
            }
        }
        0
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}
