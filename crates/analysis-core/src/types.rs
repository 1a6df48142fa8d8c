use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Named financial metric tracked per company.
///
/// Ordering follows declaration order and fixes the iteration order of
/// metric-keyed maps throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "P/E")]
    PeRatio,
    #[serde(rename = "Forward P/E")]
    ForwardPe,
    #[serde(rename = "PEG Ratio")]
    PegRatio,
    #[serde(rename = "EPS")]
    Eps,
    #[serde(rename = "EPS Growth")]
    EpsGrowth,
    #[serde(rename = "Debt/Equity")]
    DebtEquity,
    #[serde(rename = "ROE")]
    Roe,
    #[serde(rename = "Operating Margin")]
    OperatingMargin,
    #[serde(rename = "Gross Margin")]
    GrossMargin,
    #[serde(rename = "Revenue Growth")]
    RevenueGrowth,
    #[serde(rename = "Free Cash Flow")]
    FreeCashFlow,
}

impl Metric {
    /// Every metric eligible for peer-group aggregation.
    pub const NUMERIC: [Metric; 11] = [
        Metric::PeRatio,
        Metric::ForwardPe,
        Metric::PegRatio,
        Metric::Eps,
        Metric::EpsGrowth,
        Metric::DebtEquity,
        Metric::Roe,
        Metric::OperatingMargin,
        Metric::GrossMargin,
        Metric::RevenueGrowth,
        Metric::FreeCashFlow,
    ];

    /// Human-readable label for tables and reports
    pub fn label(&self) -> &'static str {
        match self {
            Metric::PeRatio => "P/E",
            Metric::ForwardPe => "Forward P/E",
            Metric::PegRatio => "PEG Ratio",
            Metric::Eps => "EPS",
            Metric::EpsGrowth => "EPS Growth",
            Metric::DebtEquity => "Debt/Equity",
            Metric::Roe => "ROE",
            Metric::OperatingMargin => "Operating Margin",
            Metric::GrossMargin => "Gross Margin",
            Metric::RevenueGrowth => "Revenue Growth",
            Metric::FreeCashFlow => "Free Cash Flow",
        }
    }
}

/// One metric's value on one entity.
///
/// Providers hand back numbers, placeholder strings, and outright gaps;
/// everything that is not a finite number degrades to "no numeric value"
/// before any arithmetic, so a computed zero stays distinguishable from
/// missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Missing,
}

impl MetricValue {
    /// The numeric value, if one is actually present and finite.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(n: Option<f64>) -> Self {
        match n {
            Some(n) => MetricValue::Number(n),
            None => MetricValue::Missing,
        }
    }
}

/// One entity's full metric mapping, plus descriptive fields that never
/// enter aggregation or scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    metrics: HashMap<Metric, MetricValue>,
}

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, metric: Metric, value: impl Into<MetricValue>) {
        self.metrics.insert(metric, value.into());
    }

    /// Builder-style setter, handy in tests and fixtures.
    pub fn with(mut self, metric: Metric, value: impl Into<MetricValue>) -> Self {
        self.set(metric, value);
        self
    }

    pub fn get(&self, metric: Metric) -> &MetricValue {
        static MISSING: MetricValue = MetricValue::Missing;
        self.metrics.get(&metric).unwrap_or(&MISSING)
    }

    /// Numeric value of a metric, or None when absent/non-numeric.
    pub fn numeric(&self, metric: Metric) -> Option<f64> {
        self.get(metric).as_number()
    }
}

/// Per-metric peer aggregate. Both fields are None when no peer reported
/// a numeric value for the metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerStat {
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl PeerStat {
    pub fn is_empty(&self) -> bool {
        self.mean.is_none() && self.median.is_none()
    }
}

/// Result of one peer comparison run.
///
/// Carries no timestamp on purpose: identical inputs must produce an
/// identical, value-comparable result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerAnalysis {
    pub ticker: String,
    /// Metrics where at least one peer reported a numeric value.
    pub peer_stats: BTreeMap<Metric, PeerStat>,
    /// Self-contained plain-text table, embeddable verbatim in a report.
    pub comparison_table: String,
    /// 0..=100, 50 = parity with the peer group.
    pub summary_score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_are_not_numeric() {
        assert_eq!(MetricValue::Number(f64::NAN).as_number(), None);
        assert_eq!(MetricValue::Number(f64::INFINITY).as_number(), None);
        assert_eq!(MetricValue::Number(0.0).as_number(), Some(0.0));
    }

    #[test]
    fn text_and_missing_are_not_numeric() {
        assert!(!MetricValue::Text("incomplete".to_string()).is_numeric());
        assert!(!MetricValue::Missing.is_numeric());
    }

    #[test]
    fn absent_metric_reads_as_missing() {
        let record = MetricRecord::new().with(Metric::PeRatio, 12.5);
        assert_eq!(record.numeric(Metric::PeRatio), Some(12.5));
        assert_eq!(*record.get(Metric::Roe), MetricValue::Missing);
        assert_eq!(record.numeric(Metric::Roe), None);
    }

    #[test]
    fn metric_serializes_under_display_key() {
        let json = serde_json::to_string(&Metric::ForwardPe).unwrap();
        assert_eq!(json, "\"Forward P/E\"");
    }
}
