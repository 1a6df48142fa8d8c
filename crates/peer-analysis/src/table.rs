use analysis_core::{Metric, MetricRecord, PeerStat};
use std::collections::BTreeMap;
use std::fmt::Write;

/// How a metric renders inside the table.
#[derive(Debug, Clone, Copy)]
enum DisplayStyle {
    /// Fixed-point with 2 decimals, e.g. "34.21"
    Ratio,
    /// Fraction rendered as a percentage with 2 decimals, e.g. "32.24%"
    Percent,
}

/// Display order and format of the comparison rows.
const DISPLAY_ROWS: [(Metric, DisplayStyle); 9] = [
    (Metric::PeRatio, DisplayStyle::Ratio),
    (Metric::ForwardPe, DisplayStyle::Ratio),
    (Metric::PegRatio, DisplayStyle::Ratio),
    (Metric::Roe, DisplayStyle::Percent),
    (Metric::OperatingMargin, DisplayStyle::Percent),
    (Metric::GrossMargin, DisplayStyle::Percent),
    (Metric::RevenueGrowth, DisplayStyle::Percent),
    (Metric::EpsGrowth, DisplayStyle::Percent),
    (Metric::DebtEquity, DisplayStyle::Ratio),
];

const PLACEHOLDER: &str = "N/A";

/// One displayed metric's cells. The delta is defined only when both sides
/// are numeric and the peer mean is non-zero.
#[derive(Debug, Clone, Copy)]
struct ComparisonRow {
    target: Option<f64>,
    peer_mean: Option<f64>,
    delta: Option<f64>,
}

impl ComparisonRow {
    fn build(target: Option<f64>, peer_mean: Option<f64>) -> Self {
        let delta = match (target, peer_mean) {
            (Some(t), Some(m)) if m != 0.0 => Some((t - m) / m.abs()),
            _ => None,
        };
        Self {
            target,
            peer_mean,
            delta,
        }
    }
}

/// Renders the target-vs-peer-mean comparison as a column-aligned
/// markdown-style text table.
pub struct ComparisonTableFormatter;

impl ComparisonTableFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Any cell whose source value is absent or non-numeric renders as
    /// "N/A"; the delta additionally requires a non-zero peer mean.
    pub fn render(
        &self,
        target: &MetricRecord,
        peer_stats: &BTreeMap<Metric, PeerStat>,
    ) -> String {
        let mut table = String::new();
        table.push_str(
            "| Metric             | Target Company | Peer Group (Mean) | Comparison vs Mean |\n",
        );
        table.push_str(
            "|--------------------|----------------|-------------------|--------------------|\n",
        );

        for (metric, style) in DISPLAY_ROWS {
            let row = ComparisonRow::build(
                target.numeric(metric),
                peer_stats.get(&metric).and_then(|s| s.mean),
            );

            let target_cell = format_cell(row.target, style);
            let peer_cell = format_cell(row.peer_mean, style);
            let delta_cell = format_delta(row.delta);

            // Column widths fixed at 18/14/17/18.
            let _ = writeln!(
                table,
                "| {:<18} | {:<14} | {:<17} | {:<18} |",
                metric.label(),
                target_cell,
                peer_cell,
                delta_cell
            );
        }

        table
    }
}

impl Default for ComparisonTableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_cell(value: Option<f64>, style: DisplayStyle) -> String {
    match value {
        Some(v) => match style {
            DisplayStyle::Ratio => format!("{:.2}", v),
            DisplayStyle::Percent => format!("{:.2}%", v * 100.0),
        },
        None => PLACEHOLDER.to_string(),
    }
}

/// Signed percentage with one decimal and an explicit "+" for non-negative
/// values.
fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) => {
            let sign = if d >= 0.0 { "+" } else { "" };
            format!("{}{:.1}%", sign, d * 100.0)
        }
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(entries: &[(Metric, f64)]) -> BTreeMap<Metric, PeerStat> {
        entries
            .iter()
            .map(|&(metric, mean)| {
                (
                    metric,
                    PeerStat {
                        mean: Some(mean),
                        median: Some(mean),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn renders_header_and_all_nine_rows() {
        let table =
            ComparisonTableFormatter::new().render(&MetricRecord::new(), &BTreeMap::new());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[0].contains("Target Company"));
        assert!(lines[1].starts_with("|----"));
        assert!(lines[2].starts_with("| P/E "));
        assert!(lines[10].starts_with("| Debt/Equity "));
    }

    #[test]
    fn ratio_and_percent_styles_format_differently() {
        let target = MetricRecord::new()
            .with(Metric::PeRatio, 34.214)
            .with(Metric::Roe, 0.3224);
        let peer_stats = stats(&[(Metric::PeRatio, 30.0), (Metric::Roe, 0.25)]);

        let table = ComparisonTableFormatter::new().render(&target, &peer_stats);
        assert!(table.contains("34.21"));
        assert!(table.contains("32.24%"));
        assert!(table.contains("25.00%"));
    }

    #[test]
    fn positive_delta_carries_explicit_plus() {
        let target = MetricRecord::new().with(Metric::PeRatio, 34.2);
        let table = ComparisonTableFormatter::new().render(&target, &stats(&[(Metric::PeRatio, 30.0)]));
        assert!(table.contains("+14.0%"));
    }

    #[test]
    fn negative_delta_is_signed_by_the_number() {
        let target = MetricRecord::new().with(Metric::PeRatio, 15.0);
        let table = ComparisonTableFormatter::new().render(&target, &stats(&[(Metric::PeRatio, 30.0)]));
        assert!(table.contains("-50.0%"));
    }

    #[test]
    fn delta_against_negative_mean_uses_its_magnitude() {
        let target = MetricRecord::new().with(Metric::RevenueGrowth, 0.10);
        let table = ComparisonTableFormatter::new()
            .render(&target, &stats(&[(Metric::RevenueGrowth, -0.10)]));
        // (0.10 - (-0.10)) / 0.10 = +200%
        assert!(table.contains("+200.0%"));
    }

    #[test]
    fn absent_target_blanks_the_row_derived_cells() {
        let table = ComparisonTableFormatter::new()
            .render(&MetricRecord::new(), &stats(&[(Metric::PeRatio, 30.0)]));
        let pe_row = table.lines().nth(2).unwrap();
        assert!(pe_row.contains("N/A"));
        assert!(pe_row.contains("30.00"));
        // Delta needs both sides.
        assert_eq!(pe_row.matches("N/A").count(), 2);
    }

    #[test]
    fn zero_peer_mean_leaves_delta_unavailable() {
        let target = MetricRecord::new().with(Metric::RevenueGrowth, 0.25);
        let table = ComparisonTableFormatter::new()
            .render(&target, &stats(&[(Metric::RevenueGrowth, 0.0)]));
        let row = table
            .lines()
            .find(|l| l.starts_with("| Revenue Growth"))
            .unwrap();
        assert!(row.contains("25.00%"));
        assert!(row.contains("0.00%"));
        assert!(row.contains("N/A"));
    }

    #[test]
    fn columns_stay_aligned() {
        let target = MetricRecord::new().with(Metric::PeRatio, 34.2);
        let table = ComparisonTableFormatter::new().render(&target, &stats(&[(Metric::PeRatio, 30.0)]));
        let widths: Vec<usize> = table.lines().map(|l| l.len()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
