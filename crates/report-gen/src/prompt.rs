use analysis_core::{Metric, MetricRecord, PeerAnalysis};
use std::fmt::Write;

fn fmt_ratio(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "N/A".to_string())
}

fn fmt_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "N/A".to_string())
}

/// "3575501553664" -> "3,575,501,553,664"
fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn fmt_market_cap(value: Option<f64>) -> String {
    value
        .map(|v| format!("${}", group_thousands(v)))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Assemble the full analyst prompt: company snapshot, key metrics, the
/// comparison table embedded verbatim, the summary score with its legend,
/// and the structured task framing.
pub fn build_prompt(ticker: &str, target: &MetricRecord, analysis: &PeerAnalysis) -> String {
    let name = target.name.as_deref().unwrap_or(ticker);
    let sector = target.sector.as_deref().unwrap_or("N/A");
    let industry = target.industry.as_deref().unwrap_or("N/A");

    let mut key_metrics = String::from(
        "| Metric             | Value          |\n\
         |--------------------|----------------|\n",
    );
    for (metric, cell) in [
        (Metric::PeRatio, fmt_ratio(target.numeric(Metric::PeRatio))),
        (Metric::ForwardPe, fmt_ratio(target.numeric(Metric::ForwardPe))),
        (Metric::PegRatio, fmt_ratio(target.numeric(Metric::PegRatio))),
        (Metric::Roe, fmt_percent(target.numeric(Metric::Roe))),
        (Metric::EpsGrowth, fmt_percent(target.numeric(Metric::EpsGrowth))),
        (Metric::RevenueGrowth, fmt_percent(target.numeric(Metric::RevenueGrowth))),
        (Metric::DebtEquity, fmt_ratio(target.numeric(Metric::DebtEquity))),
    ] {
        let _ = writeln!(key_metrics, "| {:<18} | {:<14} |", metric.label(), cell);
    }

    format!(
        "You are an expert investment analyst. Provide a professional, data-driven \
analysis for {ticker} based on the information below. Use an executive-level, \
clear, and concise tone.\n\n\
**Company Data for {ticker}:**\n\n\
**1) Company Snapshot:**\n\
- Name: {name}\n\
- Sector / Industry: {sector} / {industry}\n\
- Market Cap: {market_cap}\n\n\
**2) Key Metrics:**\n{key_metrics}\n\
**3) Peer Comparison Table:**\n{table}\n\
**4) Summary Score vs Peers:**\n\
- Score: {score}/100 (100 means significantly stronger than peers, 50 is \
average, below 40 is weaker).\n\n\
**Your Task (answer in this structure):**\n\n\
**1) Company Snapshot:**\n* A 10-second highlight about the company.\n\n\
**2) Competitive Position Summary:**\n\
* **Strengths:** key advantages over peers implied by the data.\n\
* **Weaknesses:** where it lags the peer group.\n\
* **Risk Factors:** risks implied by the financials.\n\
* **Moat:** does the data suggest a durable competitive advantage?\n\n\
**3) Valuation Assessment:**\n\
* Based on P/E and Forward P/E vs peers: Undervalued, Fairly Valued, or \
Overvalued? Add a brief forward-looking view.\n\n\
**4) Investment Thesis (fund-manager style):**\n\
* **Bull Case:** the primary reason for optimism.\n\
* **Bear Case:** the primary reason for caution.\n\
* **Base Case:** the most likely scenario and its key drivers.\n\n\
**5) Actionable Insight:**\n\
* A 2-3 sentence strategic summary. No direct buy/sell advice; focus on the \
trade-off between fundamentals and valuation.\n",
        ticker = ticker,
        name = name,
        sector = sector,
        industry = industry,
        market_cap = fmt_market_cap(target.market_cap),
        key_metrics = key_metrics,
        table = analysis.comparison_table,
        score = analysis.summary_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn analysis(table: &str, score: i64) -> PeerAnalysis {
        PeerAnalysis {
            ticker: "MSFT".to_string(),
            peer_stats: BTreeMap::new(),
            comparison_table: table.to_string(),
            summary_score: score,
        }
    }

    fn target() -> MetricRecord {
        let mut record = MetricRecord::new()
            .with(Metric::PeRatio, 34.21)
            .with(Metric::Roe, 0.3224);
        record.name = Some("Microsoft Corporation".to_string());
        record.sector = Some("Technology".to_string());
        record.market_cap = Some(3_575_501_553_664.0);
        record
    }

    #[test]
    fn embeds_table_and_score_verbatim() {
        let table = "| P/E | 34.21 | 30.00 | +14.0% |\n";
        let prompt = build_prompt("MSFT", &target(), &analysis(table, 75));
        assert!(prompt.contains(table));
        assert!(prompt.contains("Score: 75/100"));
    }

    #[test]
    fn absent_metrics_render_as_placeholders() {
        let prompt = build_prompt("MSFT", &target(), &analysis("", 50));
        // No Debt/Equity on the record.
        let de_row = prompt
            .lines()
            .find(|l| l.starts_with("| Debt/Equity"))
            .unwrap();
        assert!(de_row.contains("N/A"));
        assert!(prompt.contains("32.24%"));
    }

    #[test]
    fn market_cap_is_grouped() {
        let prompt = build_prompt("MSFT", &target(), &analysis("", 50));
        assert!(prompt.contains("$3,575,501,553,664"));
    }

    #[test]
    fn group_thousands_handles_small_and_negative() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(-1234567.0), "-1,234,567");
    }
}
