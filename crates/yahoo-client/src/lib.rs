use analysis_core::{AnalysisError, Metric, MetricRecord, MetricsProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query2.finance.yahoo.com";

const MODULES: &str = "summaryDetail,financialData,defaultKeyStatistics,assetProfile,price";

// Yahoo rejects requests without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let wait_until = ts.front().copied().map(|f| f + self.window).unwrap_or(now);
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Yahoo API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Yahoo Finance quoteSummary client producing [`MetricRecord`]s.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new() -> Self {
        // Default 60 req/min; YAHOO_RATE_LIMIT overrides for throttled networks.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Fetch one ticker's quoteSummary and map it to a record.
    /// Returns None when Yahoo has no usable payload for the symbol.
    pub async fn get_metrics(&self, ticker: &str) -> Result<Option<MetricRecord>, AnalysisError> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/v10/finance/quoteSummary/{}", BASE_URL, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("modules", MODULES)])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        // Yahoo answers unknown symbols with 404 and a quoteSummary error body.
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let summary: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(summary
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(record_from_result))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsProvider for YahooClient {
    /// Tickers that cannot be resolved are logged and dropped; the returned
    /// map may be smaller than the request.
    async fn fetch_metrics(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, MetricRecord>, AnalysisError> {
        let mut all_data = HashMap::new();

        for ticker in tickers {
            match self.get_metrics(ticker).await {
                Ok(Some(record)) => {
                    all_data.insert(ticker.clone(), record);
                }
                Ok(None) => {
                    tracing::warn!(ticker = ticker.as_str(), "no usable data, skipping");
                }
                Err(e) => {
                    tracing::warn!(ticker = ticker.as_str(), error = %e, "fetch failed, skipping");
                }
            }
        }

        Ok(all_data)
    }
}

// --- Raw quoteSummary DTOs ---

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    financial_data: Option<FinancialData>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    price: Option<PriceInfo>,
}

/// Yahoo wraps every numeric field in a `{raw, fmt}` envelope; empty
/// envelopes (`{}`) mean the field is not reported.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(default, rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    earnings_growth: Option<RawValue>,
    #[serde(default)]
    debt_to_equity: Option<RawValue>,
    #[serde(default)]
    return_on_equity: Option<RawValue>,
    #[serde(default)]
    operating_margins: Option<RawValue>,
    #[serde(default)]
    gross_margins: Option<RawValue>,
    #[serde(default)]
    revenue_growth: Option<RawValue>,
    #[serde(default)]
    free_cashflow: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    peg_ratio: Option<RawValue>,
    #[serde(default)]
    trailing_eps: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceInfo {
    #[serde(default)]
    long_name: Option<String>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

/// Map one quoteSummary result onto a [`MetricRecord`]. A result with no
/// modules at all is treated as unresolvable.
fn record_from_result(result: QuoteSummaryResult) -> Option<MetricRecord> {
    if result.summary_detail.is_none()
        && result.financial_data.is_none()
        && result.default_key_statistics.is_none()
        && result.asset_profile.is_none()
        && result.price.is_none()
    {
        return None;
    }

    let detail = result.summary_detail.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();
    let key_stats = result.default_key_statistics.unwrap_or_default();
    let profile = result.asset_profile.unwrap_or_default();
    let price = result.price.unwrap_or_default();

    let mut record = MetricRecord::new();
    record.name = price.long_name;
    record.sector = profile.sector;
    record.industry = profile.industry;
    record.market_cap = raw(&detail.market_cap);

    record.set(Metric::PeRatio, raw(&detail.trailing_pe));
    record.set(Metric::ForwardPe, raw(&detail.forward_pe));
    record.set(Metric::PegRatio, raw(&key_stats.peg_ratio));
    record.set(Metric::Eps, raw(&key_stats.trailing_eps));
    record.set(Metric::EpsGrowth, raw(&financial.earnings_growth));
    record.set(Metric::DebtEquity, raw(&financial.debt_to_equity));
    record.set(Metric::Roe, raw(&financial.return_on_equity));
    record.set(Metric::OperatingMargin, raw(&financial.operating_margins));
    record.set(Metric::GrossMargin, raw(&financial.gross_margins));
    record.set(Metric::RevenueGrowth, raw(&financial.revenue_growth));
    record.set(Metric::FreeCashFlow, raw(&financial.free_cashflow));

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "quoteSummary": {
            "result": [{
                "summaryDetail": {
                    "trailingPE": {"raw": 34.21, "fmt": "34.21"},
                    "forwardPE": {"raw": 32.17, "fmt": "32.17"},
                    "marketCap": {"raw": 3575501553664, "fmt": "3.58T"}
                },
                "financialData": {
                    "returnOnEquity": {"raw": 0.3224, "fmt": "32.24%"},
                    "operatingMargins": {"raw": 0.4887},
                    "grossMargins": {"raw": 0.6876},
                    "revenueGrowth": {"raw": 0.184},
                    "earningsGrowth": {"raw": 0.127},
                    "debtToEquity": {"raw": 33.15},
                    "freeCashflow": {"raw": 63300000000}
                },
                "defaultKeyStatistics": {
                    "pegRatio": {},
                    "trailingEps": {"raw": 11.8}
                },
                "assetProfile": {
                    "sector": "Technology",
                    "industry": "Software - Infrastructure"
                },
                "price": {"longName": "Microsoft Corporation"}
            }],
            "error": null
        }
    }"#;

    fn parse(payload: &str) -> Option<MetricRecord> {
        let response: QuoteSummaryResponse = serde_json::from_str(payload).unwrap();
        response
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(record_from_result)
    }

    #[test]
    fn maps_quote_summary_to_record() {
        let record = parse(SAMPLE).unwrap();
        assert_eq!(record.name.as_deref(), Some("Microsoft Corporation"));
        assert_eq!(record.sector.as_deref(), Some("Technology"));
        assert_eq!(record.market_cap, Some(3575501553664.0));
        assert_eq!(record.numeric(Metric::PeRatio), Some(34.21));
        assert_eq!(record.numeric(Metric::Roe), Some(0.3224));
        assert_eq!(record.numeric(Metric::DebtEquity), Some(33.15));
    }

    #[test]
    fn empty_envelope_degrades_to_missing() {
        let record = parse(SAMPLE).unwrap();
        // pegRatio came back as an empty {} envelope.
        assert_eq!(record.numeric(Metric::PegRatio), None);
    }

    #[test]
    fn result_with_no_modules_is_unresolvable() {
        let payload = r#"{"quoteSummary": {"result": [{}], "error": null}}"#;
        assert!(parse(payload).is_none());
    }

    #[test]
    fn missing_result_list_is_unresolvable() {
        let payload = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert!(parse(payload).is_none());
    }
}
