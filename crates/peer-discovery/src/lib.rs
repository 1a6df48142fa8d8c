use analysis_core::{AnalysisError, PeerFinder};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Default source for the constituent list. Column layout matches the
/// local CSV: Symbol, Security, GICS Sector, GICS Sub-Industry.
pub const DEFAULT_CSV_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv";

/// One S&P 500 constituent row.
#[derive(Debug, Clone, Deserialize)]
pub struct Constituent {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Security")]
    pub security: String,
    #[serde(rename = "GICS Sector")]
    pub sector: String,
    #[serde(rename = "GICS Sub-Industry")]
    pub sub_industry: String,
}

/// In-memory S&P 500 constituent directory. Peers of a ticker are every
/// other constituent sharing its GICS Sub-Industry, in list order.
#[derive(Debug)]
pub struct Sp500Directory {
    constituents: Vec<Constituent>,
}

impl Sp500Directory {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                AnalysisError::InsufficientData(format!(
                    "cannot read constituent list {}: {} (run with --refresh to download it)",
                    path.display(),
                    e
                ))
            })?;
        Self::from_csv(reader)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, AnalysisError> {
        Self::from_csv(csv::ReaderBuilder::new().has_headers(true).from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, AnalysisError> {
        let constituents: Vec<Constituent> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .map_err(|e| AnalysisError::InvalidData(format!("malformed constituent row: {}", e)))?;

        tracing::debug!(count = constituents.len(), "loaded constituent directory");
        Ok(Self { constituents })
    }

    /// Download a fresh constituent CSV, persist it to `path`, and load it.
    pub async fn refresh(url: &str, path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {} fetching constituent list",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        std::fs::write(path.as_ref(), &body)
            .map_err(|e| AnalysisError::InvalidData(format!("cannot write constituent list: {}", e)))?;
        tracing::info!(path = %path.as_ref().display(), "refreshed constituent list");

        Self::from_reader(body.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<&Constituent> {
        self.constituents.iter().find(|c| c.symbol == ticker)
    }

    /// Same-sub-industry constituents, excluding the ticker itself.
    /// Unknown tickers get an empty list, not an error.
    pub fn peers_of(&self, ticker: &str) -> Vec<String> {
        let Some(target) = self.get(ticker) else {
            tracing::warn!(ticker, "ticker not found in constituent list");
            return Vec::new();
        };

        self.constituents
            .iter()
            .filter(|c| c.sub_industry == target.sub_industry && c.symbol != ticker)
            .map(|c| c.symbol.clone())
            .collect()
    }
}

#[async_trait]
impl PeerFinder for Sp500Directory {
    async fn find_peers(&self, ticker: &str) -> Result<Vec<String>, AnalysisError> {
        Ok(self.peers_of(ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Symbol,Security,GICS Sector,GICS Sub-Industry
AAPL,Apple Inc.,Information Technology,\"Technology Hardware, Storage & Peripherals\"
MSFT,Microsoft,Information Technology,Systems Software
NVDA,Nvidia,Information Technology,Semiconductors
AMD,Advanced Micro Devices,Information Technology,Semiconductors
INTC,Intel,Information Technology,Semiconductors
KO,Coca-Cola,Consumer Staples,Soft Drinks & Non-alcoholic Beverages
";

    fn directory() -> Sp500Directory {
        Sp500Directory::from_reader(SAMPLE_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn loads_all_rows() {
        let dir = directory();
        assert_eq!(dir.len(), 6);
        assert_eq!(dir.get("KO").unwrap().sector, "Consumer Staples");
    }

    #[test]
    fn peers_share_the_sub_industry_and_exclude_the_target() {
        let peers = directory().peers_of("NVDA");
        assert_eq!(peers, vec!["AMD".to_string(), "INTC".to_string()]);
    }

    #[test]
    fn sole_member_of_a_sub_industry_has_no_peers() {
        assert!(directory().peers_of("AAPL").is_empty());
    }

    #[test]
    fn unknown_ticker_yields_empty_not_error() {
        assert!(directory().peers_of("ZZZZ").is_empty());
    }

    #[test]
    fn quoted_sub_industries_parse() {
        let dir = directory();
        assert_eq!(
            dir.get("AAPL").unwrap().sub_industry,
            "Technology Hardware, Storage & Peripherals"
        );
    }

    #[test]
    fn malformed_csv_is_invalid_data() {
        let err = Sp500Directory::from_reader("Symbol,Security\nAAPL".as_bytes()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }
}
