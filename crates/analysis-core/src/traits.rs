use crate::{AnalysisError, MetricRecord};
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for market-data providers. Tickers that cannot be resolved are
/// simply absent from the returned map; the result may be smaller than
/// the request.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn fetch_metrics(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, MetricRecord>, AnalysisError>;
}

/// Trait for peer-discovery sources. The returned list excludes the
/// queried ticker and may be empty.
#[async_trait]
pub trait PeerFinder: Send + Sync {
    async fn find_peers(&self, ticker: &str) -> Result<Vec<String>, AnalysisError>;
}

/// Trait for narrative text generators
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AnalysisError>;
}
