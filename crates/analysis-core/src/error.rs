use thiserror::Error;

/// Recoverable analysis conditions. `MissingTarget` and `NoPeers` are
/// signals the caller is expected to match on, not process-fatal faults.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No data for target {0}")]
    MissingTarget(String),

    #[error("No peer data available for {0}")]
    NoPeers(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),
}
