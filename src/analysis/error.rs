use thiserror::Error;

/// Why a single analysis request produced no usable reading.
///
/// These never leave the tick: the cycle folds them into `Outcome::Failure`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("timed out after {0}ms")]
    Timeout(u64),
    #[error("HTTP {status}: {detail}")]
    HttpStatus {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("could not build request: {0}")]
    Encode(String),
}
