//! Session-lifecycle boundary: the backend that opens, closes and lists
//! study sessions.

pub mod http;
mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{SessionId, SessionMetrics, SessionOverview, SessionSummary};

pub use http::HttpSessionApi;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("service unreachable: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartedSession {
    pub id: SessionId,
    /// Server clock at creation, when the backend reports one.
    pub start_time: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn start_session(&self) -> Result<StartedSession, ApiError>;

    async fn end_session(&self, session_id: &SessionId) -> Result<SessionSummary, ApiError>;

    async fn list_sessions(&self) -> Result<Vec<SessionOverview>, ApiError>;

    async fn session_metrics(&self, session_id: &SessionId) -> Result<SessionMetrics, ApiError>;
}
