//! Study-session data models.
//!
//! A `Session` is opened by the session controller and closed exactly once;
//! a new interval always gets a new `Session`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-issued session identifier. Treated as opaque text on this side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "Open",
            SessionStatus::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl Session {
    pub fn open(id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            ended_at: None,
            status: SessionStatus::Open,
        }
    }

    /// Consumes the open session and returns its closed form.
    pub fn close(self, ended_at: DateTime<Utc>) -> Self {
        Self {
            ended_at: Some(ended_at.max(self.started_at)),
            status: SessionStatus::Closed,
            ..self
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

/// Server-side summary returned when a session is closed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Minutes between start and end as computed by the server.
    pub total_duration: Option<f64>,
    pub average_attention_score: Option<f64>,
    /// Suggested break length in minutes.
    pub recommended_break_duration: Option<u32>,
    pub focus_percent: Option<f64>,
}

/// What `SessionController::stop` hands back on success.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session: Session,
    pub summary: SessionSummary,
}

/// One row of the server's session listing, used by history views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverview {
    pub id: SessionId,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_duration: Option<f64>,
    pub average_attention_score: Option<f64>,
    pub recommended_break_duration: Option<u32>,
}

/// A single attention record logged by the focus service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub attention_score: Option<f64>,
    pub dominant_emotion: Option<String>,
    pub emotion_confidence: Option<f64>,
    pub break_recommended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub overview: SessionOverview,
    pub records: Vec<AttentionRecord>,
}
