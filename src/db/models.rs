use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Session;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JournalStatus {
    /// Session is (or was, before a crash) being sampled.
    Open,
    /// Closed locally and acknowledged by the server.
    Closed,
    /// Closed locally but the server never acknowledged the close.
    Unconfirmed,
    /// Found open after a restart and closed during recovery.
    Interrupted,
}

impl JournalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalStatus::Open => "Open",
            JournalStatus::Closed => "Closed",
            JournalStatus::Unconfirmed => "Unconfirmed",
            JournalStatus::Interrupted => "Interrupted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub remote_id: String,
    pub principal: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: JournalStatus,
    pub total_duration: Option<f64>,
    pub average_attention_score: Option<f64>,
    pub recommended_break_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn opened(session: &Session, principal: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            remote_id: session.id.as_str().to_string(),
            principal: principal.map(str::to_string),
            started_at: session.started_at,
            ended_at: None,
            status: JournalStatus::Open,
            total_duration: None,
            average_attention_score: None,
            recommended_break_duration: None,
            created_at: now,
            updated_at: now,
        }
    }
}
