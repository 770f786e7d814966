use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::emotion::{DerivedLabel, Emotion};

/// The merged focus/emotion assessment. Replaced wholesale every tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyState {
    /// `None` until the focus service has answered at least once this session.
    pub focused: Option<bool>,
    pub attention_score: Option<f32>,
    pub emotion: Option<Emotion>,
    pub confidence: f32,
    pub derived_label: DerivedLabel,
    pub observed_at: DateTime<Utc>,
}

impl StudyState {
    /// State a session starts from before its first tick lands.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            focused: None,
            attention_score: None,
            emotion: None,
            confidence: 0.0,
            derived_label: DerivedLabel::Unknown,
            observed_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub state: StudyState,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(state: StudyState) -> Self {
        Self {
            timestamp: state.observed_at,
            state,
        }
    }
}
