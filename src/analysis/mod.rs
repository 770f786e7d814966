//! Clients for the two classification backends.
//!
//! Each client is a single request/response round trip with no shared state.
//! Failures are reported per outcome so one backend going down never hides
//! the other backend's answer.

pub mod emotion;
pub mod error;
pub mod focus;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::Sample;
use crate::models::{Emotion, SessionId};

pub use emotion::HttpEmotionClient;
pub use error::AnalysisError;
pub use focus::HttpFocusClient;

/// Result of one backend call within one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusReading {
    pub focused: bool,
    /// Free-text state name the focus service may attach; informational only.
    pub study_state: Option<String>,
    pub attention_score: Option<f32>,
}

impl FocusReading {
    pub fn new(focused: bool) -> Self {
        Self {
            focused,
            study_state: None,
            attention_score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    /// `None` when the classifier answered with a label outside the known set.
    pub emotion: Option<Emotion>,
    pub label: String,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    pub probabilities: BTreeMap<String, f32>,
}

impl EmotionReading {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            emotion: Emotion::from_label(label),
            label: label.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
            probabilities: BTreeMap::new(),
        }
    }
}

pub type FocusOutcome = Outcome<FocusReading>;
pub type EmotionOutcome = Outcome<EmotionReading>;

/// Attention/focus detector. Also the system of record for the session's
/// attention log, so each call is logged server-side against `session_id`.
#[async_trait]
pub trait FocusClient: Send + Sync {
    async fn analyze(&self, sample: &Sample, session_id: &SessionId) -> FocusOutcome;
}

/// Stateless emotion classifier, possibly on a different backend.
#[async_trait]
pub trait EmotionClient: Send + Sync {
    async fn classify(&self, sample: &Sample) -> EmotionOutcome;

    async fn health(&self) -> Result<(), AnalysisError> {
        Ok(())
    }
}
