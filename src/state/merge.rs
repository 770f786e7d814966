use chrono::{DateTime, Utc};

use crate::analysis::{EmotionOutcome, FocusOutcome, Outcome};
use crate::models::{DerivedLabel, StudyState};

/// Folds one tick's outcomes into a fresh `StudyState`.
///
/// A failed outcome keeps the prior value of its field rather than resetting
/// it. `observed_at` always advances to `now` (never backwards), so a backend
/// outage shows up only as a stale but still moving timestamp.
pub fn merge(
    prior: &StudyState,
    focus: &FocusOutcome,
    emotion: &EmotionOutcome,
    now: DateTime<Utc>,
) -> StudyState {
    let (focused, attention_score) = match focus {
        Outcome::Success(reading) => (
            Some(reading.focused),
            reading.attention_score.or(prior.attention_score),
        ),
        Outcome::Failure(_) => (prior.focused, prior.attention_score),
    };

    let (emotion, confidence) = match emotion {
        Outcome::Success(reading) => (reading.emotion, reading.confidence),
        Outcome::Failure(_) => (prior.emotion, prior.confidence),
    };

    StudyState {
        focused,
        attention_score,
        emotion,
        confidence,
        derived_label: DerivedLabel::from_emotion(emotion),
        observed_at: now.max(prior.observed_at),
    }
}
