//! JSON shapes of the session backend and their conversion into models.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::models::{AttentionRecord, SessionId, SessionMetrics, SessionOverview, SessionSummary};

/// The backend uses integer primary keys; other deployments hand out strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum RemoteId {
    Int(i64),
    Text(String),
}

impl From<RemoteId> for SessionId {
    fn from(id: RemoteId) -> Self {
        match id {
            RemoteId::Int(value) => SessionId::new(value.to_string()),
            RemoteId::Text(value) => SessionId::new(value),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StartSessionResponse {
    pub session_id: RemoteId,
    pub start_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SummaryBody {
    pub total_duration: Option<f64>,
    pub average_attention_score: Option<f64>,
    pub recommended_break_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EndSessionResponse {
    #[serde(default)]
    pub session_summary: Option<SummaryBody>,
    pub focus_percent: Option<f64>,
}

impl From<EndSessionResponse> for SessionSummary {
    fn from(body: EndSessionResponse) -> Self {
        let summary = body.session_summary.unwrap_or_default();
        SessionSummary {
            total_duration: summary.total_duration,
            average_attention_score: summary.average_attention_score,
            recommended_break_duration: summary.recommended_break_duration.map(break_minutes),
            focus_percent: body.focus_percent,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionRow {
    pub id: RemoteId,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub total_duration: Option<f64>,
    pub average_attention_score: Option<f64>,
    pub recommended_break_duration: Option<f64>,
}

impl From<SessionRow> for SessionOverview {
    fn from(row: SessionRow) -> Self {
        SessionOverview {
            id: row.id.into(),
            started_at: row.start_time.as_deref().and_then(parse_server_time),
            ended_at: row.end_time.as_deref().and_then(parse_server_time),
            total_duration: row.total_duration,
            average_attention_score: row.average_attention_score,
            recommended_break_duration: row.recommended_break_duration.map(break_minutes),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MetricRow {
    pub timestamp: Option<String>,
    pub attention_score: Option<f64>,
    pub dominant_emotion: Option<String>,
    pub emotion_confidence: Option<f64>,
    #[serde(default)]
    pub break_recommended: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionMetricsResponse {
    pub session_id: RemoteId,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub total_duration: Option<f64>,
    pub average_attention_score: Option<f64>,
    pub recommended_break_duration: Option<f64>,
    #[serde(default)]
    pub metrics: Vec<MetricRow>,
}

impl From<SessionMetricsResponse> for SessionMetrics {
    fn from(body: SessionMetricsResponse) -> Self {
        let records = body
            .metrics
            .into_iter()
            .map(|row| AttentionRecord {
                timestamp: row.timestamp.as_deref().and_then(parse_server_time),
                attention_score: row.attention_score,
                dominant_emotion: row.dominant_emotion,
                emotion_confidence: row.emotion_confidence,
                break_recommended: row.break_recommended.unwrap_or(false),
            })
            .collect();

        SessionMetrics {
            overview: SessionOverview {
                id: body.session_id.into(),
                started_at: body.start_time.as_deref().and_then(parse_server_time),
                ended_at: body.end_time.as_deref().and_then(parse_server_time),
                total_duration: body.total_duration,
                average_attention_score: body.average_attention_score,
                recommended_break_duration: body.recommended_break_duration.map(break_minutes),
            },
            records,
        }
    }
}

fn break_minutes(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Accepts RFC 3339 or the naive ISO timestamps the backend emits (assumed UTC).
pub(super) fn parse_server_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_string_ids_are_accepted() {
        let int: StartSessionResponse = serde_json::from_str(r#"{"session_id": 42}"#).unwrap();
        assert_eq!(SessionId::from(int.session_id).as_str(), "42");

        let text: StartSessionResponse =
            serde_json::from_str(r#"{"session_id": "abc-1", "start_time": "2024-03-01T09:00:00"}"#)
                .unwrap();
        assert_eq!(SessionId::from(text.session_id).as_str(), "abc-1");
        assert!(text.start_time.as_deref().and_then(parse_server_time).is_some());
    }

    #[test]
    fn naive_and_rfc3339_times_parse() {
        let naive = parse_server_time("2024-03-01T09:00:00.123456").unwrap();
        let rfc = parse_server_time("2024-03-01T09:00:00.123456+00:00").unwrap();
        assert_eq!(naive, rfc);
        assert!(parse_server_time("yesterday").is_none());
    }

    #[test]
    fn end_session_summary_is_flattened() {
        let body: EndSessionResponse = serde_json::from_str(
            r#"{"message": "Session ended successfully",
                "session_summary": {"total_duration": 25.5,
                                    "average_attention_score": 72.0,
                                    "recommended_break_duration": 5}}"#,
        )
        .unwrap();
        let summary = SessionSummary::from(body);
        assert_eq!(summary.total_duration, Some(25.5));
        assert_eq!(summary.recommended_break_duration, Some(5));
        assert_eq!(summary.focus_percent, None);
    }

    #[test]
    fn metrics_rows_convert() {
        let body: SessionMetricsResponse = serde_json::from_str(
            r#"{"session_id": 3, "start_time": "2024-03-01T09:00:00", "end_time": null,
                "total_duration": null, "average_attention_score": null,
                "recommended_break_duration": null,
                "metrics": [{"timestamp": "2024-03-01T09:00:03", "attention_score": 80.0,
                             "dominant_emotion": "happy", "emotion_confidence": 0.7,
                             "break_recommended": false}]}"#,
        )
        .unwrap();
        let metrics = SessionMetrics::from(body);
        assert_eq!(metrics.overview.id.as_str(), "3");
        assert_eq!(metrics.records.len(), 1);
        assert_eq!(metrics.records[0].dominant_emotion.as_deref(), Some("happy"));
    }
}
