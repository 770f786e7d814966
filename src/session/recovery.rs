use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

use crate::{
    api::{ApiError, SessionApi},
    db::{Database, JournalEntry, JournalStatus},
    models::SessionId,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    pub closed: usize,
    pub still_pending: usize,
}

/// Closes sessions a previous run left open on the server.
///
/// Rows found `Open` were cut short and become `Interrupted`. Rows already
/// closed locally (`Unconfirmed`) become `Closed` once the server agrees.
/// A 404 means the server no longer knows the session, which is final too.
/// Anything else stays pending for the next start.
pub async fn recover_unfinished(journal: &Database, api: &dyn SessionApi) -> Result<RecoveryReport> {
    let pending = journal.pending_journal_entries().await?;
    let mut report = RecoveryReport::default();

    for entry in pending {
        let remote_id = SessionId::new(entry.remote_id.clone());
        let ended_at = entry.ended_at.unwrap_or_else(Utc::now);

        let (status, summary) = match api.end_session(&remote_id).await {
            Ok(summary) => (final_status(&entry), Some(summary)),
            Err(ApiError::Status { status: 404, .. }) => (final_status(&entry), None),
            Err(err) => {
                warn!("Session {remote_id} still unconfirmed: {err}");
                report.still_pending += 1;
                continue;
            }
        };

        journal
            .close_journal_entry(&entry.id, status, ended_at, summary)
            .await?;
        info!("Recovered session {remote_id} as {}", status.as_str());
        report.closed += 1;
    }

    Ok(report)
}

fn final_status(entry: &JournalEntry) -> JournalStatus {
    match entry.status {
        JournalStatus::Unconfirmed => JournalStatus::Closed,
        _ => JournalStatus::Interrupted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StartedSession;
    use crate::models::{Session, SessionMetrics, SessionOverview, SessionSummary};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct CannedApi {
        replies: HashMap<&'static str, Result<SessionSummary, ApiError>>,
    }

    #[async_trait]
    impl SessionApi for CannedApi {
        async fn start_session(&self) -> Result<StartedSession, ApiError> {
            unimplemented!("recovery never opens sessions")
        }

        async fn end_session(&self, session_id: &SessionId) -> Result<SessionSummary, ApiError> {
            self.replies
                .get(session_id.as_str())
                .cloned()
                .unwrap_or_else(|| Err(ApiError::Transport("no reply".into())))
        }

        async fn list_sessions(&self) -> Result<Vec<SessionOverview>, ApiError> {
            Ok(Vec::new())
        }

        async fn session_metrics(&self, _id: &SessionId) -> Result<SessionMetrics, ApiError> {
            Err(ApiError::Transport("unused".into()))
        }
    }

    async fn journal_with(entries: &[(&str, JournalStatus)]) -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("journal.sqlite3")).unwrap();
        for (remote_id, status) in entries {
            let session = Session::open(SessionId::new(*remote_id), Utc::now());
            let entry = JournalEntry::opened(&session, None);
            db.insert_journal_entry(&entry).await.unwrap();
            if *status != JournalStatus::Open {
                db.close_journal_entry(&entry.id, *status, Utc::now(), None)
                    .await
                    .unwrap();
            }
        }
        (dir, db)
    }

    #[tokio::test]
    async fn open_rows_become_interrupted_and_unreachable_rows_wait() {
        let (_dir, db) = journal_with(&[
            ("1", JournalStatus::Open),
            ("2", JournalStatus::Unconfirmed),
            ("3", JournalStatus::Open),
            ("4", JournalStatus::Closed),
        ])
        .await;
        let api = CannedApi {
            replies: HashMap::from([
                ("1", Ok(SessionSummary::default())),
                (
                    "2",
                    Err(ApiError::Status {
                        status: 404,
                        detail: "Session not found".into(),
                    }),
                ),
            ]),
        };

        let report = recover_unfinished(&db, &api).await.unwrap();
        assert_eq!(report, RecoveryReport { closed: 2, still_pending: 1 });

        let by_remote: HashMap<String, JournalStatus> = db
            .recent_journal_entries(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.remote_id, e.status))
            .collect();
        assert_eq!(by_remote["1"], JournalStatus::Interrupted);
        assert_eq!(by_remote["2"], JournalStatus::Closed);
        assert_eq!(by_remote["3"], JournalStatus::Open);
        assert_eq!(by_remote["4"], JournalStatus::Closed);
    }
}
