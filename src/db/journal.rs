use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{
    helpers::{parse_datetime, parse_optional_datetime, parse_status, to_u32},
    models::{JournalEntry, JournalStatus},
    Database,
};
use crate::models::SessionSummary;

const SELECT_COLUMNS: &str = "id, remote_id, principal, started_at, ended_at, status,
     total_duration, average_attention_score, recommended_break_duration,
     created_at, updated_at";

fn row_to_entry(row: &Row) -> Result<JournalEntry> {
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let status: String = row.get("status")?;
    let recommended_break: Option<i64> = row.get("recommended_break_duration")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(JournalEntry {
        id: row.get("id")?,
        remote_id: row.get("remote_id")?,
        principal: row.get("principal")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        status: parse_status(&status)?,
        total_duration: row.get("total_duration")?,
        average_attention_score: row.get("average_attention_score")?,
        recommended_break_duration: to_u32(recommended_break, "recommended_break_duration")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn collect_entries(rows: Vec<rusqlite::Result<Result<JournalEntry>>>) -> Result<Vec<JournalEntry>> {
    rows.into_iter().map(|row| row?).collect()
}

impl Database {
    pub async fn insert_journal_entry(&self, entry: &JournalEntry) -> Result<()> {
        let record = entry.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, remote_id, principal, started_at, ended_at, status,
                                       total_duration, average_attention_score,
                                       recommended_break_duration, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.remote_id,
                    record.principal,
                    record.started_at.to_rfc3339(),
                    record.ended_at.map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                    record.total_duration,
                    record.average_attention_score,
                    record.recommended_break_duration,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Records the end of a session. The summary is only present when the
    /// server acknowledged the close.
    pub async fn close_journal_entry(
        &self,
        entry_id: &str,
        status: JournalStatus,
        ended_at: DateTime<Utc>,
        summary: Option<SessionSummary>,
    ) -> Result<()> {
        let entry_id = entry_id.to_string();
        let summary = summary.unwrap_or_default();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     ended_at = COALESCE(ended_at, ?2),
                     total_duration = COALESCE(?3, total_duration),
                     average_attention_score = COALESCE(?4, average_attention_score),
                     recommended_break_duration = COALESCE(?5, recommended_break_duration),
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    status.as_str(),
                    ended_at.to_rfc3339(),
                    summary.total_duration,
                    summary.average_attention_score,
                    summary.recommended_break_duration,
                    Utc::now().to_rfc3339(),
                    entry_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_journal_entry(&self, entry_id: &str) -> Result<Option<JournalEntry>> {
        let entry_id = entry_id.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {SELECT_COLUMNS} FROM sessions WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row(params![entry_id], |row| Ok(row_to_entry(row)))
                .optional()?
                .transpose()
        })
        .await
    }

    /// Sessions the server may still hold open, oldest first.
    pub async fn pending_journal_entries(&self) -> Result<Vec<JournalEntry>> {
        self.execute(|conn| {
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM sessions
                 WHERE status IN ('Open', 'Unconfirmed')
                 ORDER BY started_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_entry(row)))?
                .collect::<Vec<_>>();
            collect_entries(rows)
        })
        .await
    }

    pub async fn recent_journal_entries(&self, limit: u32) -> Result<Vec<JournalEntry>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM sessions
                 ORDER BY started_at DESC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit], |row| Ok(row_to_entry(row)))?
                .collect::<Vec<_>>();
            collect_entries(rows)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, SessionId};
    use chrono::Duration;

    fn open_journal() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("journal.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn open_then_close_with_summary() {
        let (_dir, db) = open_journal();
        let session = Session::open(SessionId::new("42"), Utc::now());
        let entry = JournalEntry::opened(&session, Some("user-1"));
        db.insert_journal_entry(&entry).await.unwrap();

        let pending = db.pending_journal_entries().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].remote_id, "42");
        assert_eq!(pending[0].principal.as_deref(), Some("user-1"));

        let ended = session.started_at + Duration::minutes(25);
        let summary = SessionSummary {
            total_duration: Some(25.0),
            average_attention_score: Some(64.5),
            recommended_break_duration: Some(5),
            focus_percent: None,
        };
        db.close_journal_entry(&entry.id, JournalStatus::Closed, ended, Some(summary))
            .await
            .unwrap();

        let stored = db.get_journal_entry(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JournalStatus::Closed);
        assert_eq!(stored.ended_at, Some(ended));
        assert_eq!(stored.average_attention_score, Some(64.5));
        assert_eq!(stored.recommended_break_duration, Some(5));
        assert!(db.pending_journal_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unconfirmed_close_stays_pending_and_keeps_end_time() {
        let (_dir, db) = open_journal();
        let session = Session::open(SessionId::new("7"), Utc::now());
        let entry = JournalEntry::opened(&session, None);
        db.insert_journal_entry(&entry).await.unwrap();

        let first_end = session.started_at + Duration::minutes(1);
        db.close_journal_entry(&entry.id, JournalStatus::Unconfirmed, first_end, None)
            .await
            .unwrap();
        assert_eq!(db.pending_journal_entries().await.unwrap().len(), 1);

        db.close_journal_entry(
            &entry.id,
            JournalStatus::Closed,
            first_end + Duration::hours(2),
            None,
        )
        .await
        .unwrap();
        let stored = db.get_journal_entry(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.ended_at, Some(first_end), "original end time wins");
    }

    #[tokio::test]
    async fn recent_entries_are_newest_first() {
        let (_dir, db) = open_journal();
        let base = Utc::now();
        for i in 0..3 {
            let session = Session::open(SessionId::new(i.to_string()), base + Duration::minutes(i));
            db.insert_journal_entry(&JournalEntry::opened(&session, None))
                .await
                .unwrap();
        }

        let recent = db.recent_journal_entries(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|e| e.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert!(db.get_journal_entry("missing").await.unwrap().is_none());
    }

    #[test]
    fn status_serializes_as_its_column_value() {
        for status in [
            JournalStatus::Open,
            JournalStatus::Closed,
            JournalStatus::Unconfirmed,
            JournalStatus::Interrupted,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }
}
