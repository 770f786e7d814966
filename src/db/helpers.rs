use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use super::models::JournalStatus;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_status(value: &str) -> Result<JournalStatus> {
    match value {
        "Open" => Ok(JournalStatus::Open),
        "Closed" => Ok(JournalStatus::Closed),
        "Unconfirmed" => Ok(JournalStatus::Unconfirmed),
        "Interrupted" => Ok(JournalStatus::Interrupted),
        other => Err(anyhow!("unknown journal status {other}")),
    }
}

pub fn to_u32(value: Option<i64>, field: &str) -> Result<Option<u32>> {
    value
        .map(|raw| u32::try_from(raw).map_err(|_| anyhow!("{field} out of range: {raw}")))
        .transpose()
}
