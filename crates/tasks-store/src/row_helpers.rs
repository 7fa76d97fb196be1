use chrono::{DateTime, SecondsFormat, Utc};
use tasks_core::{Task, TaskId};

use crate::error::StoreError;

const TABLE: &str = "tasks";

/// Column list shared by every `SELECT`, in [`task_from_row`] order.
pub const TASK_COLUMNS: &str = "id, created_at, updated_at, text, is_complete";

/// Fixed-width RFC 3339 with nanoseconds and a `Z` suffix, so that string
/// order equals time order and values round-trip exactly.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored timestamp, returning `CorruptRow` on failure.
pub fn parse_timestamp(raw: &str, column: &'static str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table: TABLE,
            column,
            detail: format!("invalid timestamp {raw:?}: {e}"),
        })
}

/// Get a required column value from a row, returning `CorruptRow` on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table: TABLE,
        column,
        detail: e.to_string(),
    })
}

/// Decode a row selected with [`TASK_COLUMNS`].
pub fn task_from_row(row: &rusqlite::Row<'_>) -> Result<Task, StoreError> {
    let created_at: String = get(row, 1, "created_at")?;
    let updated_at: String = get(row, 2, "updated_at")?;

    Ok(Task {
        id: TaskId::from_raw(get::<String>(row, 0, "id")?),
        created_at: parse_timestamp(&created_at, "created_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
        text: get(row, 3, "text")?,
        is_complete: get(row, 4, "is_complete")?,
    })
}
