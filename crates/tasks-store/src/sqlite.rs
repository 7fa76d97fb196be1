//! `SQLite`-backed task repository.
//!
//! Every statement is parameterized. Concurrency is left to the single
//! connection lock in [`Database`] and to `SQLite` itself.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;

use tasks_core::{NewTask, RepoError, Task, TaskId, TaskPatch, TaskRepository};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_timestamp, task_from_row, TASK_COLUMNS};

const INSERT_TASK: &str =
    "INSERT INTO tasks (id, created_at, updated_at, text, is_complete) VALUES (?1, ?2, ?3, ?4, ?5)";

const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1";

// SQLite evaluates every SET expression against the pre-update row, so the
// CASE tests below compare the request with the stored values.
const UPDATE_TASK: &str = "UPDATE tasks SET
    text = CASE WHEN ?1 = '' THEN text ELSE ?1 END,
    is_complete = ?2,
    updated_at = CASE
        WHEN (?1 <> '' AND ?1 <> text) OR ?2 <> is_complete THEN max(?3, updated_at)
        ELSE updated_at
    END
 WHERE id = ?4";

pub struct SqliteTaskRepo {
    db: Database,
}

impl SqliteTaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl TaskRepository for SqliteTaskRepo {
    #[instrument(skip_all)]
    fn create(&self, new_task: NewTask) -> Result<Task, RepoError> {
        let task = Task::new(new_task.text, Utc::now());

        let inserted = self
            .db
            .with_conn(|conn| {
                conn.execute(
                    INSERT_TASK,
                    params![
                        task.id.as_str(),
                        format_timestamp(&task.created_at),
                        format_timestamp(&task.updated_at),
                        task.text,
                        task.is_complete,
                    ],
                )
            })
            .map_err(|e| RepoError::storage("failed to create task", e))?;

        tracing::debug!(task_id = %task.id, inserted, "task created");
        Ok(task)
    }

    #[instrument(skip(self))]
    fn list(&self) -> Result<Vec<Task>, RepoError> {
        self.db.with_conn(|conn| {
            select_all(conn).map_err(|e| RepoError::storage("failed to list tasks", e))
        })
    }

    #[instrument(skip(self), fields(task_id = %id))]
    fn retrieve(&self, id: &TaskId) -> Result<Task, RepoError> {
        self.db.with_conn(|conn| fetch(conn, id, "failed to retrieve task"))
    }

    #[instrument(skip(self, patch), fields(task_id = %id))]
    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepoError> {
        let now = format_timestamp(&Utc::now());

        self.db.with_conn(|conn| {
            let affected = conn
                .execute(UPDATE_TASK, params![patch.text, patch.is_complete, now, id.as_str()])
                .map_err(|e| RepoError::storage("failed to update task", e))?;
            if affected == 0 {
                return Err(RepoError::NotFound(id.clone()));
            }

            fetch(conn, id, "failed to retrieve task after update")
        })
    }

    #[instrument(skip(self), fields(task_id = %id))]
    fn delete(&self, id: &TaskId) -> Result<(), RepoError> {
        let removed = self
            .db
            .with_conn(|conn| conn.execute(DELETE_TASK, [id.as_str()]))
            .map_err(|e| RepoError::storage("failed to delete task", e))?;
        tracing::debug!(removed, "task delete");
        Ok(())
    }
}

/// Read one task. The engine's "no rows" result becomes `NotFound`.
fn fetch(conn: &Connection, id: &TaskId, context: &'static str) -> Result<Task, RepoError> {
    select_one(conn, id)
        .map_err(|e| RepoError::storage(context, e))?
        .ok_or_else(|| RepoError::NotFound(id.clone()))
}

fn select_one(conn: &Connection, id: &TaskId) -> Result<Option<Task>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
    let mut rows = stmt.query([id.as_str()])?;
    match rows.next()? {
        Some(row) => task_from_row(row).map(Some),
        None => Ok(None),
    }
}

fn select_all(conn: &Connection) -> Result<Vec<Task>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks"))?;
    let mut rows = stmt.query([])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(task_from_row(row)?);
    }
    Ok(tasks)
}
