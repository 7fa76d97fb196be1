//! Map-backed task repository.
//!
//! One reader/writer lock guards the whole map: `create`, `update` and
//! `delete` take it exclusively, `list` and `retrieve` share it. Nothing is
//! persisted.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::instrument;

use tasks_core::{NewTask, RepoError, Task, TaskId, TaskPatch, TaskRepository};

/// In-memory repository, for tests and throwaway deployments.
///
/// Callers get owned copies; stored records change only through the
/// repository methods.
#[derive(Debug, Default)]
pub struct MemoryTaskRepo {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with existing tasks, keyed by their ids.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl TaskRepository for MemoryTaskRepo {
    #[instrument(skip_all)]
    fn create(&self, new_task: NewTask) -> Result<Task, RepoError> {
        let task = Task::new(new_task.text, Utc::now());
        let _ = self.tasks.write().insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn list(&self) -> Result<Vec<Task>, RepoError> {
        Ok(self.tasks.read().values().cloned().collect())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    fn retrieve(&self, id: &TaskId) -> Result<Task, RepoError> {
        self.tasks
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.clone()))
    }

    #[instrument(skip(self, patch), fields(task_id = %id))]
    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepoError> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(id.clone()))?;

        if task.apply(patch, Utc::now()) {
            tracing::debug!("task changed");
        }
        Ok(task.clone())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    fn delete(&self, id: &TaskId) -> Result<(), RepoError> {
        let _ = self.tasks.write().remove(id);
        Ok(())
    }
}
