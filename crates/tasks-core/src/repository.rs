use crate::errors::RepoError;
use crate::ids::TaskId;
use crate::task::{NewTask, Task, TaskPatch};

/// Storage contract shared by every task backend.
///
/// Implementations must be safe to call concurrently from many request
/// handlers against one instance. No method retries; failures surface
/// immediately.
pub trait TaskRepository: Send + Sync {
    /// Store a new task. The repository assigns the id, both timestamps and
    /// `is_complete = false`. Never returns [`RepoError::NotFound`].
    fn create(&self, new_task: NewTask) -> Result<Task, RepoError>;

    /// Every stored task, in no particular order. Empty when nothing is stored.
    fn list(&self) -> Result<Vec<Task>, RepoError>;

    /// The task with `id`, or [`RepoError::NotFound`].
    fn retrieve(&self, id: &TaskId) -> Result<Task, RepoError>;

    /// Merge `patch` into the task with `id` and return the full record.
    ///
    /// Empty `patch.text` leaves the text unchanged, `patch.is_complete` is
    /// always applied, and `updated_at` moves only if something changed.
    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepoError>;

    /// Remove the task with `id`. Deleting a missing task succeeds.
    fn delete(&self, id: &TaskId) -> Result<(), RepoError>;
}
