//! Repository error taxonomy.
//!
//! Every repository method either succeeds or fails with exactly one of two
//! kinds: the addressed task does not exist, or the storage layer failed. The
//! storage cause is kept as the error source for logging; it is never meant
//! for API clients.

use thiserror::Error;

use crate::ids::TaskId;

/// Boxed underlying storage error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`TaskRepository`](crate::TaskRepository) methods.
#[derive(Debug, Error)]
pub enum RepoError {
    /// No task with this id exists. Only `retrieve` and `update` return it.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The storage layer failed (I/O, connection, constraint, corrupt row).
    #[error("storage failure: {context}")]
    Storage {
        /// What the repository was doing, e.g. "failed to update task".
        context: &'static str,
        #[source]
        source: BoxError,
    },
}

impl RepoError {
    pub fn storage(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            context,
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Storage { .. } => "storage",
        }
    }
}
