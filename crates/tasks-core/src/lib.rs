//! # tasks-core
//!
//! The task domain: the [`Task`] record, its identifier, the inputs accepted by
//! create and update, and the [`TaskRepository`] contract every storage
//! backend implements.

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod repository;
pub mod task;

pub use errors::RepoError;
pub use ids::TaskId;
pub use repository::TaskRepository;
pub use task::{NewTask, Task, TaskPatch};
