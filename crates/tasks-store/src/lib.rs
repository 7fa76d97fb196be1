//! # tasks-store
//!
//! The two [`TaskRepository`](tasks_core::TaskRepository) backends:
//!
//! - [`MemoryTaskRepo`]: a map behind one reader/writer lock, lost on restart
//! - [`SqliteTaskRepo`]: a single flat `tasks` table in `SQLite`

#![deny(unsafe_code)]

pub mod database;
pub mod error;
pub mod in_memory;
pub mod row_helpers;
pub mod schema;
pub mod sqlite;

pub use database::Database;
pub use error::StoreError;
pub use in_memory::MemoryTaskRepo;
pub use sqlite::SqliteTaskRepo;
