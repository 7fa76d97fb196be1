//! # tasks-server
//!
//! Axum HTTP layer over a [`TaskRepository`](tasks_core::TaskRepository).
//!
//! - `GET /`, `POST /`, `GET /{id}`, `PATCH /{id}`, `DELETE /{id}`
//! - JSON error envelope `{code, status, errors}` for every failure
//! - tower-http middleware: request id, access log, panic recovery, timeout
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorEnvelope};
pub use server::{build_router, start, AppState, ServerHandle};
