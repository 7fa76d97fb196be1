//! Error responses.
//!
//! Every failure leaves the server as `{code, status, errors}` where `status`
//! is the canonical reason phrase. Internal causes are logged, never sent.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tasks_core::{RepoError, TaskId};
use tracing::{error, warn};

pub const MSG_NOT_FOUND: &str = "task not found";
pub const MSG_INTERNAL: &str = "internal server error";
pub const MSG_TIMEOUT: &str = "request timed out";

/// Wire shape of an error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub status: String,
    pub errors: Vec<String>,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or_default().to_string(),
            errors: vec![message.into()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, MSG_NOT_FOUND)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
    }

    pub fn timeout() -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, MSG_TIMEOUT)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Log a repository failure and map it to its response.
    pub fn from_repo(err: &RepoError, operation: &'static str, task_id: Option<&TaskId>) -> Self {
        let task_id = task_id.map(TaskId::as_str).unwrap_or_default();
        match err {
            RepoError::NotFound(_) => {
                warn!(operation, task_id, error = %err, "task not found");
                Self::not_found()
            }
            RepoError::Storage { source, .. } => {
                error!(operation, task_id, error = %err, cause = %source, "repository failure");
                Self::internal()
            }
        }
    }
}

/// Failure of a repository call made from a handler.
#[derive(Debug)]
pub enum CallError {
    Repo(RepoError),
    /// The blocking task panicked or was cancelled.
    Aborted(tokio::task::JoinError),
}

impl CallError {
    pub fn into_api(self, operation: &'static str, task_id: Option<&TaskId>) -> ApiError {
        match self {
            Self::Repo(err) => ApiError::from_repo(&err, operation, task_id),
            Self::Aborted(err) => {
                error!(operation, error = %err, "repository call aborted");
                ApiError::internal()
            }
        }
    }
}

impl From<RepoError> for CallError {
    fn from(err: RepoError) -> Self {
        Self::Repo(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorEnvelope::new(self.status, self.message))).into_response()
    }
}
