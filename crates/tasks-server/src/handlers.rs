//! Route handlers. Each one translates a request into one repository call.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tasks_core::{NewTask, Task, TaskId, TaskPatch};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::server::AppState;

/// Body of `GET /`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub length: usize,
    pub items: Vec<Task>,
}

impl From<Vec<Task>> for TaskList {
    fn from(items: Vec<Task>) -> Self {
        Self {
            length: items.len(),
            items,
        }
    }
}

/// GET /
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<TaskList>, ApiError> {
    let tasks = state
        .run(|repo| repo.list())
        .await
        .map_err(|e| e.into_api("list", None))?;
    Ok(Json(TaskList::from(tasks)))
}

/// POST /
pub async fn create_task(
    State(state): State<AppState>,
    JsonBody(new_task): JsonBody<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state
        .run(move |repo| repo.create(new_task))
        .await
        .map_err(|e| e.into_api("create", None))?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /{id}
pub async fn retrieve_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<Task>, ApiError> {
    let lookup = id.clone();
    let task = state
        .run(move |repo| repo.retrieve(&lookup))
        .await
        .map_err(|e| e.into_api("retrieve", Some(&id)))?;
    Ok(Json(task))
}

/// PATCH /{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    JsonBody(patch): JsonBody<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let target = id.clone();
    let task = state
        .run(move |repo| repo.update(&target, &patch))
        .await
        .map_err(|e| e.into_api("update", Some(&id)))?;
    Ok(Json(task))
}

/// DELETE /{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    let target = id.clone();
    state
        .run(move |repo| repo.delete(&target))
        .await
        .map_err(|e| e.into_api("delete", Some(&id)))?;
    Ok(StatusCode::NO_CONTENT)
}
