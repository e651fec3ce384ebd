use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::authz::Action;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::store::{AssignedTask, NewTask, Task, TaskPatch, TaskWithAssignee};

/// GET /api/projects/:id/tasks
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<TaskWithAssignee>>, ApiError> {
    state
        .resolver
        .authorize_task_view(project_id, user.id)
        .await?;

    let tasks = state.store.tasks_for_project(project_id).await?;
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
}

/// POST /api/projects/:id/tasks - any project member
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let title = match body.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => return Err(ApiError::validation_error("Task title is required", None)),
    };

    state
        .resolver
        .authorize(project_id, user.id, Action::CreateTask)
        .await?;

    let task = state
        .store
        .insert_task(NewTask {
            project_id,
            title,
            description: body.description.unwrap_or_default(),
            status: body.status.unwrap_or_else(|| "todo".to_string()),
            assigned_to: body.assigned_to,
            due_date: body.due_date,
            priority: body.priority.unwrap_or_else(|| "medium".to_string()),
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/:id - any member of the owning project
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .store
        .task_by_id(task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    state
        .resolver
        .authorize(task.project_id, user.id, Action::EditTask)
        .await?;

    let task = state
        .store
        .update_task(task_id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(Json(task))
}

/// DELETE /api/tasks/:id - any member of the owning project
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let task = state
        .store
        .task_by_id(task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    state
        .resolver
        .authorize(task.project_id, user.id, Action::DeleteTask)
        .await?;

    state.store.delete_task(task_id).await?;

    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

/// GET /api/my-tasks - tasks assigned to the caller across projects
pub async fn assigned(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AssignedTask>>, ApiError> {
    let tasks = state.store.tasks_assigned_to(user.id).await?;
    Ok(Json(tasks))
}
