use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::authz::{Action, Role};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::store::{NewProject, Project, ProjectPatch, ProjectSummary};

/// GET /api/projects - all projects the user created or belongs to
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let mut projects: Vec<ProjectSummary> = state
        .store
        .projects_created_by(user.id)
        .await?
        .into_iter()
        .map(|project| ProjectSummary {
            project,
            role: Role::Owner,
            is_creator: true,
        })
        .collect();

    let seen: HashSet<i64> = projects.iter().map(|p| p.project.id).collect();
    for (project, role) in state.store.projects_with_membership(user.id).await? {
        if seen.contains(&project.id) {
            continue;
        }
        projects.push(ProjectSummary {
            project,
            role,
            is_creator: false,
        });
    }

    Ok(Json(projects))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// POST /api/projects - create a project owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(ApiError::validation_error("Project name is required", None)),
    };

    tracing::debug!("creating project {:?} for user {}", name, user.id);

    let project = state
        .store
        .insert_project(NewProject {
            name,
            description: body.description,
            status: body.status.unwrap_or_else(|| "active".to_string()),
            start_date: body.start_date,
            end_date: body.end_date,
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    state
        .resolver
        .authorize(project_id, user.id, Action::ViewProject)
        .await?;

    let project = state
        .store
        .project_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(project))
}

/// PUT /api/projects/:id - creator or admin member
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, ApiError> {
    state
        .resolver
        .authorize(project_id, user.id, Action::EditProject)
        .await?;

    let project = state
        .store
        .update_project(project_id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(project))
}

/// DELETE /api/projects/:id - creator only
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .resolver
        .authorize(project_id, user.id, Action::DeleteProject)
        .await?;

    state.store.delete_project(project_id).await?;

    Ok(Json(json!({ "message": "Project deleted successfully" })))
}
