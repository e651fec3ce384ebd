use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::authz::{Action, MemberEntry, Role};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::store::{GuestMember, NewGuestMember};

/// GET /api/projects/:id/members - merged authenticated + guest listing
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<MemberEntry>>, ApiError> {
    let members = state.resolver.resolve_members(project_id, user.id).await?;
    Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// POST /api/projects/:id/members - add a guest member (creator or admin)
pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<GuestMember>), ApiError> {
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(ApiError::validation_error("Member name is required", None)),
    };
    let email = match body.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_lowercase(),
        _ => return Err(ApiError::validation_error("Email is required", None)),
    };
    let role = parse_role(body.role.as_deref())?;

    state
        .resolver
        .authorize(project_id, user.id, Action::AddMember)
        .await?;

    let guest = state
        .store
        .insert_guest_member(NewGuestMember {
            project_id,
            name,
            email,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(guest)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
}

/// PUT /api/projects/:id/members/:member_id - change a guest member's role
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, member_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<GuestMember>, ApiError> {
    let role = match body.role.as_deref() {
        Some(role) => role
            .parse::<Role>()
            .map_err(|_| ApiError::validation_error("Invalid role", None))?,
        None => return Err(ApiError::validation_error("Role is required", None)),
    };

    state
        .resolver
        .authorize(project_id, user.id, Action::EditMemberRole)
        .await?;

    let guest = state
        .store
        .update_guest_member_role(project_id, member_id, role)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    Ok(Json(guest))
}

/// DELETE /api/projects/:id/members/:member_id - remove a guest member
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, member_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    state
        .resolver
        .authorize(project_id, user.id, Action::RemoveMember)
        .await?;

    state
        .store
        .delete_guest_member(project_id, member_id)
        .await?;

    Ok(Json(json!({ "message": "Member removed" })))
}

fn parse_role(role: Option<&str>) -> Result<Role, ApiError> {
    match role {
        None => Ok(Role::Member),
        Some(role) => role
            .parse::<Role>()
            .map_err(|_| ApiError::validation_error("Invalid role", None)),
    }
}
