use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::authz::Action;
use crate::config;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::store::{FileRecord, FileWithUploader, NewFile};

/// GET /api/projects/:id/files - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<FileWithUploader>>, ApiError> {
    state
        .resolver
        .authorize(project_id, user.id, Action::ViewFiles)
        .await?;

    let files = state.store.files_for_project(project_id).await?;
    Ok(Json(files))
}

#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub filename: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
}

/// POST /api/projects/:id/files - record uploaded file metadata
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<i64>,
    Json(body): Json<UploadFileRequest>,
) -> Result<(StatusCode, Json<FileRecord>), ApiError> {
    let mut field_errors = HashMap::new();
    if body.filename.as_deref().map_or(true, |s| s.trim().is_empty()) {
        field_errors.insert("filename".to_string(), "This field is required".to_string());
    }
    if body.file_path.as_deref().map_or(true, |s| s.trim().is_empty()) {
        field_errors.insert("file_path".to_string(), "This field is required".to_string());
    }
    if body.file_size.is_none() {
        field_errors.insert("file_size".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Missing required fields",
            Some(field_errors),
        ));
    }

    let filename = body.filename.unwrap();
    let file_size = body.file_size.unwrap();

    let uploads = &config::config().uploads;
    if file_size > uploads.max_file_size_bytes {
        return Err(ApiError::validation_error(
            "File exceeds maximum allowed size",
            None,
        ));
    }
    if !extension_allowed(&filename, &uploads.allowed_extensions) {
        return Err(ApiError::validation_error("File type not allowed", None));
    }

    state
        .resolver
        .authorize(project_id, user.id, Action::UploadFile)
        .await?;

    let file = state
        .store
        .insert_file(NewFile {
            project_id,
            filename,
            file_path: body.file_path.unwrap(),
            file_size,
            file_type: body
                .file_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            uploaded_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(file)))
}

/// DELETE /api/files/:id - project creator, uploader, or admin member.
/// Removes the metadata row, then best-effort deletes the stored object.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(file_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let file = state
        .store
        .file_by_id(file_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    state
        .resolver
        .authorize(
            file.project_id,
            user.id,
            Action::DeleteFile {
                uploaded_by: file.uploaded_by,
            },
        )
        .await?;

    state.store.delete_file(file_id).await?;

    // The metadata row is gone; a stale blob is tolerable, a resurrected
    // file record is not.
    match &state.storage {
        Some(storage) => {
            if let Err(e) = storage.remove(&file.file_path).await {
                tracing::warn!("storage deletion failed for {}: {}", file.file_path, e);
            }
        }
        None => {
            tracing::debug!(
                "object storage not configured; leaving blob at {}",
                file.file_path
            );
        }
    }

    Ok(Json(json!({ "message": "File deleted successfully" })))
}

fn extension_allowed(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        let allowed = vec!["pdf".to_string(), "png".to_string()];
        assert!(extension_allowed("report.pdf", &allowed));
        assert!(extension_allowed("photo.PNG", &allowed));
        assert!(!extension_allowed("script.exe", &allowed));
        assert!(!extension_allowed("no-extension", &allowed));
    }
}
