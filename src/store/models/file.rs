use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserProfile;

/// File metadata. The binary payload lives in the external object store;
/// this row is the system of record for "the file exists".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub project_id: i64,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileWithUploader {
    #[serde(flatten)]
    pub file: FileRecord,
    pub uploader: Option<UserProfile>,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub project_id: i64,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub uploaded_by: Uuid,
}
