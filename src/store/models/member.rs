use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::Role;

/// Membership of an authenticated user in a project. Unique per
/// (project_id, user_id); the project creator needs no row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: i64,
    pub project_id: i64,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Participant without an auth identity, addressable for display only.
/// Email is stored lower-cased.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuestMember {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGuestMember {
    pub project_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}
