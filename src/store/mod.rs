pub mod models;
pub mod pg;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::authz::Role;

pub use models::{
    AssignedTask, FileRecord, FileWithUploader, GuestMember, Membership, NewFile, NewGuestMember,
    NewProject, NewTask, Project, ProjectPatch, ProjectSummary, Task, TaskPatch, TaskWithAssignee,
    UserProfile,
};
pub use pg::PgStore;

/// Infrastructure-level store failure. "Row not found" is never an error
/// here; lookups return `Option` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence seam for the hosted relational store. One handle is
/// constructed at startup and shared; every read reflects current state at
/// call time (no caching, no retries at this layer).
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // Projects
    async fn project_by_id(&self, project_id: i64) -> Result<Option<Project>, StoreError>;
    async fn projects_created_by(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError>;
    async fn projects_with_membership(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Project, Role)>, StoreError>;
    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError>;
    async fn update_project(
        &self,
        project_id: i64,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, StoreError>;
    async fn delete_project(&self, project_id: i64) -> Result<(), StoreError>;

    // Memberships
    async fn membership(
        &self,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError>;
    async fn memberships_with_users(
        &self,
        project_id: i64,
    ) -> Result<Vec<(Membership, Option<UserProfile>)>, StoreError>;

    // Guest members
    async fn guest_members(&self, project_id: i64) -> Result<Vec<GuestMember>, StoreError>;
    async fn guest_member_by_email(
        &self,
        project_id: i64,
        email: &str,
    ) -> Result<Option<GuestMember>, StoreError>;
    async fn insert_guest_member(&self, new: NewGuestMember) -> Result<GuestMember, StoreError>;
    async fn update_guest_member_role(
        &self,
        project_id: i64,
        member_id: i64,
        role: Role,
    ) -> Result<Option<GuestMember>, StoreError>;
    async fn delete_guest_member(&self, project_id: i64, member_id: i64)
        -> Result<(), StoreError>;

    // Tasks
    async fn task_by_id(&self, task_id: i64) -> Result<Option<Task>, StoreError>;
    async fn tasks_for_project(&self, project_id: i64)
        -> Result<Vec<TaskWithAssignee>, StoreError>;
    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<AssignedTask>, StoreError>;
    async fn insert_task(&self, new: NewTask) -> Result<Task, StoreError>;
    async fn update_task(&self, task_id: i64, patch: TaskPatch)
        -> Result<Option<Task>, StoreError>;
    async fn delete_task(&self, task_id: i64) -> Result<(), StoreError>;

    // Files
    async fn file_by_id(&self, file_id: i64) -> Result<Option<FileRecord>, StoreError>;
    async fn files_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<FileWithUploader>, StoreError>;
    async fn insert_file(&self, new: NewFile) -> Result<FileRecord, StoreError>;
    async fn delete_file(&self, file_id: i64) -> Result<(), StoreError>;
}
