use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

use crate::authz::Role;
use crate::config;

use super::models::task::ProjectName;
use super::{
    AssignedTask, FileRecord, FileWithUploader, GuestMember, Membership, NewFile, NewGuestMember,
    NewProject, NewTask, Project, ProjectPatch, ResourceStore, StoreError, Task, TaskPatch,
    TaskWithAssignee, UserProfile,
};

/// `ResourceStore` backed by the hosted Postgres database. Constructed once
/// at startup and closed on shutdown.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect() -> Result<Self, StoreError> {
        let url =
            std::env::var("DATABASE_URL").map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))?;
        let db = &config::config().database;

        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(Duration::from_secs(db.connect_timeout_secs))
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// Join rows, flattened by column alias and split back into domain pairs.

#[derive(FromRow)]
struct ProjectRoleRow {
    id: i64,
    name: String,
    description: Option<String>,
    status: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role: Role,
}

impl ProjectRoleRow {
    fn split(self) -> (Project, Role) {
        (
            Project {
                id: self.id,
                name: self.name,
                description: self.description,
                status: self.status,
                start_date: self.start_date,
                end_date: self.end_date,
                created_by: self.created_by,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.role,
        )
    }
}

#[derive(FromRow)]
struct MemberUserRow {
    id: i64,
    project_id: i64,
    user_id: Uuid,
    role: Role,
    created_at: DateTime<Utc>,
    user_email: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
}

impl MemberUserRow {
    fn split(self) -> (Membership, Option<UserProfile>) {
        let profile = self.user_email.map(|email| UserProfile {
            id: self.user_id,
            email,
            first_name: self.user_first_name,
            last_name: self.user_last_name,
        });
        (
            Membership {
                id: self.id,
                project_id: self.project_id,
                user_id: self.user_id,
                role: self.role,
                created_at: self.created_at,
            },
            profile,
        )
    }
}

#[derive(FromRow)]
struct TaskAssigneeRow {
    id: i64,
    project_id: i64,
    title: String,
    description: String,
    status: String,
    assigned_to: Option<Uuid>,
    due_date: Option<NaiveDate>,
    priority: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_email: Option<String>,
    assignee_first_name: Option<String>,
    assignee_last_name: Option<String>,
}

impl TaskAssigneeRow {
    fn into_task_with_assignee(self) -> TaskWithAssignee {
        let assignee = match (self.assigned_to, self.assignee_email) {
            (Some(id), Some(email)) => Some(UserProfile {
                id,
                email,
                first_name: self.assignee_first_name,
                last_name: self.assignee_last_name,
            }),
            _ => None,
        };
        TaskWithAssignee {
            task: Task {
                id: self.id,
                project_id: self.project_id,
                title: self.title,
                description: self.description,
                status: self.status,
                assigned_to: self.assigned_to,
                due_date: self.due_date,
                priority: self.priority,
                created_by: self.created_by,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            assignee,
        }
    }
}

#[derive(FromRow)]
struct AssignedTaskRow {
    id: i64,
    project_id: i64,
    title: String,
    description: String,
    status: String,
    assigned_to: Option<Uuid>,
    due_date: Option<NaiveDate>,
    priority: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    project_name: String,
}

impl AssignedTaskRow {
    fn into_assigned_task(self) -> AssignedTask {
        AssignedTask {
            task: Task {
                id: self.id,
                project_id: self.project_id,
                title: self.title,
                description: self.description,
                status: self.status,
                assigned_to: self.assigned_to,
                due_date: self.due_date,
                priority: self.priority,
                created_by: self.created_by,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            project: ProjectName {
                name: self.project_name,
            },
        }
    }
}

#[derive(FromRow)]
struct FileUploaderRow {
    id: i64,
    project_id: i64,
    filename: String,
    file_path: String,
    file_size: i64,
    file_type: String,
    uploaded_by: Uuid,
    uploaded_at: DateTime<Utc>,
    uploader_email: Option<String>,
    uploader_first_name: Option<String>,
    uploader_last_name: Option<String>,
}

impl FileUploaderRow {
    fn into_file_with_uploader(self) -> FileWithUploader {
        let uploader = self.uploader_email.map(|email| UserProfile {
            id: self.uploaded_by,
            email,
            first_name: self.uploader_first_name,
            last_name: self.uploader_last_name,
        });
        FileWithUploader {
            file: FileRecord {
                id: self.id,
                project_id: self.project_id,
                filename: self.filename,
                file_path: self.file_path,
                file_size: self.file_size,
                file_type: self.file_type,
                uploaded_by: self.uploaded_by,
                uploaded_at: self.uploaded_at,
            },
            uploader,
        }
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn project_by_id(&self, project_id: i64) -> Result<Option<Project>, StoreError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn projects_created_by(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE created_by = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn projects_with_membership(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Project, Role)>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRoleRow>(
            "SELECT p.*, m.role FROM project_members m \
             JOIN projects p ON p.id = m.project_id \
             WHERE m.user_id = $1 ORDER BY m.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProjectRoleRow::split).collect())
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, status, start_date, end_date, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(new.name)
        .bind(new.description)
        .bind(new.status)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update_project(
        &self,
        project_id: i64,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE projects SET updated_at = now()");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(start_date) = patch.start_date {
            qb.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = patch.end_date {
            qb.push(", end_date = ").push_bind(end_date);
        }
        qb.push(" WHERE id = ").push_bind(project_id);
        qb.push(" RETURNING *");

        let project = qb
            .build_query_as::<Project>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete_project(&self, project_id: i64) -> Result<(), StoreError> {
        // Related rows go with it (ON DELETE CASCADE)
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn membership(
        &self,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn memberships_with_users(
        &self,
        project_id: i64,
    ) -> Result<Vec<(Membership, Option<UserProfile>)>, StoreError> {
        let rows = sqlx::query_as::<_, MemberUserRow>(
            "SELECT m.id, m.project_id, m.user_id, m.role, m.created_at, \
                    u.email AS user_email, u.first_name AS user_first_name, \
                    u.last_name AS user_last_name \
             FROM project_members m LEFT JOIN users u ON u.id = m.user_id \
             WHERE m.project_id = $1 ORDER BY m.id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(MemberUserRow::split).collect())
    }

    async fn guest_members(&self, project_id: i64) -> Result<Vec<GuestMember>, StoreError> {
        let guests = sqlx::query_as::<_, GuestMember>(
            "SELECT * FROM guest_members WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(guests)
    }

    async fn guest_member_by_email(
        &self,
        project_id: i64,
        email: &str,
    ) -> Result<Option<GuestMember>, StoreError> {
        let guest = sqlx::query_as::<_, GuestMember>(
            "SELECT * FROM guest_members WHERE project_id = $1 AND email = $2",
        )
        .bind(project_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(guest)
    }

    async fn insert_guest_member(&self, new: NewGuestMember) -> Result<GuestMember, StoreError> {
        let guest = sqlx::query_as::<_, GuestMember>(
            "INSERT INTO guest_members (project_id, name, email, role) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(new.project_id)
        .bind(new.name)
        .bind(new.email)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(guest)
    }

    async fn update_guest_member_role(
        &self,
        project_id: i64,
        member_id: i64,
        role: Role,
    ) -> Result<Option<GuestMember>, StoreError> {
        let guest = sqlx::query_as::<_, GuestMember>(
            "UPDATE guest_members SET role = $3 WHERE project_id = $1 AND id = $2 RETURNING *",
        )
        .bind(project_id)
        .bind(member_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(guest)
    }

    async fn delete_guest_member(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM guest_members WHERE project_id = $1 AND id = $2")
            .bind(project_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn task_by_id(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn tasks_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<TaskWithAssignee>, StoreError> {
        let rows = sqlx::query_as::<_, TaskAssigneeRow>(
            "SELECT t.*, u.email AS assignee_email, u.first_name AS assignee_first_name, \
                    u.last_name AS assignee_last_name \
             FROM tasks t LEFT JOIN users u ON u.id = t.assigned_to \
             WHERE t.project_id = $1 ORDER BY t.id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(TaskAssigneeRow::into_task_with_assignee)
            .collect())
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<AssignedTask>, StoreError> {
        let rows = sqlx::query_as::<_, AssignedTaskRow>(
            "SELECT t.*, p.name AS project_name \
             FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE t.assigned_to = $1 ORDER BY t.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(AssignedTaskRow::into_assigned_task)
            .collect())
    }

    async fn insert_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (project_id, title, description, status, assigned_to, due_date, \
                                priority, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(new.project_id)
        .bind(new.title)
        .bind(new.description)
        .bind(new.status)
        .bind(new.assigned_to)
        .bind(new.due_date)
        .bind(new.priority)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = now()");
        if let Some(title) = patch.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(assigned_to) = patch.assigned_to {
            qb.push(", assigned_to = ").push_bind(assigned_to);
        }
        if let Some(due_date) = patch.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        if let Some(priority) = patch.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        qb.push(" WHERE id = ").push_bind(task_id);
        qb.push(" RETURNING *");

        let task = qb.build_query_as::<Task>().fetch_optional(&self.pool).await?;
        Ok(task)
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn file_by_id(&self, file_id: i64) -> Result<Option<FileRecord>, StoreError> {
        let file = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(file)
    }

    async fn files_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<FileWithUploader>, StoreError> {
        let rows = sqlx::query_as::<_, FileUploaderRow>(
            "SELECT f.*, u.email AS uploader_email, u.first_name AS uploader_first_name, \
                    u.last_name AS uploader_last_name \
             FROM files f LEFT JOIN users u ON u.id = f.uploaded_by \
             WHERE f.project_id = $1 ORDER BY f.uploaded_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(FileUploaderRow::into_file_with_uploader)
            .collect())
    }

    async fn insert_file(&self, new: NewFile) -> Result<FileRecord, StoreError> {
        let file = sqlx::query_as::<_, FileRecord>(
            "INSERT INTO files (project_id, filename, file_path, file_size, file_type, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(new.project_id)
        .bind(new.filename)
        .bind(new.file_path)
        .bind(new.file_size)
        .bind(new.file_type)
        .bind(new.uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(file)
    }

    async fn delete_file(&self, file_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
