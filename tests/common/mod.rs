#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use teamcamp_api::authz::Role;
use teamcamp_api::handlers;
use teamcamp_api::state::AppState;
use teamcamp_api::store::models::task::ProjectName;
use teamcamp_api::store::{
    AssignedTask, FileRecord, FileWithUploader, GuestMember, Membership, NewFile, NewGuestMember,
    NewProject, NewTask, Project, ProjectPatch, ResourceStore, StoreError, Task, TaskPatch,
    TaskWithAssignee, UserProfile,
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-not-for-production";

/// Make sure the config singleton sees a JWT secret before first access.
pub fn init_test_env() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        if std::env::var("SUPABASE_JWT_SECRET").is_err() {
            std::env::set_var("SUPABASE_JWT_SECRET", TEST_JWT_SECRET);
        }
    });
}

/// Mint a bearer token the way the hosted auth service would.
pub fn token_for(user_id: Uuid, email: &str) -> String {
    init_test_env();
    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": user_id,
        "email": email,
        "role": "authenticated",
        "aud": "authenticated",
        "user_metadata": { "full_name": "Test User" },
        "app_metadata": { "provider": "email" },
        "iat": now,
        "exp": now + 3600,
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode test token")
}

/// In-memory `ResourceStore` so tests run without a database. Mirrors the
/// Postgres implementation's semantics (ordering, cascades, patch rules).
pub struct MemStore {
    inner: Mutex<MemData>,
}

#[derive(Default)]
struct MemData {
    next_id: i64,
    users: HashMap<Uuid, UserProfile>,
    projects: BTreeMap<i64, Project>,
    memberships: Vec<Membership>,
    guests: Vec<GuestMember>,
    tasks: BTreeMap<i64, Task>,
    files: BTreeMap<i64, FileRecord>,
}

impl MemData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(MemData::default()),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemData> {
        self.inner.lock().expect("mem store poisoned")
    }

    pub fn add_user(&self, email: &str, first_name: &str, last_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().users.insert(
            id,
            UserProfile {
                id,
                email: email.to_string(),
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
            },
        );
        id
    }

    pub fn add_project(&self, name: &str, created_by: Uuid) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        let now = Utc::now();
        data.projects.insert(
            id,
            Project {
                id,
                name: name.to_string(),
                description: None,
                status: "active".to_string(),
                start_date: None,
                end_date: None,
                created_by,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn add_membership(&self, project_id: i64, user_id: Uuid, role: Role) {
        let mut data = self.lock();
        let id = data.next_id();
        data.memberships.push(Membership {
            id,
            project_id,
            user_id,
            role,
            created_at: Utc::now(),
        });
    }

    pub fn add_guest(&self, project_id: i64, name: &str, email: &str, role: Role) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        data.guests.push(GuestMember {
            id,
            project_id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_task(
        &self,
        project_id: i64,
        title: &str,
        created_by: Uuid,
        assigned_to: Option<Uuid>,
    ) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        let now = Utc::now();
        data.tasks.insert(
            id,
            Task {
                id,
                project_id,
                title: title.to_string(),
                description: String::new(),
                status: "todo".to_string(),
                assigned_to,
                due_date: None,
                priority: "medium".to_string(),
                created_by,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn add_file(&self, project_id: i64, filename: &str, uploaded_by: Uuid) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        data.files.insert(
            id,
            FileRecord {
                id,
                project_id,
                filename: filename.to_string(),
                file_path: format!("{}/{}", project_id, filename),
                file_size: 1024,
                file_type: "application/octet-stream".to_string(),
                uploaded_by,
                uploaded_at: Utc::now(),
            },
        );
        id
    }
}

#[async_trait]
impl ResourceStore for MemStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn project_by_id(&self, project_id: i64) -> Result<Option<Project>, StoreError> {
        Ok(self.lock().projects.get(&project_id).cloned())
    }

    async fn projects_created_by(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        Ok(self
            .lock()
            .projects
            .values()
            .filter(|p| p.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn projects_with_membership(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Project, Role)>, StoreError> {
        let data = self.lock();
        Ok(data
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                data.projects
                    .get(&m.project_id)
                    .map(|p| (p.clone(), m.role))
            })
            .collect())
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let mut data = self.lock();
        let id = data.next_id();
        let now = Utc::now();
        let project = Project {
            id,
            name: new.name,
            description: new.description,
            status: new.status,
            start_date: new.start_date,
            end_date: new.end_date,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        data.projects.insert(id, project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        project_id: i64,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, StoreError> {
        let mut data = self.lock();
        let Some(project) = data.projects.get_mut(&project_id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        if let Some(start_date) = patch.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            project.end_date = end_date;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, project_id: i64) -> Result<(), StoreError> {
        let mut data = self.lock();
        data.projects.remove(&project_id);
        data.memberships.retain(|m| m.project_id != project_id);
        data.guests.retain(|g| g.project_id != project_id);
        data.tasks.retain(|_, t| t.project_id != project_id);
        data.files.retain(|_, f| f.project_id != project_id);
        Ok(())
    }

    async fn membership(
        &self,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn memberships_with_users(
        &self,
        project_id: i64,
    ) -> Result<Vec<(Membership, Option<UserProfile>)>, StoreError> {
        let data = self.lock();
        Ok(data
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| (m.clone(), data.users.get(&m.user_id).cloned()))
            .collect())
    }

    async fn guest_members(&self, project_id: i64) -> Result<Vec<GuestMember>, StoreError> {
        Ok(self
            .lock()
            .guests
            .iter()
            .filter(|g| g.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn guest_member_by_email(
        &self,
        project_id: i64,
        email: &str,
    ) -> Result<Option<GuestMember>, StoreError> {
        Ok(self
            .lock()
            .guests
            .iter()
            .find(|g| g.project_id == project_id && g.email == email)
            .cloned())
    }

    async fn insert_guest_member(&self, new: NewGuestMember) -> Result<GuestMember, StoreError> {
        let mut data = self.lock();
        let id = data.next_id();
        let guest = GuestMember {
            id,
            project_id: new.project_id,
            name: new.name,
            email: new.email,
            role: new.role,
            created_at: Utc::now(),
        };
        data.guests.push(guest.clone());
        Ok(guest)
    }

    async fn update_guest_member_role(
        &self,
        project_id: i64,
        member_id: i64,
        role: Role,
    ) -> Result<Option<GuestMember>, StoreError> {
        let mut data = self.lock();
        for guest in data.guests.iter_mut() {
            if guest.id == member_id && guest.project_id == project_id {
                guest.role = role;
                return Ok(Some(guest.clone()));
            }
        }
        Ok(None)
    }

    async fn delete_guest_member(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> Result<(), StoreError> {
        self.lock()
            .guests
            .retain(|g| !(g.id == member_id && g.project_id == project_id));
        Ok(())
    }

    async fn task_by_id(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.lock().tasks.get(&task_id).cloned())
    }

    async fn tasks_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<TaskWithAssignee>, StoreError> {
        let data = self.lock();
        Ok(data
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .map(|t| TaskWithAssignee {
                task: t.clone(),
                assignee: t.assigned_to.and_then(|id| data.users.get(&id).cloned()),
            })
            .collect())
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<AssignedTask>, StoreError> {
        let data = self.lock();
        Ok(data
            .tasks
            .values()
            .filter(|t| t.assigned_to == Some(user_id))
            .filter_map(|t| {
                data.projects.get(&t.project_id).map(|p| AssignedTask {
                    task: t.clone(),
                    project: ProjectName {
                        name: p.name.clone(),
                    },
                })
            })
            .collect())
    }

    async fn insert_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let mut data = self.lock();
        let id = data.next_id();
        let now = Utc::now();
        let task = Task {
            id,
            project_id: new.project_id,
            title: new.title,
            description: new.description,
            status: new.status,
            assigned_to: new.assigned_to,
            due_date: new.due_date,
            priority: new.priority,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        data.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let mut data = self.lock();
        let Some(task) = data.tasks.get_mut(&task_id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(assigned_to) = patch.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), StoreError> {
        self.lock().tasks.remove(&task_id);
        Ok(())
    }

    async fn file_by_id(&self, file_id: i64) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.lock().files.get(&file_id).cloned())
    }

    async fn files_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<FileWithUploader>, StoreError> {
        let data = self.lock();
        let mut files: Vec<FileWithUploader> = data
            .files
            .values()
            .filter(|f| f.project_id == project_id)
            .map(|f| FileWithUploader {
                file: f.clone(),
                uploader: data.users.get(&f.uploaded_by).cloned(),
            })
            .collect();
        files.sort_by(|a, b| {
            b.file
                .uploaded_at
                .cmp(&a.file.uploaded_at)
                .then(b.file.id.cmp(&a.file.id))
        });
        Ok(files)
    }

    async fn insert_file(&self, new: NewFile) -> Result<FileRecord, StoreError> {
        let mut data = self.lock();
        let id = data.next_id();
        let file = FileRecord {
            id,
            project_id: new.project_id,
            filename: new.filename,
            file_path: new.file_path,
            file_size: new.file_size,
            file_type: new.file_type,
            uploaded_by: new.uploaded_by,
            uploaded_at: Utc::now(),
        };
        data.files.insert(id, file.clone());
        Ok(file)
    }

    async fn delete_file(&self, file_id: i64) -> Result<(), StoreError> {
        self.lock().files.remove(&file_id);
        Ok(())
    }
}

/// An in-process server on a free port, backed by a fresh `MemStore`.
pub struct TestApp {
    pub base_url: String,
    pub store: Arc<MemStore>,
    client: reqwest::Client,
}

pub async fn spawn_app() -> Result<TestApp> {
    init_test_env();

    let store = MemStore::new();
    let dyn_store: Arc<dyn ResourceStore> = store.clone();
    let state = AppState::new(dyn_store, None);
    let app = handlers::app(state);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    Ok(TestApp {
        base_url,
        store,
        client: reqwest::Client::new(),
    })
}

impl TestApp {
    pub async fn get(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    pub async fn post(
        &self,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn put(
        &self,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .put(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await?)
    }
}
