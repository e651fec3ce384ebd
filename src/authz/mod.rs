//! Authorization model for project-scoped resources.
//!
//! Every handler resolves the acting user's effective access on the owning
//! project through [`AccessResolver`] and checks the requested [`Action`]
//! against one permission table. Decisions are recomputed from the store on
//! every call; nothing is cached between requests.

mod resolver;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

pub use resolver::{AccessResolver, MemberEntry, MemberKind, MemberProfile};

/// Membership role, ordered owner > admin > member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Role::Owner => 3,
            Role::Admin => 2,
            Role::Member => 1,
        }
    }

    pub fn at_least(self, other: Role) -> bool {
        self.rank() >= other.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(()),
        }
    }
}

/// Effective access of a user on a project.
///
/// `is_creator` is tracked separately from the role: a membership row may
/// grant `owner` without its holder being the project creator, and project
/// deletion is reserved for the creator alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub role: Role,
    pub is_creator: bool,
}

impl Access {
    pub fn creator() -> Self {
        Access {
            role: Role::Owner,
            is_creator: true,
        }
    }

    pub fn member(role: Role) -> Self {
        Access {
            role,
            is_creator: false,
        }
    }
}

/// Actions checked against the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewProject,
    EditProject,
    DeleteProject,
    ViewTasks,
    CreateTask,
    EditTask,
    DeleteTask,
    ViewFiles,
    UploadFile,
    /// Carries the uploader so the three independent grants (project
    /// creator, uploader, admin or above) are checked in one place.
    DeleteFile {
        uploaded_by: Uuid,
    },
    ViewMembers,
    AddMember,
    RemoveMember,
    EditMemberRole,
}

/// The permission table. `access` is the already-resolved access of
/// `user_id` on the owning project, so any role passes the baseline checks.
pub fn permits(access: Access, user_id: Uuid, action: Action) -> bool {
    use Action::*;

    match action {
        ViewProject | ViewTasks | ViewFiles | ViewMembers => true,
        CreateTask | EditTask | UploadFile => true,
        // Any member may delete any task (collaborative deletion)
        DeleteTask => true,
        EditProject | AddMember | RemoveMember | EditMemberRole => access.role.at_least(Role::Admin),
        DeleteProject => access.is_creator,
        DeleteFile { uploaded_by } => {
            access.is_creator || uploaded_by == user_id || access.role.at_least(Role::Admin)
        }
    }
}

/// Outcome taxonomy of an authorization check. `NotFound` and `Denied` are
/// expected outcomes (404/403); only `Store` is an infrastructure failure.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Project not found")]
    NotFound,

    #[error("Insufficient permissions")]
    Denied,

    #[error(transparent)]
    Store(#[from] StoreError),
}
