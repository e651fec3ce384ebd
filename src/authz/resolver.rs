use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::store::{GuestMember, Membership, ResourceStore, UserProfile};

use super::{permits, Access, Action, AuthzError};

/// Resolves a principal's effective access on a project and gates actions
/// against the permission table. Stateless; every decision re-reads the
/// store.
#[derive(Clone)]
pub struct AccessResolver {
    store: Arc<dyn ResourceStore>,
}

impl AccessResolver {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Effective role of `user_id` on `project_id`.
    ///
    /// The creator is `owner` unconditionally and never requires a
    /// membership row; otherwise the unique membership row decides.
    /// `Ok(None)` means the project exists but grants the user nothing.
    pub async fn resolve_role(
        &self,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<Option<Access>, AuthzError> {
        let project = self
            .store
            .project_by_id(project_id)
            .await?
            .ok_or(AuthzError::NotFound)?;

        if project.created_by == user_id {
            return Ok(Some(Access::creator()));
        }

        let membership = self.store.membership(project_id, user_id).await?;
        Ok(membership.map(|m| Access::member(m.role)))
    }

    /// Check `action` for `user_id` on `project_id`, returning the resolved
    /// access on success.
    pub async fn authorize(
        &self,
        project_id: i64,
        user_id: Uuid,
        action: Action,
    ) -> Result<Access, AuthzError> {
        let access = self
            .resolve_role(project_id, user_id)
            .await?
            .ok_or(AuthzError::Denied)?;

        if permits(access, user_id, action) {
            Ok(access)
        } else {
            Err(AuthzError::Denied)
        }
    }

    /// Task-listing access check. Guest rows are keyed by email, and the
    /// fallback matches them against the principal id string.
    pub async fn authorize_task_view(
        &self,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<(), AuthzError> {
        match self.authorize(project_id, user_id, Action::ViewTasks).await {
            Ok(_) => Ok(()),
            Err(AuthzError::Denied) => {
                let guest = self
                    .store
                    .guest_member_by_email(project_id, &user_id.to_string())
                    .await?;
                if guest.is_some() {
                    Ok(())
                } else {
                    Err(AuthzError::Denied)
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Merged member listing: authenticated memberships first (row order),
    /// then guests under synthetic `guest_{id}` identifiers. Requires
    /// `ViewMembers`.
    pub async fn resolve_members(
        &self,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<Vec<MemberEntry>, AuthzError> {
        self.authorize(project_id, user_id, Action::ViewMembers)
            .await?;

        let mut entries = Vec::new();
        for (membership, profile) in self.store.memberships_with_users(project_id).await? {
            entries.push(MemberEntry::auth(membership, profile));
        }
        for guest in self.store.guest_members(project_id).await? {
            entries.push(MemberEntry::guest(guest));
        }
        Ok(entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Auth,
    Guest,
}

/// One row of the merged member listing.
#[derive(Debug, Clone, Serialize)]
pub struct MemberEntry {
    pub id: i64,
    pub user_id: String,
    pub role: super::Role,
    #[serde(rename = "type")]
    pub kind: MemberKind,
    pub user: MemberProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MemberProfile {
    Auth {
        id: Uuid,
        email: String,
        first_name: Option<String>,
        last_name: Option<String>,
    },
    Guest {
        name: String,
        email: String,
    },
    Empty {},
}

impl MemberEntry {
    fn auth(membership: Membership, profile: Option<UserProfile>) -> Self {
        let user = match profile {
            Some(p) => MemberProfile::Auth {
                id: p.id,
                email: p.email,
                first_name: p.first_name,
                last_name: p.last_name,
            },
            None => MemberProfile::Empty {},
        };
        MemberEntry {
            id: membership.id,
            user_id: membership.user_id.to_string(),
            role: membership.role,
            kind: MemberKind::Auth,
            user,
        }
    }

    fn guest(guest: GuestMember) -> Self {
        MemberEntry {
            // Synthetic id; cannot collide with a real user id
            id: guest.id,
            user_id: format!("guest_{}", guest.id),
            role: guest.role,
            kind: MemberKind::Guest,
            user: MemberProfile::Guest {
                name: guest.name,
                email: guest.email,
            },
        }
    }
}
