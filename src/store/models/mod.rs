pub mod file;
pub mod member;
pub mod project;
pub mod task;
pub mod user;

pub use file::{FileRecord, FileWithUploader, NewFile};
pub use member::{GuestMember, Membership, NewGuestMember};
pub use project::{NewProject, Project, ProjectPatch, ProjectSummary};
pub use task::{AssignedTask, NewTask, Task, TaskPatch, TaskWithAssignee};
pub use user::UserProfile;

/// Deserialize a field that distinguishes "absent" from "explicitly null":
/// absent stays `None`, `null` becomes `Some(None)`, a value `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}
