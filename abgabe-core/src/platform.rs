//! Capability surface of the remote hosting platform.
//!
//! Everything that touches remote state goes through [`Platform`]. It is
//! passed around as `&dyn Platform` so orchestration code can run against the
//! GitLab client in production and an in-memory fake in tests.
//!
//! Searches are substring searches and may return zero, one or many results.
//! Creation may fail with [`PlatformError::Conflict`] when the object exists.

use serde::Serialize;
use thiserror::Error;

use crate::types::{
    AccessLevel, DeployKey, DeployKeyId, GroupId, ProjectId, ProjectSettings, RemoteGroup,
    RemoteMember, RemoteProject, RemoteUser, Tag, UserId, Visibility,
};

/// Errors reported by a [`Platform`] implementation.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The addressed object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Creation collided with an existing object.
    #[error("already exists: {0}")]
    Conflict(String),

    /// Any other error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl PlatformError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, PlatformError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }
}

// ---------------------------------------------------------------------------
// Creation payloads
// ---------------------------------------------------------------------------

/// Attributes of a group to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGroup {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<GroupId>,
    pub visibility: Visibility,
}

/// Attributes of a project to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProject {
    pub name: String,
    pub namespace_id: GroupId,
    pub visibility: Visibility,
}

/// Attributes of an account to create. Requires admin privileges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: String,
    pub provider: String,
    pub extern_uid: String,
    pub password: String,
    pub skip_confirmation: bool,
}

/// One file operation of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitAction {
    pub action: &'static str,
    pub file_path: String,
    pub content: String,
}

impl CommitAction {
    pub fn create(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: "create",
            file_path: file_path.into(),
            content: content.into(),
        }
    }
}

/// A commit made through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommit {
    pub branch: String,
    pub commit_message: String,
    pub actions: Vec<CommitAction>,
}

/// A tag to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTag {
    pub tag_name: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Operations consumed from the hosting platform.
pub trait Platform {
    // groups
    /// Search top-level groups (`parent == None`) or subgroups of `parent`.
    fn search_groups(
        &self,
        parent: Option<GroupId>,
        search: &str,
    ) -> Result<Vec<RemoteGroup>, PlatformError>;
    fn create_group(&self, group: &NewGroup) -> Result<RemoteGroup, PlatformError>;
    fn list_group_members(&self, group: GroupId) -> Result<Vec<RemoteMember>, PlatformError>;
    fn add_group_member(
        &self,
        group: GroupId,
        user: UserId,
        access_level: AccessLevel,
    ) -> Result<RemoteMember, PlatformError>;

    // projects
    fn search_group_projects(
        &self,
        group: GroupId,
        search: &str,
    ) -> Result<Vec<RemoteProject>, PlatformError>;
    fn get_project(&self, id: ProjectId) -> Result<RemoteProject, PlatformError>;
    /// Look up a project by its full path, e.g. `course/solutions/m.hans/solutions`.
    fn find_project_by_path(&self, path: &str) -> Result<Option<RemoteProject>, PlatformError>;
    fn create_project(&self, project: &NewProject) -> Result<RemoteProject, PlatformError>;
    fn create_commit(&self, project: ProjectId, commit: &NewCommit) -> Result<(), PlatformError>;
    /// Whether `branch` exists; an empty repository has no branches.
    fn branch_exists(&self, project: ProjectId, branch: &str) -> Result<bool, PlatformError>;
    fn fork_project(
        &self,
        project: ProjectId,
        namespace: GroupId,
    ) -> Result<RemoteProject, PlatformError>;
    fn list_forks(&self, project: ProjectId) -> Result<Vec<RemoteProject>, PlatformError>;
    fn update_project(
        &self,
        project: ProjectId,
        settings: &ProjectSettings,
    ) -> Result<(), PlatformError>;

    // users
    fn search_users(&self, search: &str) -> Result<Vec<RemoteUser>, PlatformError>;
    fn create_user(&self, user: &NewUser) -> Result<RemoteUser, PlatformError>;
    fn set_user_attribute(&self, user: UserId, key: &str, value: &str)
        -> Result<(), PlatformError>;

    // deploy keys
    fn list_deploy_keys(&self, project: ProjectId) -> Result<Vec<DeployKey>, PlatformError>;
    fn create_deploy_key(
        &self,
        project: ProjectId,
        title: &str,
        key: &str,
    ) -> Result<DeployKey, PlatformError>;
    fn enable_deploy_key(&self, project: ProjectId, key: DeployKeyId)
        -> Result<(), PlatformError>;

    // tags
    fn create_tag(&self, project: ProjectId, tag: &NewTag) -> Result<Tag, PlatformError>;
}
