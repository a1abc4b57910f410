//! Domain types for abgabesystem.
//!
//! Remote handles mirror the JSON the hosting platform returns, so the
//! GitLab client can deserialize straight into them. They are never cached
//! beyond a single call chain.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Id newtypes
// ---------------------------------------------------------------------------

/// Numeric id of a group (namespace) on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for GroupId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Numeric id of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Numeric id of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Numeric id of a deploy key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployKeyId(pub u64);

impl fmt::Display for DeployKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Visibility of a group or project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Internal => write!(f, "internal"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

/// Membership role, encoded as the platform's numeric access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum AccessLevel {
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
    /// Any level without a named role (minimal access, admin, ...).
    Other(u32),
}

impl From<u32> for AccessLevel {
    fn from(level: u32) -> Self {
        match level {
            10 => AccessLevel::Guest,
            20 => AccessLevel::Reporter,
            30 => AccessLevel::Developer,
            40 => AccessLevel::Maintainer,
            50 => AccessLevel::Owner,
            other => AccessLevel::Other(other),
        }
    }
}

impl From<AccessLevel> for u32 {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Guest => 10,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
            AccessLevel::Other(other) => other,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Guest => write!(f, "guest"),
            AccessLevel::Reporter => write!(f, "reporter"),
            AccessLevel::Developer => write!(f, "developer"),
            AccessLevel::Maintainer => write!(f, "maintainer"),
            AccessLevel::Owner => write!(f, "owner"),
            AccessLevel::Other(level) => write!(f, "access level {level}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Remote handles
// ---------------------------------------------------------------------------

/// A group or subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGroup {
    pub id: GroupId,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub parent_id: Option<GroupId>,
}

/// A project (repository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProject {
    pub id: ProjectId,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    #[serde(default)]
    pub ssh_url_to_repo: String,
    #[serde(default)]
    pub http_url_to_repo: String,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: UserId,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A user's membership in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMember {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub access_level: AccessLevel,
}

/// An SSH deploy key attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployKey {
    pub id: DeployKeyId,
    pub title: String,
    pub key: String,
}

impl DeployKey {
    /// Compares key material, ignoring the trailing comment and whitespace.
    pub fn same_key(&self, key: &str) -> bool {
        key_material(&self.key) == key_material(key)
    }
}

/// `<type> <base64>` part of an OpenSSH public key line.
fn key_material(key: &str) -> Vec<&str> {
    key.split_whitespace().take(2).collect()
}

/// A repository tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Project settings changed after forking. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_registry_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,
}

impl ProjectSettings {
    /// Settings applied to every student fork: private, no registry, no LFS.
    pub fn student_fork() -> Self {
        Self {
            visibility: Some(Visibility::Private),
            container_registry_enabled: Some(false),
            lfs_enabled: Some(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Tutorial group labels that mean "not taking part in any tutorial".
const NON_PARTICIPATION: [&str; 3] = [
    "keine Teilnahme an den Übungen",
    "keiner Funktion oder Gruppe zugeordnet",
    "Gruppe",
];

/// One participant read from the roster export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub tutorial_group: String,
}

impl StudentRecord {
    /// Short tutorial group name: the leading token, e.g. `"3"` for
    /// `"3 Mittwoch 11:30"`. `None` for non-participation labels.
    pub fn tutorial_group_short(&self) -> Option<&str> {
        let group = self.tutorial_group.trim();
        if NON_PARTICIPATION.contains(&group) {
            return None;
        }
        group.split_whitespace().next()
    }

    /// Directory-service identity of the dummy account: `uid=<username>,<base>`.
    pub fn extern_uid(&self, ldap_base: &str) -> String {
        format!("uid={},{}", self.username, ldap_base)
    }
}
