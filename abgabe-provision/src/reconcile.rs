//! Find-or-create reconciliation.
//!
//! The platform has no atomic "create if missing". [`reconcile`] converges
//! towards a desired object in three steps:
//!
//! 1. Search by key and return the first exact match ([`Reconciled::Existing`]).
//! 2. Otherwise create it ([`Reconciled::Created`]).
//! 3. If creation fails (typically because a concurrent run created the
//!    object in between), search again and adopt an exact match
//!    ([`Reconciled::Adopted`]). Nothing is retried.
//!
//! A search that returns objects, none of which match exactly, is reported
//! as [`Lookup::Mismatch`] instead of being mistaken for a hit.

use std::fmt;

use abgabe_core::{
    types::{
        AccessLevel, DeployKey, GroupId, ProjectId, RemoteGroup, RemoteMember, RemoteProject,
        RemoteUser, UserId, Visibility,
    },
    NewGroup, NewProject, NewUser, Platform, PlatformError,
};

use crate::error::ReconcileError;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Kind of remote object being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Group,
    Project,
    User,
    Membership,
    Fork,
    DeployKey,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Group => write!(f, "group"),
            ResourceKind::Project => write!(f, "project"),
            ResourceKind::User => write!(f, "user"),
            ResourceKind::Membership => write!(f, "membership"),
            ResourceKind::Fork => write!(f, "fork"),
            ResourceKind::DeployKey => write!(f, "deploy key"),
        }
    }
}

/// Result of the search step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<H> {
    /// An object with exactly the wanted name/identity.
    Exact(H),
    /// The search returned nothing.
    Absent,
    /// The search returned objects, none matching exactly. Holds their names.
    Mismatch(Vec<String>),
}

/// How a reconciled handle was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled<H> {
    Existing(H),
    Created(H),
    /// Creation failed but a concurrently created object was found.
    Adopted(H),
}

impl<H> Reconciled<H> {
    pub fn handle(&self) -> &H {
        match self {
            Reconciled::Existing(h) | Reconciled::Created(h) | Reconciled::Adopted(h) => h,
        }
    }

    pub fn into_handle(self) -> H {
        match self {
            Reconciled::Existing(h) | Reconciled::Created(h) | Reconciled::Adopted(h) => h,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Reconciled::Created(_))
    }

    /// Lower-case word for reports: `existing`, `created`, `adopted`.
    pub fn verb(&self) -> &'static str {
        match self {
            Reconciled::Existing(_) => "existing",
            Reconciled::Created(_) => "created",
            Reconciled::Adopted(_) => "adopted",
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcilable
// ---------------------------------------------------------------------------

/// A desired remote object: how to search for it, recognise it, create it.
pub trait Reconcilable {
    type Handle: Clone;

    const KIND: ResourceKind;

    /// Search key, also used in logs and errors.
    fn key(&self) -> &str;

    fn search(&self, platform: &dyn Platform) -> Result<Vec<Self::Handle>, PlatformError>;

    /// Whether a search result is exactly the desired object.
    fn matches(&self, candidate: &Self::Handle) -> bool;

    /// Human readable name of a search result, for mismatch reports.
    fn label(candidate: &Self::Handle) -> String;

    fn create(&self, platform: &dyn Platform) -> Result<Self::Handle, PlatformError>;
}

/// Search for `desired` without creating anything.
pub fn find_exact<R: Reconcilable>(
    platform: &dyn Platform,
    desired: &R,
) -> Result<Lookup<R::Handle>, ReconcileError> {
    let candidates = desired
        .search(platform)
        .map_err(|source| platform_error(desired, source))?;

    if let Some(hit) = candidates.iter().find(|c| desired.matches(c)) {
        return Ok(Lookup::Exact(hit.clone()));
    }
    if candidates.is_empty() {
        return Ok(Lookup::Absent);
    }
    Ok(Lookup::Mismatch(candidates.iter().map(R::label).collect()))
}

/// Find `desired` or fail with a named error. Never creates.
pub fn require<R: Reconcilable>(
    platform: &dyn Platform,
    desired: &R,
) -> Result<R::Handle, ReconcileError> {
    match find_exact(platform, desired)? {
        Lookup::Exact(handle) => Ok(handle),
        Lookup::Absent => Err(ReconcileError::MissingPrerequisite {
            kind: R::KIND,
            key: desired.key().to_string(),
        }),
        Lookup::Mismatch(found) => Err(ReconcileError::NameMismatch {
            kind: R::KIND,
            key: desired.key().to_string(),
            found,
        }),
    }
}

/// Converge on `desired`: return the existing object or create it.
pub fn reconcile<R: Reconcilable>(
    platform: &dyn Platform,
    desired: &R,
) -> Result<Reconciled<R::Handle>, ReconcileError> {
    let kind = R::KIND;
    let key = desired.key();

    match find_exact(platform, desired)? {
        Lookup::Exact(handle) => {
            tracing::debug!(%kind, key, "already exists");
            return Ok(Reconciled::Existing(handle));
        }
        Lookup::Mismatch(found) => {
            tracing::warn!(%kind, key, ?found, "search matched only other names; creating");
        }
        Lookup::Absent => {}
    }

    let create_err = match desired.create(platform) {
        Ok(handle) => {
            tracing::info!(%kind, key, "created");
            return Ok(Reconciled::Created(handle));
        }
        Err(err) => err,
    };

    tracing::warn!(%kind, key, error = %create_err, "creation failed; searching again");
    match find_exact(platform, desired)? {
        Lookup::Exact(handle) => {
            tracing::info!(%kind, key, "adopted concurrently created object");
            Ok(Reconciled::Adopted(handle))
        }
        Lookup::Mismatch(found) if create_err.is_conflict() => Err(ReconcileError::NameMismatch {
            kind,
            key: key.to_string(),
            found,
        }),
        _ => Err(platform_error(desired, create_err)),
    }
}

fn platform_error<R: Reconcilable>(desired: &R, source: PlatformError) -> ReconcileError {
    ReconcileError::Platform {
        kind: R::KIND,
        key: desired.key().to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A top-level group or a subgroup, matched by name within its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub path: String,
    pub parent: Option<GroupId>,
    pub visibility: Visibility,
}

impl GroupSpec {
    /// Top-level group. The path is the lower-cased name, spaces as `_`.
    pub fn top_level(name: &str, visibility: Visibility) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_lowercase().replace(' ', "_"),
            parent: None,
            visibility,
        }
    }

    /// Subgroup of `parent` whose path equals its name.
    pub fn subgroup(name: &str, parent: &RemoteGroup, visibility: Visibility) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            parent: Some(parent.id),
            visibility,
        }
    }
}

impl Reconcilable for GroupSpec {
    type Handle = RemoteGroup;
    const KIND: ResourceKind = ResourceKind::Group;

    fn key(&self) -> &str {
        &self.name
    }

    fn search(&self, platform: &dyn Platform) -> Result<Vec<RemoteGroup>, PlatformError> {
        platform.search_groups(self.parent, &self.name)
    }

    fn matches(&self, candidate: &RemoteGroup) -> bool {
        candidate.name == self.name
    }

    fn label(candidate: &RemoteGroup) -> String {
        candidate.name.clone()
    }

    fn create(&self, platform: &dyn Platform) -> Result<RemoteGroup, PlatformError> {
        platform.create_group(&NewGroup {
            name: self.name.clone(),
            path: self.path.clone(),
            parent_id: self.parent,
            visibility: self.visibility,
        })
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// A project inside a group, matched by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub name: String,
    pub namespace: GroupId,
    pub visibility: Visibility,
}

impl Reconcilable for ProjectSpec {
    type Handle = RemoteProject;
    const KIND: ResourceKind = ResourceKind::Project;

    fn key(&self) -> &str {
        &self.name
    }

    fn search(&self, platform: &dyn Platform) -> Result<Vec<RemoteProject>, PlatformError> {
        platform.search_group_projects(self.namespace, &self.name)
    }

    fn matches(&self, candidate: &RemoteProject) -> bool {
        candidate.name == self.name
    }

    fn label(candidate: &RemoteProject) -> String {
        candidate.path_with_namespace.clone()
    }

    fn create(&self, platform: &dyn Platform) -> Result<RemoteProject, PlatformError> {
        platform.create_project(&NewProject {
            name: self.name.clone(),
            namespace_id: self.namespace,
            visibility: self.visibility,
        })
    }
}

/// A fork of `reference` living in `namespace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSpec {
    pub reference: RemoteProject,
    pub namespace: GroupId,
}

impl Reconcilable for ForkSpec {
    type Handle = RemoteProject;
    const KIND: ResourceKind = ResourceKind::Fork;

    fn key(&self) -> &str {
        &self.reference.name
    }

    fn search(&self, platform: &dyn Platform) -> Result<Vec<RemoteProject>, PlatformError> {
        platform.search_group_projects(self.namespace, &self.reference.name)
    }

    fn matches(&self, candidate: &RemoteProject) -> bool {
        candidate.name == self.reference.name
    }

    fn label(candidate: &RemoteProject) -> String {
        candidate.path_with_namespace.clone()
    }

    fn create(&self, platform: &dyn Platform) -> Result<RemoteProject, PlatformError> {
        platform.fork_project(self.reference.id, self.namespace)
    }
}

// ---------------------------------------------------------------------------
// Users and memberships
// ---------------------------------------------------------------------------

/// An account, matched by username. Usernames are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub user: NewUser,
}

impl Reconcilable for UserSpec {
    type Handle = RemoteUser;
    const KIND: ResourceKind = ResourceKind::User;

    fn key(&self) -> &str {
        &self.user.username
    }

    fn search(&self, platform: &dyn Platform) -> Result<Vec<RemoteUser>, PlatformError> {
        platform.search_users(&self.user.username)
    }

    fn matches(&self, candidate: &RemoteUser) -> bool {
        candidate.username.eq_ignore_ascii_case(&self.user.username)
    }

    fn label(candidate: &RemoteUser) -> String {
        candidate.username.clone()
    }

    fn create(&self, platform: &dyn Platform) -> Result<RemoteUser, PlatformError> {
        platform.create_user(&self.user)
    }
}

/// Direct membership of a user in a group. An existing membership is kept
/// regardless of its access level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSpec {
    pub group: GroupId,
    pub user: UserId,
    pub username: String,
    pub access_level: AccessLevel,
}

impl MembershipSpec {
    pub fn new(group: GroupId, user: &RemoteUser, access_level: AccessLevel) -> Self {
        Self {
            group,
            user: user.id,
            username: user.username.clone(),
            access_level,
        }
    }
}

impl Reconcilable for MembershipSpec {
    type Handle = RemoteMember;
    const KIND: ResourceKind = ResourceKind::Membership;

    fn key(&self) -> &str {
        &self.username
    }

    fn search(&self, platform: &dyn Platform) -> Result<Vec<RemoteMember>, PlatformError> {
        platform.list_group_members(self.group)
    }

    fn matches(&self, candidate: &RemoteMember) -> bool {
        candidate.id == self.user
    }

    fn label(candidate: &RemoteMember) -> String {
        candidate.username.clone()
    }

    fn create(&self, platform: &dyn Platform) -> Result<RemoteMember, PlatformError> {
        platform.add_group_member(self.group, self.user, self.access_level)
    }
}

// ---------------------------------------------------------------------------
// Deploy keys
// ---------------------------------------------------------------------------

/// A deploy key on a project, matched by key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployKeySpec {
    pub project: ProjectId,
    pub title: String,
    pub key: String,
}

impl Reconcilable for DeployKeySpec {
    type Handle = DeployKey;
    const KIND: ResourceKind = ResourceKind::DeployKey;

    fn key(&self) -> &str {
        &self.title
    }

    fn search(&self, platform: &dyn Platform) -> Result<Vec<DeployKey>, PlatformError> {
        platform.list_deploy_keys(self.project)
    }

    fn matches(&self, candidate: &DeployKey) -> bool {
        candidate.same_key(&self.key)
    }

    fn label(candidate: &DeployKey) -> String {
        candidate.title.clone()
    }

    fn create(&self, platform: &dyn Platform) -> Result<DeployKey, PlatformError> {
        platform.create_deploy_key(self.project, &self.title, self.key.trim())
    }
}
