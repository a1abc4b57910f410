//! In-memory platform and recording command runner shared by the
//! integration tests.
//!
//! `FakePlatform` behaves like the real instance where it matters:
//! searches are case-insensitive substring matches, creating something that
//! exists fails with `PlatformError::Conflict`, and every creation is
//! counted. It can also simulate another run creating an object between our
//! search and our create.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use abgabe_core::{
    types::{
        AccessLevel, DeployKey, DeployKeyId, GroupId, ProjectId, ProjectSettings, RemoteGroup,
        RemoteMember, RemoteProject, RemoteUser, StudentRecord, Tag, UserId,
    },
    NewCommit, NewGroup, NewProject, NewTag, NewUser, Platform, PlatformError,
};
use abgabe_provision::process::{CommandOutput, CommandRunner, CommandSpec};
use abgabe_provision::ProcessError;

// ---------------------------------------------------------------------------
// FakePlatform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredProject {
    project: RemoteProject,
    namespace: GroupId,
    forked_from: Option<ProjectId>,
}

#[derive(Debug, Clone)]
struct StoredKey {
    project: ProjectId,
    key: DeployKey,
    enabled: bool,
}

#[derive(Default)]
struct State {
    next_id: u64,
    groups: Vec<RemoteGroup>,
    projects: Vec<StoredProject>,
    users: Vec<RemoteUser>,
    passwords: HashMap<UserId, String>,
    extern_uids: HashMap<UserId, String>,
    attributes: HashMap<(UserId, String), String>,
    members: Vec<(GroupId, RemoteMember)>,
    keys: Vec<StoredKey>,
    tags: Vec<(ProjectId, Tag)>,
    commits: Vec<(ProjectId, NewCommit)>,
    settings: HashMap<ProjectId, ProjectSettings>,
    creations: HashMap<&'static str, usize>,
    races: HashSet<String>,
    failures: HashMap<String, String>,
    commit_failure: Option<String>,
}

impl State {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn count(&mut self, kind: &'static str) {
        *self.creations.entry(kind).or_default() += 1;
    }

    /// Injected failure or race for an object named `name`.
    ///
    /// `Some(Err)` aborts the creation; `Some(Ok)` means the object is
    /// inserted but the call reports a conflict.
    fn injected(&mut self, name: &str) -> Option<Result<(), PlatformError>> {
        if let Some(message) = self.failures.get(name) {
            return Some(Err(PlatformError::Api {
                status: 500,
                message: message.clone(),
            }));
        }
        if self.races.remove(name) {
            return Some(Ok(()));
        }
        None
    }

    fn group(&self, id: GroupId) -> Option<&RemoteGroup> {
        self.groups.iter().find(|g| g.id == id)
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn conflict(what: &str) -> PlatformError {
    PlatformError::Conflict(format!("{what} has already been taken"))
}

fn concurrent(what: &str) -> PlatformError {
    PlatformError::Conflict(format!("{what} was created concurrently"))
}

/// In-memory [`Platform`].
#[derive(Default)]
pub struct FakePlatform {
    state: RefCell<State>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding ------------------------------------------------------------

    pub fn seed_group(&self, name: &str, parent: Option<&RemoteGroup>) -> RemoteGroup {
        let mut state = self.state.borrow_mut();
        let id = GroupId(state.id());
        let path = name.to_lowercase().replace(' ', "_");
        let full_path = match parent {
            Some(p) => format!("{}/{}", p.full_path, path),
            None => path.clone(),
        };
        let group = RemoteGroup {
            id,
            name: name.to_string(),
            path,
            full_path,
            parent_id: parent.map(|p| p.id),
        };
        state.groups.push(group.clone());
        group
    }

    pub fn seed_project(&self, name: &str, namespace: &RemoteGroup) -> RemoteProject {
        let mut state = self.state.borrow_mut();
        insert_project(&mut state, name, namespace.id, None)
    }

    pub fn seed_fork(&self, reference: &RemoteProject, namespace: &RemoteGroup) -> RemoteProject {
        let mut state = self.state.borrow_mut();
        insert_project(&mut state, &reference.name, namespace.id, Some(reference.id))
    }

    pub fn seed_user(&self, username: &str) -> RemoteUser {
        let mut state = self.state.borrow_mut();
        let user = RemoteUser {
            id: UserId(state.id()),
            username: username.to_string(),
            name: username.to_string(),
            email: Some(format!("{username}@x.de")),
        };
        state.users.push(user.clone());
        user
    }

    pub fn seed_member(&self, group: &RemoteGroup, user: &RemoteUser, level: AccessLevel) {
        self.state.borrow_mut().members.push((
            group.id,
            RemoteMember {
                id: user.id,
                username: user.username.clone(),
                name: user.name.clone(),
                access_level: level,
            },
        ));
    }

    pub fn seed_tag(&self, project: &RemoteProject, name: &str) {
        self.state.borrow_mut().tags.push((
            project.id,
            Tag {
                name: name.to_string(),
                target: None,
                message: None,
            },
        ));
    }

    // -- injection ----------------------------------------------------------

    /// The next creation of an object named `name` loses a race: the object
    /// appears, but the call fails with a conflict.
    pub fn simulate_concurrent_creation(&self, name: &str) {
        self.state.borrow_mut().races.insert(name.to_string());
    }

    /// Every creation of an object named `name` fails with HTTP 500.
    pub fn fail_creation(&self, name: &str, message: &str) {
        self.state
            .borrow_mut()
            .failures
            .insert(name.to_string(), message.to_string());
    }

    /// The next commit fails with HTTP 500; later commits succeed.
    pub fn fail_next_commit(&self, message: &str) {
        self.state.borrow_mut().commit_failure = Some(message.to_string());
    }

    // -- inspection ---------------------------------------------------------

    /// Number of successful or raced creation calls of `kind`
    /// (`group`, `project`, `fork`, `user`, `member`, `deploy_key`, `tag`).
    pub fn creations(&self, kind: &str) -> usize {
        self.state
            .borrow()
            .creations
            .get(kind)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_creations(&self) -> usize {
        self.state.borrow().creations.values().sum()
    }

    pub fn groups_named(&self, name: &str) -> Vec<RemoteGroup> {
        self.state
            .borrow()
            .groups
            .iter()
            .filter(|g| g.name == name)
            .cloned()
            .collect()
    }

    pub fn users_named(&self, username: &str) -> Vec<RemoteUser> {
        self.state
            .borrow()
            .users
            .iter()
            .filter(|u| u.username == username)
            .cloned()
            .collect()
    }

    pub fn extern_uid(&self, user: UserId) -> Option<String> {
        self.state.borrow().extern_uids.get(&user).cloned()
    }

    pub fn password(&self, user: UserId) -> Option<String> {
        self.state.borrow().passwords.get(&user).cloned()
    }

    pub fn attribute(&self, user: UserId, key: &str) -> Option<String> {
        self.state
            .borrow()
            .attributes
            .get(&(user, key.to_string()))
            .cloned()
    }

    pub fn members_of(&self, group: GroupId) -> Vec<RemoteMember> {
        self.state
            .borrow()
            .members
            .iter()
            .filter(|(g, _)| *g == group)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn forks_of(&self, project: ProjectId) -> Vec<RemoteProject> {
        self.state
            .borrow()
            .projects
            .iter()
            .filter(|p| p.forked_from == Some(project))
            .map(|p| p.project.clone())
            .collect()
    }

    pub fn projects_in(&self, group: GroupId) -> Vec<RemoteProject> {
        self.state
            .borrow()
            .projects
            .iter()
            .filter(|p| p.namespace == group)
            .map(|p| p.project.clone())
            .collect()
    }

    pub fn tags_of(&self, project: ProjectId) -> Vec<String> {
        self.state
            .borrow()
            .tags
            .iter()
            .filter(|(p, _)| *p == project)
            .map(|(_, t)| t.name.clone())
            .collect()
    }

    pub fn commits_of(&self, project: ProjectId) -> Vec<NewCommit> {
        self.state
            .borrow()
            .commits
            .iter()
            .filter(|(p, _)| *p == project)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn settings_of(&self, project: ProjectId) -> Option<ProjectSettings> {
        self.state.borrow().settings.get(&project).cloned()
    }

    /// `(key, enabled)` pairs of a project.
    pub fn deploy_keys_of(&self, project: ProjectId) -> Vec<(String, bool)> {
        self.state
            .borrow()
            .keys
            .iter()
            .filter(|k| k.project == project)
            .map(|k| (k.key.key.clone(), k.enabled))
            .collect()
    }
}

fn insert_project(
    state: &mut State,
    name: &str,
    namespace: GroupId,
    forked_from: Option<ProjectId>,
) -> RemoteProject {
    let id = ProjectId(state.id());
    let group_path = state
        .group(namespace)
        .map(|g| g.full_path.clone())
        .unwrap_or_default();
    let path = name.to_lowercase().replace(' ', "-");
    let path_with_namespace = format!("{group_path}/{path}");
    let project = RemoteProject {
        id,
        name: name.to_string(),
        path,
        ssh_url_to_repo: format!("git@fake.example:{path_with_namespace}.git"),
        http_url_to_repo: format!("https://fake.example/{path_with_namespace}.git"),
        path_with_namespace,
    };
    state.projects.push(StoredProject {
        project: project.clone(),
        namespace,
        forked_from,
    });
    project
}

impl Platform for FakePlatform {
    fn search_groups(
        &self,
        parent: Option<GroupId>,
        search: &str,
    ) -> Result<Vec<RemoteGroup>, PlatformError> {
        Ok(self
            .state
            .borrow()
            .groups
            .iter()
            .filter(|g| g.parent_id == parent)
            .filter(|g| contains(&g.name, search) || contains(&g.path, search))
            .cloned()
            .collect())
    }

    fn create_group(&self, group: &NewGroup) -> Result<RemoteGroup, PlatformError> {
        let raced = match self.state.borrow_mut().injected(&group.name) {
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => true,
            None => false,
        };
        let taken = self
            .state
            .borrow()
            .groups
            .iter()
            .any(|g| g.parent_id == group.parent_id && g.path == group.path);
        if taken {
            return Err(conflict("path"));
        }
        let parent = group
            .parent_id
            .and_then(|id| self.state.borrow().group(id).cloned());
        let created = self.seed_group(&group.name, parent.as_ref());
        self.state.borrow_mut().count("group");
        if raced {
            return Err(concurrent(&group.name));
        }
        Ok(created)
    }

    fn list_group_members(&self, group: GroupId) -> Result<Vec<RemoteMember>, PlatformError> {
        if self.state.borrow().group(group).is_none() {
            return Err(PlatformError::NotFound("404 Group Not Found".into()));
        }
        Ok(self.members_of(group))
    }

    fn add_group_member(
        &self,
        group: GroupId,
        user: UserId,
        access_level: AccessLevel,
    ) -> Result<RemoteMember, PlatformError> {
        let mut state = self.state.borrow_mut();
        if state.members.iter().any(|(g, m)| *g == group && m.id == user) {
            return Err(PlatformError::Conflict("Member already exists".into()));
        }
        let account = state
            .users
            .iter()
            .find(|u| u.id == user)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound("404 User Not Found".into()))?;
        let member = RemoteMember {
            id: account.id,
            username: account.username,
            name: account.name,
            access_level,
        };
        state.members.push((group, member.clone()));
        state.count("member");
        Ok(member)
    }

    fn search_group_projects(
        &self,
        group: GroupId,
        search: &str,
    ) -> Result<Vec<RemoteProject>, PlatformError> {
        Ok(self
            .projects_in(group)
            .into_iter()
            .filter(|p| contains(&p.name, search))
            .collect())
    }

    fn get_project(&self, id: ProjectId) -> Result<RemoteProject, PlatformError> {
        self.state
            .borrow()
            .projects
            .iter()
            .find(|p| p.project.id == id)
            .map(|p| p.project.clone())
            .ok_or_else(|| PlatformError::NotFound("404 Project Not Found".into()))
    }

    fn find_project_by_path(&self, path: &str) -> Result<Option<RemoteProject>, PlatformError> {
        Ok(self
            .state
            .borrow()
            .projects
            .iter()
            .find(|p| p.project.path_with_namespace == path)
            .map(|p| p.project.clone()))
    }

    fn create_project(&self, project: &NewProject) -> Result<RemoteProject, PlatformError> {
        let raced = match self.state.borrow_mut().injected(&project.name) {
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => true,
            None => false,
        };
        if self
            .projects_in(project.namespace_id)
            .iter()
            .any(|p| p.name == project.name)
        {
            return Err(conflict("name"));
        }
        let mut state = self.state.borrow_mut();
        let created = insert_project(&mut state, &project.name, project.namespace_id, None);
        state.count("project");
        if raced {
            return Err(concurrent(&project.name));
        }
        Ok(created)
    }

    fn create_commit(&self, project: ProjectId, commit: &NewCommit) -> Result<(), PlatformError> {
        self.get_project(project)?;
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.commit_failure.take() {
            return Err(PlatformError::Api {
                status: 500,
                message,
            });
        }
        state.commits.push((project, commit.clone()));
        Ok(())
    }

    /// A branch exists once a commit landed on it, in the project or in the
    /// project it was forked from.
    fn branch_exists(&self, project: ProjectId, branch: &str) -> Result<bool, PlatformError> {
        let state = self.state.borrow();
        let stored = state
            .projects
            .iter()
            .find(|p| p.project.id == project)
            .ok_or_else(|| PlatformError::NotFound("404 Project Not Found".into()))?;
        let has_commit = |id: ProjectId| {
            state
                .commits
                .iter()
                .any(|(p, c)| *p == id && c.branch == branch)
        };
        Ok(has_commit(project) || stored.forked_from.is_some_and(has_commit))
    }

    fn fork_project(
        &self,
        project: ProjectId,
        namespace: GroupId,
    ) -> Result<RemoteProject, PlatformError> {
        let reference = self.get_project(project)?;
        let namespace_path = self
            .state
            .borrow()
            .group(namespace)
            .map(|g| g.path.clone())
            .ok_or_else(|| PlatformError::NotFound("404 Namespace Not Found".into()))?;
        // Failures are injected per owning namespace, i.e. per student.
        let raced = match self.state.borrow_mut().injected(&namespace_path) {
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => true,
            None => false,
        };
        if self
            .projects_in(namespace)
            .iter()
            .any(|p| p.name == reference.name)
        {
            return Err(conflict("Project namespace name"));
        }
        let mut state = self.state.borrow_mut();
        let created = insert_project(&mut state, &reference.name, namespace, Some(reference.id));
        state.count("fork");
        if raced {
            return Err(concurrent(&namespace_path));
        }
        Ok(created)
    }

    fn list_forks(&self, project: ProjectId) -> Result<Vec<RemoteProject>, PlatformError> {
        self.get_project(project)?;
        Ok(self.forks_of(project))
    }

    fn update_project(
        &self,
        project: ProjectId,
        settings: &ProjectSettings,
    ) -> Result<(), PlatformError> {
        self.get_project(project)?;
        self.state
            .borrow_mut()
            .settings
            .insert(project, settings.clone());
        Ok(())
    }

    fn search_users(&self, search: &str) -> Result<Vec<RemoteUser>, PlatformError> {
        Ok(self
            .state
            .borrow()
            .users
            .iter()
            .filter(|u| contains(&u.username, search) || contains(&u.name, search))
            .cloned()
            .collect())
    }

    fn create_user(&self, user: &NewUser) -> Result<RemoteUser, PlatformError> {
        let raced = match self.state.borrow_mut().injected(&user.username) {
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => true,
            None => false,
        };
        if self
            .state
            .borrow()
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(conflict("Username"));
        }
        let mut state = self.state.borrow_mut();
        let created = RemoteUser {
            id: UserId(state.id()),
            username: user.username.clone(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
        };
        state.users.push(created.clone());
        state.passwords.insert(created.id, user.password.clone());
        state.extern_uids.insert(created.id, user.extern_uid.clone());
        state.count("user");
        if raced {
            return Err(concurrent(&user.username));
        }
        Ok(created)
    }

    fn set_user_attribute(
        &self,
        user: UserId,
        key: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        self.state
            .borrow_mut()
            .attributes
            .insert((user, key.to_string()), value.to_string());
        Ok(())
    }

    fn list_deploy_keys(&self, project: ProjectId) -> Result<Vec<DeployKey>, PlatformError> {
        Ok(self
            .state
            .borrow()
            .keys
            .iter()
            .filter(|k| k.project == project)
            .map(|k| k.key.clone())
            .collect())
    }

    fn create_deploy_key(
        &self,
        project: ProjectId,
        title: &str,
        key: &str,
    ) -> Result<DeployKey, PlatformError> {
        let mut state = self.state.borrow_mut();
        if state
            .keys
            .iter()
            .any(|k| k.project == project && k.key.same_key(key))
        {
            return Err(conflict("deploy_key.fingerprint"));
        }
        let created = DeployKey {
            id: DeployKeyId(state.id()),
            title: title.to_string(),
            key: key.to_string(),
        };
        state.keys.push(StoredKey {
            project,
            key: created.clone(),
            enabled: true,
        });
        state.count("deploy_key");
        Ok(created)
    }

    fn enable_deploy_key(
        &self,
        project: ProjectId,
        key: DeployKeyId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        let stored = state
            .keys
            .iter_mut()
            .find(|k| k.project == project && k.key.id == key)
            .ok_or_else(|| PlatformError::NotFound("404 Deploy Key Not Found".into()))?;
        stored.enabled = true;
        Ok(())
    }

    fn create_tag(&self, project: ProjectId, tag: &NewTag) -> Result<Tag, PlatformError> {
        self.get_project(project)?;
        let mut state = self.state.borrow_mut();
        if state
            .tags
            .iter()
            .any(|(p, t)| *p == project && t.name == tag.tag_name)
        {
            return Err(PlatformError::Conflict(format!(
                "Tag {} already exists",
                tag.tag_name
            )));
        }
        let created = Tag {
            name: tag.tag_name.clone(),
            target: Some(tag.git_ref.clone()),
            message: tag.message.clone(),
        };
        state.tags.push((project, created.clone()));
        state.count("tag");
        Ok(created)
    }
}

// ---------------------------------------------------------------------------
// FakeRunner
// ---------------------------------------------------------------------------

/// Records every command. `git clone` creates its target directory so a
/// second run sees the earlier clone.
#[derive(Default)]
pub struct FakeRunner {
    commands: RefCell<Vec<CommandSpec>>,
    failing: RefCell<Vec<String>>,
    missing_programs: RefCell<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose rendering contains `needle` exit with status 128.
    pub fn fail_when(&self, needle: &str) {
        self.failing.borrow_mut().push(needle.to_string());
    }

    /// `program` is not installed: running it fails to spawn.
    pub fn missing_program(&self, program: &str) {
        self.missing_programs.borrow_mut().push(program.to_string());
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.borrow().clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.commands.borrow().iter().map(|c| c.to_string()).collect()
    }

    fn clone_target(command: &CommandSpec) -> Option<PathBuf> {
        if command.program != "git" || command.args.first().map(String::as_str) != Some("clone") {
            return None;
        }
        let target = PathBuf::from(command.args.last()?);
        Some(match &command.cwd {
            Some(cwd) => cwd.join(target),
            None => target,
        })
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.commands.borrow_mut().push(command.clone());
        if self.missing_programs.borrow().contains(&command.program) {
            return Err(ProcessError::Spawn {
                program: command.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let rendered = command.to_string();
        if self.failing.borrow().iter().any(|n| rendered.contains(n)) {
            return Ok(CommandOutput {
                success: false,
                status: "exit status: 128".into(),
                stderr: "fatal: simulated failure".into(),
            });
        }
        if let Some(target) = Self::clone_target(command) {
            std::fs::create_dir_all(target).expect("create clone target");
        }
        Ok(CommandOutput {
            success: true,
            status: "exit status: 0".into(),
            stderr: String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn student(username: &str, group: &str) -> StudentRecord {
    StudentRecord {
        username: username.to_string(),
        email: format!("{username}@x.de"),
        full_name: format!("Student {username}"),
        tutorial_group: group.to_string(),
    }
}

pub const DEPLOY_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIabgabe abgabe@server";
