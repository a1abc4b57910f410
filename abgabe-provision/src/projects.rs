//! Per-student submission repositories.
//!
//! For every enrolled student: a personal subgroup `solutions/<username>`,
//! Developer membership in it, a fork of the reference project inside it
//! (private, no container registry, no LFS) and the tool's deploy key,
//! attached and enabled. Every step is find-or-create, so the whole setup
//! can be re-run after adding students or after a partial failure.

use abgabe_core::{
    types::{
        AccessLevel, DeployKey, ProjectSettings, RemoteGroup, RemoteMember, RemoteProject,
        RemoteUser, StudentRecord, Visibility,
    },
    Platform,
};

use crate::course::{ensure_reference_project, CourseLayout};
use crate::error::ProvisionError;
use crate::reconcile::{
    reconcile, DeployKeySpec, ForkSpec, GroupSpec, MembershipSpec, Reconciled,
};
use crate::report::BatchReport;

pub const DEPLOY_KEY_TITLE: &str = "Deploy Key";

/// Where the list of students comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participants {
    /// Roster entries; students without an account are skipped.
    Roster(Vec<StudentRecord>),
    /// Non-staff members of the course's `students` subgroup.
    StudentsGroup,
}

/// Remote objects of one student's setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProject {
    pub namespace: Reconciled<RemoteGroup>,
    pub membership: Reconciled<RemoteMember>,
    pub fork: Reconciled<RemoteProject>,
    pub deploy_key: Reconciled<DeployKey>,
}

/// Outcome for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    Provisioned(Box<StudentProject>),
    /// The roster lists the student but no account exists yet.
    NoAccount,
}

/// Result of [`setup_projects`].
#[derive(Debug)]
pub struct ProjectsReport {
    pub reference: Reconciled<RemoteProject>,
    pub students: BatchReport<ProjectOutcome>,
}

/// Ensure the reference project and every student's fork.
///
/// Fails only if the reference project or the participant list cannot be
/// obtained; per-student failures are recorded in the report.
pub fn setup_projects(
    platform: &dyn Platform,
    layout: &CourseLayout,
    participants: &Participants,
    deploy_key: &str,
) -> Result<ProjectsReport, ProvisionError> {
    let reference = ensure_reference_project(platform, &layout.solutions)?;
    let mut students = BatchReport::new();

    match participants {
        Participants::Roster(roster) => {
            for student in roster {
                let result = find_account(platform, &student.username).and_then(|user| {
                    match user {
                        Some(user) => provision_student(
                            platform,
                            &layout.solutions,
                            reference.handle(),
                            &user,
                            deploy_key,
                        )
                        .map(|p| ProjectOutcome::Provisioned(Box::new(p))),
                        None => {
                            tracing::warn!(username = %student.username, "no account; run `users` first");
                            Ok(ProjectOutcome::NoAccount)
                        }
                    }
                });
                students.record(&student.username, result);
            }
        }
        Participants::StudentsGroup => {
            for user in enrolled_members(platform, &layout.students)? {
                let result = provision_student(
                    platform,
                    &layout.solutions,
                    reference.handle(),
                    &user,
                    deploy_key,
                )
                .map(|p| ProjectOutcome::Provisioned(Box::new(p)));
                students.record(&user.username, result);
            }
        }
    }

    Ok(ProjectsReport {
        reference,
        students,
    })
}

/// Exact (case-insensitive) username lookup.
pub fn find_account(
    platform: &dyn Platform,
    username: &str,
) -> Result<Option<RemoteUser>, ProvisionError> {
    Ok(platform
        .search_users(username)?
        .into_iter()
        .find(|u| u.username.eq_ignore_ascii_case(username)))
}

/// Members of the `students` group below Maintainer, as users.
pub fn enrolled_members(
    platform: &dyn Platform,
    students: &RemoteGroup,
) -> Result<Vec<RemoteUser>, ProvisionError> {
    Ok(platform
        .list_group_members(students.id)?
        .into_iter()
        .filter(|m| !is_staff(m.access_level))
        .map(|m| RemoteUser {
            id: m.id,
            username: m.username,
            name: m.name,
            email: None,
        })
        .collect())
}

fn is_staff(level: AccessLevel) -> bool {
    u32::from(level) >= u32::from(AccessLevel::Maintainer)
}

/// Namespace, membership, fork and deploy key for one student.
pub fn provision_student(
    platform: &dyn Platform,
    solutions: &RemoteGroup,
    reference: &RemoteProject,
    user: &RemoteUser,
    deploy_key: &str,
) -> Result<StudentProject, ProvisionError> {
    let namespace = reconcile(
        platform,
        &GroupSpec::subgroup(&user.username, solutions, Visibility::Private),
    )?;
    let namespace_id = namespace.handle().id;

    let membership = reconcile(
        platform,
        &MembershipSpec::new(namespace_id, user, AccessLevel::Developer),
    )?;

    let fork = reconcile(
        platform,
        &ForkSpec {
            reference: reference.clone(),
            namespace: namespace_id,
        },
    )?;
    let fork_id = fork.handle().id;
    platform.update_project(fork_id, &ProjectSettings::student_fork())?;

    let key = reconcile(
        platform,
        &DeployKeySpec {
            project: fork_id,
            title: DEPLOY_KEY_TITLE.to_string(),
            key: deploy_key.to_string(),
        },
    )?;
    platform.enable_deploy_key(fork_id, key.handle().id)?;

    tracing::info!(
        username = %user.username,
        fork = %fork.handle().path_with_namespace,
        "student project ready ({})",
        fork.verb()
    );
    Ok(StudentProject {
        namespace,
        membership,
        fork,
        deploy_key: key,
    })
}
