//! Course hierarchy.
//!
//! ```text
//! <course>                    (internal)
//!   students/                 (roster enrollment group)
//!   solutions/
//!     solutions               (reference project, seeded with a README)
//!     <username>/             (personal subgroup, one per student)
//!       solutions             (fork of the reference project)
//! ```

use abgabe_core::{
    types::{RemoteGroup, RemoteProject, Visibility},
    CommitAction, NewCommit, Platform,
};

use crate::error::{ProvisionError, ReconcileError};
use crate::reconcile::{reconcile, require, GroupSpec, ProjectSpec, Reconciled};

pub const STUDENTS_GROUP: &str = "students";
pub const SOLUTIONS_GROUP: &str = "solutions";
pub const REFERENCE_PROJECT: &str = "solutions";
pub const DEFAULT_BRANCH: &str = "master";

const README_PATH: &str = "README.md";
const README_CONTENT: &str = "Example solutions go here";

/// The fixed groups of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLayout {
    pub course: RemoteGroup,
    pub students: RemoteGroup,
    pub solutions: RemoteGroup,
}

fn course_spec(course_name: &str) -> GroupSpec {
    GroupSpec::top_level(course_name, Visibility::Internal)
}

/// Ensure the course group and both subgroups exist.
pub fn provision_course(
    platform: &dyn Platform,
    course_name: &str,
) -> Result<CourseLayout, ReconcileError> {
    let course = reconcile(platform, &course_spec(course_name))?.into_handle();
    ensure_layout(platform, course)
}

/// Ensure the `students` and `solutions` subgroups of an existing course group.
pub fn ensure_layout(
    platform: &dyn Platform,
    course: RemoteGroup,
) -> Result<CourseLayout, ReconcileError> {
    let students = reconcile(
        platform,
        &GroupSpec::subgroup(STUDENTS_GROUP, &course, Visibility::Internal),
    )?
    .into_handle();
    let solutions = reconcile(
        platform,
        &GroupSpec::subgroup(SOLUTIONS_GROUP, &course, Visibility::Internal),
    )?
    .into_handle();
    Ok(CourseLayout {
        course,
        students,
        solutions,
    })
}

/// Look up the course group only. Absence is a missing prerequisite.
pub fn require_course_group(
    platform: &dyn Platform,
    course_name: &str,
) -> Result<RemoteGroup, ReconcileError> {
    require(platform, &course_spec(course_name))
}

/// Look up the complete layout without creating anything.
pub fn resolve_course(
    platform: &dyn Platform,
    course_name: &str,
) -> Result<CourseLayout, ReconcileError> {
    let course = require_course_group(platform, course_name)?;
    let students = require(
        platform,
        &GroupSpec::subgroup(STUDENTS_GROUP, &course, Visibility::Internal),
    )?;
    let solutions = require(
        platform,
        &GroupSpec::subgroup(SOLUTIONS_GROUP, &course, Visibility::Internal),
    )?;
    Ok(CourseLayout {
        course,
        students,
        solutions,
    })
}

/// Ensure the reference project. A project without a `master` branch, fresh
/// or left empty by an earlier failed run, gets the initial commit.
pub fn ensure_reference_project(
    platform: &dyn Platform,
    solutions: &RemoteGroup,
) -> Result<Reconciled<RemoteProject>, ProvisionError> {
    let reference = reconcile(
        platform,
        &ProjectSpec {
            name: REFERENCE_PROJECT.to_string(),
            namespace: solutions.id,
            visibility: Visibility::Internal,
        },
    )?;
    let project = reference.handle();
    let seeded = match &reference {
        Reconciled::Created(_) => false,
        _ => platform.branch_exists(project.id, DEFAULT_BRANCH)?,
    };
    if !seeded {
        platform.create_commit(project.id, &initial_commit())?;
        tracing::info!(project = %project.path_with_namespace, "seeded reference project");
    }
    Ok(reference)
}

fn initial_commit() -> NewCommit {
    NewCommit {
        branch: DEFAULT_BRANCH.to_string(),
        commit_message: "Initial commit".to_string(),
        actions: vec![CommitAction::create(README_PATH, README_CONTENT)],
    }
}

/// Full path of a student's fork: `<course>/solutions/<username>/solutions`.
pub fn fork_path(course: &RemoteGroup, username: &str) -> String {
    let course_path = if course.full_path.is_empty() {
        course.path.as_str()
    } else {
        course.full_path.as_str()
    };
    format!("{course_path}/{SOLUTIONS_GROUP}/{username}/{REFERENCE_PROJECT}")
}
