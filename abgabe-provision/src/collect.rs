//! Local copies of one tutorial group's submissions, for the tutor.
//!
//! Each student of the group ends up in `<dir>/<group>/<username>`: cloned
//! on the first run, pulled on later runs.

use std::path::{Path, PathBuf};

use abgabe_core::{types::StudentRecord, Platform};

use crate::course::{fork_path, CourseLayout};
use crate::error::ProvisionError;
use crate::plagiarism::clone_url;
use crate::process::{git_clone, git_pull, run_checked, CommandRunner};
use crate::report::BatchReport;

/// What happened to one student's local copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullAction {
    Cloned(PathBuf),
    Pulled(PathBuf),
    /// The student has no fork on the platform.
    NoProject,
}

/// Clone or update the forks of every roster student in tutorial `group`.
pub fn pull_tutorial_group(
    platform: &dyn Platform,
    runner: &dyn CommandRunner,
    layout: &CourseLayout,
    roster: &[StudentRecord],
    group: &str,
    dir: &Path,
) -> BatchReport<PullAction> {
    let mut report = BatchReport::new();
    for student in roster
        .iter()
        .filter(|s| s.tutorial_group_short() == Some(group))
    {
        let result = pull_student(platform, runner, layout, student, &dir.join(group));
        report.record(&student.username, result);
    }
    report
}

fn pull_student(
    platform: &dyn Platform,
    runner: &dyn CommandRunner,
    layout: &CourseLayout,
    student: &StudentRecord,
    group_dir: &Path,
) -> Result<PullAction, ProvisionError> {
    let path = fork_path(&layout.course, &student.username);
    let Some(project) = platform.find_project_by_path(&path)? else {
        tracing::warn!(username = %student.username, %path, "no submission project");
        return Ok(PullAction::NoProject);
    };

    let target = group_dir.join(&student.username);
    if target.is_dir() {
        run_checked(runner, &git_pull(&target))?;
        return Ok(PullAction::Pulled(target));
    }
    run_checked(runner, &git_clone(clone_url(&project), &target))?;
    Ok(PullAction::Cloned(target))
}
