//! Plagiarism check of the submissions at a deadline tag.
//!
//! The reference project and every fork are cloned at the tag into
//! `<workdir>/<path_with_namespace>`; repositories left over from an earlier
//! run are fetched and checked out at the tag instead. A repository that
//! cannot be cloned is reported and skipped. The checker (JPlag) then runs
//! once over the whole working directory, with the reference project as
//! base code. Its exit status, or the failure to start it, is reported; its
//! results are not interpreted.

use std::path::{Path, PathBuf};

use abgabe_core::{
    types::{ProjectId, RemoteProject},
    CheckerConfig, Platform,
};

use crate::error::{io_err, ProcessError, ProvisionError};
use crate::process::{
    git_checkout, git_clone_at, git_fetch_tags, run_checked, CommandOutput, CommandRunner,
    CommandSpec,
};
use crate::report::BatchReport;

/// How to invoke the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSettings {
    pub java: String,
    pub jar: PathBuf,
    pub language: String,
    pub language_version: String,
    pub results_dir: PathBuf,
    pub workdir: PathBuf,
}

impl CheckerSettings {
    pub fn from_config(config: &CheckerConfig, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: config.java.clone(),
            jar: jar.into(),
            language: config.language.clone(),
            language_version: config.language_version.clone(),
            results_dir: config.results_dir.clone(),
            workdir: config.workdir.clone(),
        }
    }

    /// `<java> -jar <jar> -s <workdir> -p <lang> -r <results> -bc <base> -l <version>`
    pub fn command(&self, base_code: &str) -> CommandSpec {
        CommandSpec::new(
            self.java.clone(),
            [
                "-jar".to_string(),
                self.jar.to_string_lossy().into_owned(),
                "-s".into(),
                self.workdir.to_string_lossy().into_owned(),
                "-p".into(),
                self.language.clone(),
                "-r".into(),
                self.results_dir.to_string_lossy().into_owned(),
                "-bc".into(),
                base_code.to_string(),
                "-l".into(),
                self.language_version.clone(),
            ],
        )
        .inherit_output()
    }
}

/// How a repository got into the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneAction {
    Cloned,
    /// Already present; fetched and checked out at the tag.
    Refreshed,
}

/// Result of [`collect_and_check`].
#[derive(Debug)]
pub struct PlagiarismReport {
    pub reference: RemoteProject,
    pub repositories: BatchReport<CloneAction>,
    /// Exit of the checker; `Err` when it could not be started.
    pub checker: Result<CommandOutput, ProcessError>,
}

/// Collect every submission at `tag` and run the checker over them.
pub fn collect_and_check(
    platform: &dyn Platform,
    runner: &dyn CommandRunner,
    reference: ProjectId,
    tag: &str,
    checker: &CheckerSettings,
) -> Result<PlagiarismReport, ProvisionError> {
    let reference = platform.get_project(reference)?;
    let forks = platform.list_forks(reference.id)?;

    ensure_workdir(&checker.workdir)?;

    let mut repositories = BatchReport::new();
    for project in std::iter::once(&reference).chain(forks.iter()) {
        let result = collect_submission(runner, &checker.workdir, project, tag);
        repositories.record(&project.path_with_namespace, result);
    }

    let command = checker.command(&reference.path_with_namespace);
    tracing::info!(command = %command, "running plagiarism checker");
    let checker = runner.run(&command);
    match &checker {
        Ok(output) if !output.success => {
            tracing::warn!(status = %output.status, "plagiarism checker exited unsuccessfully");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(error = %err, "plagiarism checker could not be started"),
    }

    Ok(PlagiarismReport {
        reference,
        repositories,
        checker,
    })
}

/// Create the working directory; an existing one is reused.
pub fn ensure_workdir(workdir: &Path) -> Result<(), ProvisionError> {
    std::fs::create_dir_all(workdir).map_err(|e| io_err(workdir, e))
}

/// Clone `project` at `tag` below `workdir`, or refresh an earlier clone.
pub fn collect_submission(
    runner: &dyn CommandRunner,
    workdir: &Path,
    project: &RemoteProject,
    tag: &str,
) -> Result<CloneAction, ProvisionError> {
    let target = workdir.join(&project.path_with_namespace);
    if target.is_dir() {
        run_checked(runner, &git_fetch_tags(&target))?;
        run_checked(runner, &git_checkout(&target, tag))?;
        return Ok(CloneAction::Refreshed);
    }
    run_checked(
        runner,
        &git_clone_at(workdir, clone_url(project), tag, &project.path_with_namespace),
    )?;
    Ok(CloneAction::Cloned)
}

/// SSH URL, falling back to HTTP when the instance does not expose SSH.
pub fn clone_url(project: &RemoteProject) -> &str {
    if project.ssh_url_to_repo.is_empty() {
        &project.http_url_to_repo
    } else {
        &project.ssh_url_to_repo
    }
}
