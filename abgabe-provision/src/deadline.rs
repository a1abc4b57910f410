//! Deadline tags.
//!
//! A deadline freezes every submission by tagging the reference project and
//! all of its forks. Tags are append-only: tagging a project that already
//! carries the tag fails, is reported, and the remaining projects are still
//! tagged. Re-running a deadline is therefore harmless.

use chrono::{DateTime, SecondsFormat, Utc};

use abgabe_core::{
    types::{ProjectId, RemoteProject, Tag},
    NewTag, Platform, PlatformError,
};

use crate::error::ProvisionError;

/// Outcome of tagging one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    Tagged(Tag),
    /// The project already carries a tag of that name.
    AlreadyTagged(String),
    Failed(String),
}

/// Per-project outcomes of [`trigger_deadline`], reference first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineReport {
    pub reference: RemoteProject,
    pub projects: Vec<(String, TagOutcome)>,
}

impl DeadlineReport {
    pub fn tagged(&self) -> usize {
        self.count(|o| matches!(o, TagOutcome::Tagged(_)))
    }

    pub fn already_tagged(&self) -> usize {
        self.count(|o| matches!(o, TagOutcome::AlreadyTagged(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TagOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&TagOutcome) -> bool) -> usize {
        self.projects.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// What to tag and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadline {
    pub tag_name: String,
    pub git_ref: String,
    /// Message for an annotated tag; `None` creates a lightweight tag.
    pub message: Option<String>,
}

impl Deadline {
    /// Lightweight tag on `master`.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            git_ref: crate::course::DEFAULT_BRANCH.to_string(),
            message: None,
        }
    }

    pub fn at_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = git_ref.into();
        self
    }

    /// Annotate the tag with the time the deadline was triggered.
    pub fn annotated(mut self, now: DateTime<Utc>) -> Self {
        self.message = Some(format!(
            "Deadline {} ({})",
            self.tag_name,
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        self
    }

    fn to_new_tag(&self) -> NewTag {
        NewTag {
            tag_name: self.tag_name.clone(),
            git_ref: self.git_ref.clone(),
            message: self.message.clone(),
        }
    }
}

/// Tag the reference project and every fork of it.
///
/// Only a failure to fetch the reference project or its fork list is an
/// error; tag failures are recorded per project.
pub fn trigger_deadline(
    platform: &dyn Platform,
    reference: ProjectId,
    deadline: &Deadline,
) -> Result<DeadlineReport, ProvisionError> {
    let reference = platform.get_project(reference)?;
    let forks = platform.list_forks(reference.id)?;
    let tag = deadline.to_new_tag();

    let mut projects = Vec::with_capacity(forks.len() + 1);
    for project in std::iter::once(&reference).chain(forks.iter()) {
        tracing::info!(project = %project.path_with_namespace, tag = %tag.tag_name, "creating tag");
        let outcome = match platform.create_tag(project.id, &tag) {
            Ok(created) => TagOutcome::Tagged(created),
            Err(PlatformError::Conflict(message)) => {
                tracing::warn!(project = %project.path_with_namespace, %message, "tag already exists");
                TagOutcome::AlreadyTagged(message)
            }
            Err(err) => {
                tracing::warn!(project = %project.path_with_namespace, error = %err, "tagging failed");
                TagOutcome::Failed(err.to_string())
            }
        };
        projects.push((project.path_with_namespace.clone(), outcome));
    }

    Ok(DeadlineReport {
        reference,
        projects,
    })
}
