//! `abgabesystem projects` — per-student forks of the reference solution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use abgabe_provision::{
    course::{ensure_layout, require_course_group},
    projects::{setup_projects, Participants, ProjectOutcome},
};

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Course name.
    #[arg(short, long)]
    pub course: String,

    /// Public key file added as deploy key to every fork.
    #[arg(short, long)]
    pub deploy_key: PathBuf,

    /// Roster to take students from; defaults to the `students` group members.
    #[arg(short, long)]
    pub students: Option<PathBuf>,
}

impl ProjectsArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = super::load_config(global)?;
        let deploy_key = std::fs::read_to_string(&self.deploy_key)
            .with_context(|| format!("failed to read deploy key {}", self.deploy_key.display()))?;
        let deploy_key = deploy_key.trim();
        anyhow::ensure!(
            !deploy_key.is_empty(),
            "deploy key file {} is empty",
            self.deploy_key.display()
        );

        let participants = match &self.students {
            Some(path) => Participants::Roster(super::read_roster(path)?),
            None => Participants::StudentsGroup,
        };

        let client = super::connect(&config)?;
        let course = require_course_group(&client, &self.course)
            .with_context(|| format!("course '{}' is not set up; run `course` first", self.course))?;
        let layout = ensure_layout(&client, course)
            .with_context(|| format!("failed to complete layout of '{}'", self.course))?;

        let report = setup_projects(&client, &layout, &participants, deploy_key)
            .context("failed to set up the reference project")?;

        println!(
            "{} reference project {} ({})",
            "✓".green(),
            report.reference.handle().path_with_namespace,
            report.reference.verb()
        );
        super::print_batch("Student projects", &report.students, |outcome| match outcome {
            ProjectOutcome::Provisioned(project) => (
                super::reconciled_label(&project.fork),
                project.fork.handle().path_with_namespace.clone(),
            ),
            ProjectOutcome::NoAccount => (
                "SKIPPED".yellow().to_string(),
                "no account; run `users` first".to_string(),
            ),
        });
        super::finish_batch("students", &report.students)
    }
}
