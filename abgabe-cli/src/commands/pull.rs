//! `abgabesystem pull` — local copies of one tutorial group's submissions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use abgabe_provision::{
    collect::{pull_tutorial_group, PullAction},
    course::resolve_course,
    SystemRunner,
};

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Course name.
    #[arg(short, long)]
    pub course: String,

    /// Roster export the group membership is read from.
    #[arg(short, long)]
    pub students: PathBuf,

    /// Tutorial group, as listed by `groups`.
    #[arg(short, long)]
    pub group: String,

    /// Target directory; submissions land in `<dir>/<group>/<username>`.
    #[arg(long, default_value = "solutions")]
    pub dir: PathBuf,
}

impl PullArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = super::load_config(global)?;
        let roster = super::read_roster(&self.students)?;
        let client = super::connect(&config)?;
        let layout = resolve_course(&client, &self.course)
            .with_context(|| format!("course '{}' is not set up", self.course))?;

        let report = pull_tutorial_group(
            &client,
            &SystemRunner,
            &layout,
            &roster,
            &self.group,
            &self.dir,
        );
        if report.is_empty() {
            println!("no students in tutorial group '{}'", self.group);
            return Ok(());
        }
        super::print_batch(&format!("Tutorial group {}", self.group), &report, |action| {
            match action {
                PullAction::Cloned(path) => ("CLONED".green().to_string(), path.display().to_string()),
                PullAction::Pulled(path) => {
                    ("PULLED".bright_black().to_string(), path.display().to_string())
                }
                PullAction::NoProject => ("MISSING".yellow().to_string(), "no fork".to_string()),
            }
        });
        super::finish_batch("submissions", &report)
    }
}
