//! `abgabesystem course` — create the course group hierarchy.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use abgabe_provision::course::provision_course;

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct CourseArgs {
    /// Course name, e.g. "Programmieren 1".
    #[arg(short, long)]
    pub course: String,
}

impl CourseArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = super::load_config(global)?;
        let client = super::connect(&config)?;

        let layout = provision_course(&client, &self.course)
            .with_context(|| format!("failed to provision course '{}'", self.course))?;

        println!("{} course '{}' ready", "✓".green(), self.course);
        for group in [&layout.course, &layout.students, &layout.solutions] {
            println!("  {}  (id {})", group.full_path, group.id);
        }
        Ok(())
    }
}
