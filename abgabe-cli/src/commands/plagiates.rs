//! `abgabesystem plagiates` — collect submissions at a tag and run JPlag.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use abgabe_core::ProjectId;
use abgabe_provision::{
    plagiarism::{collect_and_check, CheckerSettings, CloneAction},
    SystemRunner,
};

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct PlagiatesArgs {
    /// Deadline tag to collect.
    #[arg(short, long)]
    pub tag: String,

    /// Numeric id of the reference project.
    #[arg(short, long)]
    pub reference: u64,

    /// Path to the JPlag jar.
    #[arg(short, long)]
    pub jplag: PathBuf,

    /// Directory the repositories are cloned into; overrides the config.
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

impl PlagiatesArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = super::load_config(global)?;
        let client = super::connect(&config)?;

        let mut checker = CheckerSettings::from_config(&config.checker, &self.jplag);
        if let Some(workdir) = self.workdir {
            checker.workdir = workdir;
        }

        let report = collect_and_check(
            &client,
            &SystemRunner,
            ProjectId(self.reference),
            &self.tag,
            &checker,
        )
        .with_context(|| format!("plagiarism run for '{}' failed", self.tag))?;

        super::print_batch("Repositories", &report.repositories, |action| match action {
            CloneAction::Cloned => ("CLONED".green().to_string(), String::new()),
            CloneAction::Refreshed => ("REFRESHED".bright_black().to_string(), String::new()),
        });

        match &report.checker {
            Ok(output) if output.success => println!(
                "{} checker finished; results in {}",
                "✓".green(),
                checker.results_dir.display()
            ),
            Ok(output) => println!("{} checker {}", "✗".red(), output.status),
            Err(err) => println!("{} checker not started: {err}", "✗".red()),
        }
        super::finish_batch("repositories", &report.repositories)?;
        report
            .checker
            .map(drop)
            .context("plagiarism checker could not be started")
    }
}
