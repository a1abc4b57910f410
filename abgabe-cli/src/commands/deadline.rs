//! `abgabesystem deadline` — tag the reference project and all forks.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use abgabe_core::ProjectId;
use abgabe_provision::deadline::{trigger_deadline, Deadline, TagOutcome};

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct DeadlineArgs {
    /// Tag name, e.g. `blatt-01`.
    #[arg(short, long)]
    pub tag: String,

    /// Numeric id of the reference project.
    #[arg(short, long)]
    pub reference: u64,

    /// Branch or commit the tags point at.
    #[arg(long = "ref", default_value = "master")]
    pub git_ref: String,

    /// Create annotated tags carrying the current time.
    #[arg(long)]
    pub annotate: bool,
}

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl DeadlineArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = super::load_config(global)?;
        let client = super::connect(&config)?;

        let mut deadline = Deadline::new(&self.tag).at_ref(&self.git_ref);
        if self.annotate {
            deadline = deadline.annotated(chrono::Utc::now());
        }

        let report = trigger_deadline(&client, ProjectId(self.reference), &deadline)
            .with_context(|| format!("failed to load reference project {}", self.reference))?;

        let rows: Vec<TagRow> = report
            .projects
            .iter()
            .map(|(project, outcome)| {
                let (status, detail) = match outcome {
                    TagOutcome::Tagged(tag) => (
                        "TAGGED".green().to_string(),
                        tag.target.clone().unwrap_or_default(),
                    ),
                    TagOutcome::AlreadyTagged(message) => {
                        ("EXISTS".yellow().to_string(), message.clone())
                    }
                    TagOutcome::Failed(message) => ("FAILED".red().bold().to_string(), message.clone()),
                };
                TagRow {
                    project: project.clone(),
                    status,
                    detail,
                }
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!(
            "'{}': {} tagged, {} already tagged, {} failed",
            self.tag,
            report.tagged(),
            report.already_tagged(),
            report.failed()
        );

        if report.failed() > 0 {
            anyhow::bail!("{} project(s) could not be tagged", report.failed());
        }
        Ok(())
    }
}
