//! Subcommand implementations and the helpers they share.

pub mod course;
pub mod deadline;
pub mod groups;
pub mod plagiates;
pub mod projects;
pub mod pull;
pub mod users;

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use abgabe_core::{config, roster, Config, StudentRecord};
use abgabe_gitlab::GitlabClient;
use abgabe_provision::{BatchReport, Reconciled};

use crate::GlobalArgs;

/// Config file (explicit or `~/.abgabesystem/config.yaml`), then environment,
/// then command-line flags.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let loaded = match &global.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    }
    .context("failed to load configuration")?;

    let mut config = loaded.apply_env(|key| std::env::var(key).ok());
    if let Some(url) = &global.url {
        config.url = Some(url.clone());
    }
    if let Some(token) = &global.token {
        config.private_token = Some(token.clone());
    }
    Ok(config)
}

pub fn connect(config: &Config) -> Result<GitlabClient> {
    let client = GitlabClient::from_config(config).context("cannot connect to GitLab")?;
    tracing::debug!(url = ?config.url, "using GitLab instance");
    Ok(client)
}

pub fn read_roster(path: &Path) -> Result<Vec<StudentRecord>> {
    let students = roster::read_roster(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    tracing::info!(path = %path.display(), students = students.len(), "roster loaded");
    Ok(students)
}

// ---------------------------------------------------------------------------
// Batch output
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "subject")]
    subject: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

/// Print one row per batch entry. `describe` yields (status, detail) for
/// successful entries.
pub fn print_batch<T>(title: &str, report: &BatchReport<T>, describe: impl Fn(&T) -> (String, String)) {
    println!("{}", title.bold());
    if report.is_empty() {
        println!("  nothing to do");
        return;
    }
    let rows: Vec<BatchRow> = report
        .entries
        .iter()
        .map(|entry| {
            let (status, detail) = match &entry.result {
                Ok(value) => describe(value),
                Err(err) => ("FAILED".red().bold().to_string(), err.to_string()),
            };
            BatchRow {
                subject: entry.subject.clone(),
                status,
                detail,
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Summary line; an error when any entry failed so the process exits non-zero.
pub fn finish_batch<T>(what: &str, report: &BatchReport<T>) -> Result<()> {
    let failed = report.failure_count();
    if failed == 0 {
        println!("{} {} {what} processed", "✓".green(), report.len());
        return Ok(());
    }
    anyhow::bail!("{failed} of {} {what} failed; re-run after fixing the cause", report.len())
}

/// Coloured upper-case label of a reconciliation outcome.
pub fn reconciled_label<H>(outcome: &Reconciled<H>) -> String {
    let label = outcome.verb().to_uppercase();
    match outcome {
        Reconciled::Created(_) => label.green().to_string(),
        Reconciled::Adopted(_) => label.yellow().to_string(),
        Reconciled::Existing(_) => label.bright_black().to_string(),
    }
}
