//! abgabesystem: GitLab provisioning for course submissions.
//!
//! # Usage
//!
//! ```text
//! abgabesystem course -c <course>
//! abgabesystem users -c <course> -s <students.csv> [-b <ldap-base>] [-p <provider>]
//! abgabesystem projects -c <course> -d <deploy-key.pub> [-s <students.csv>]
//! abgabesystem deadline -t <tag> -r <reference-id> [--ref master] [--annotate]
//! abgabesystem plagiates -t <tag> -r <reference-id> -j <jplag.jar> [--workdir input]
//! abgabesystem groups -s <students.csv>
//! abgabesystem pull -c <course> -s <students.csv> -g <group> [--dir solutions]
//! ```

mod commands;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use commands::{
    course::CourseArgs, deadline::DeadlineArgs, groups::GroupsArgs, plagiates::PlagiatesArgs,
    projects::ProjectsArgs, pull::PullArgs, users::UsersArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "abgabesystem",
    version,
    about = "Provision GitLab groups, accounts and forks for course submissions",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (default: ~/.abgabesystem/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitLab instance URL; overrides config and ABGABE_GITLAB_URL.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Private access token; overrides config and ABGABE_GITLAB_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Append log output to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create dummy accounts for a roster and enroll them in the course.
    Users(UsersArgs),

    /// Create the course group with its `students` and `solutions` subgroups.
    #[command(alias = "courses")]
    Course(CourseArgs),

    /// Fork the reference solution into every student's namespace.
    Projects(ProjectsArgs),

    /// Tag the reference project and all forks.
    Deadline(DeadlineArgs),

    /// Clone all submissions at a tag and run the plagiarism checker.
    Plagiates(PlagiatesArgs),

    /// List the tutorial groups of a roster.
    Groups(GroupsArgs),

    /// Clone or update the submissions of one tutorial group.
    Pull(PullArgs),
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_logging(global: &GlobalArgs) -> Result<()> {
    let level = match global.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = match &global.log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    let global = cli.global;
    match cli.command {
        Commands::Users(args) => args.run(&global),
        Commands::Course(args) => args.run(&global),
        Commands::Projects(args) => args.run(&global),
        Commands::Deadline(args) => args.run(&global),
        Commands::Plagiates(args) => args.run(&global),
        Commands::Groups(args) => args.run(),
        Commands::Pull(args) => args.run(&global),
    }
}
