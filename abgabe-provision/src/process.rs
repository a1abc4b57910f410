//! Subprocess execution (git, the plagiarism checker).
//!
//! Commands are described as [`CommandSpec`] values and executed through a
//! [`CommandRunner`], so batch logic can be tested with a recording runner.
//! Execution is blocking; nothing runs in parallel.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ProcessError;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Pass stdout/stderr through to the terminal instead of capturing them.
    pub inherit_output: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            inherit_output: false,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.inherit_output = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit information of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit status as displayed by the OS (`exit status: 128`, ...).
    pub status: String,
    /// Captured stderr; empty when output is inherited.
    pub stderr: String,
}

/// Runs commands to completion.
pub trait CommandRunner {
    /// Only a failure to spawn is an error; a non-zero exit is reported in
    /// the returned [`CommandOutput`].
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(command = %spec, "running");
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        let spawn_err = |source| ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        };

        if spec.inherit_output {
            let status = command.status().map_err(spawn_err)?;
            return Ok(CommandOutput {
                success: status.success(),
                status: status.to_string(),
                stderr: String::new(),
            });
        }

        let output = command.output().map_err(spawn_err)?;
        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run `spec` and turn a non-zero exit into [`ProcessError::Failed`].
pub fn run_checked(runner: &dyn CommandRunner, spec: &CommandSpec) -> Result<(), ProcessError> {
    let output = runner.run(spec)?;
    if output.success {
        Ok(())
    } else {
        Err(ProcessError::Failed {
            program: spec.program.clone(),
            status: output.status,
            stderr: output.stderr,
        })
    }
}

// ---------------------------------------------------------------------------
// git
// ---------------------------------------------------------------------------

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `git clone --branch <tag> <url> <target>` run inside `cwd`.
pub fn git_clone_at(cwd: &Path, url: &str, git_ref: &str, target: &str) -> CommandSpec {
    CommandSpec::new("git", ["clone", "--branch", git_ref, url, target]).current_dir(cwd)
}

/// `git clone <url> <target>`.
pub fn git_clone(url: &str, target: &Path) -> CommandSpec {
    CommandSpec::new("git", ["clone".to_string(), url.to_string(), path_arg(target)])
}

/// `git -C <repo> fetch --tags --force`.
pub fn git_fetch_tags(repo: &Path) -> CommandSpec {
    CommandSpec::new(
        "git",
        ["-C".to_string(), path_arg(repo), "fetch".into(), "--tags".into(), "--force".into()],
    )
}

/// `git -C <repo> checkout <ref>`.
pub fn git_checkout(repo: &Path, git_ref: &str) -> CommandSpec {
    CommandSpec::new(
        "git",
        ["-C".to_string(), path_arg(repo), "checkout".into(), git_ref.to_string()],
    )
}

/// `git -C <repo> pull`.
pub fn git_pull(repo: &Path) -> CommandSpec {
    CommandSpec::new("git", ["-C".to_string(), path_arg(repo), "pull".into()])
}
