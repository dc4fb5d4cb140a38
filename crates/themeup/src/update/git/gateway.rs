//! Subprocess git execution.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::parse::{self, format_git_error};
use super::types::GitStatus;
use crate::update::error::{classify_git_error, Result, UpdateError};

/// Process-execution seam so git can be faked in tests.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> std::io::Result<Output>;
}

/// Runs commands through [`std::process::Command`].
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> std::io::Result<Output> {
        Command::new(program).current_dir(cwd).args(args).output()
    }
}

/// Executes git subcommands against one repository.
pub struct GitGateway {
    repo_path: PathBuf,
    runner: Box<dyn ProcessRunner>,
}

impl GitGateway {
    /// Creates a gateway running real git in `repo_path`.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self::with_runner(repo_path, Box::new(SystemRunner))
    }

    /// Creates a gateway with a custom process runner.
    pub fn with_runner(repo_path: impl Into<PathBuf>, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            repo_path: repo_path.into(),
            runner,
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn is_git_repo(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    /// Runs a git subcommand and returns its trimmed stdout.
    ///
    /// A non-zero exit classifies the combined output into an error variant.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = self
            .runner
            .run("git", args, &self.repo_path)
            .map_err(|err| UpdateError::Git(format!("failed to run git: {err}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let message = format_git_error(&output);
            log::debug!("git {:?} failed: {}", args, message);
            Err(classify_git_error(&message))
        }
    }

    /// Runs a git subcommand, swallowing any failure.
    pub fn git_ok(&self, args: &[&str]) -> Option<String> {
        self.git(args).ok()
    }

    /// Recomputes the working tree snapshot.
    pub fn status(&self) -> Result<GitStatus> {
        let current_branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let porcelain = self.git(&["status", "--porcelain"])?;
        let uncommitted_files = parse::porcelain_paths(&porcelain);

        Ok(GitStatus {
            current_branch,
            is_clean: uncommitted_files.is_empty(),
            uncommitted_count: uncommitted_files.len(),
            uncommitted_files,
        })
    }

    pub fn head_sha(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }
}
