//! Collaborator seams invoked by the effect runner.
//!
//! Backup creation, archive restore, and dependency installation live
//! outside the engine; the runner only sees these traits.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::error::{Result, UpdateError};
use super::progress::{OperationProgress, UpdatePhase};

/// Produces a backup archive before destructive operations.
pub trait BackupProducer: Send + Sync {
    /// Creates a backup and returns the archive path.
    fn create_backup(&self) -> Result<PathBuf>;
}

/// Extracts user-owned content from a backup archive into the working tree.
pub trait RestoreConsumer: Send + Sync {
    /// Restores the archive contents and returns the restored paths.
    fn restore(&self, archive: &Path) -> Result<Vec<String>>;
}

/// Installs project dependencies after a successful update.
#[async_trait]
pub trait DependencyInstaller: Send + Sync {
    async fn install(&self, progress: &OperationProgress) -> Result<()>;
}

/// Spawns the configured install command and streams its output into the
/// progress channel.
pub struct CommandInstaller {
    cwd: PathBuf,
    command: Vec<String>,
}

impl CommandInstaller {
    pub fn new(cwd: impl Into<PathBuf>, command: Vec<String>) -> Self {
        Self {
            cwd: cwd.into(),
            command,
        }
    }
}

#[async_trait]
impl DependencyInstaller for CommandInstaller {
    async fn install(&self, progress: &OperationProgress) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(UpdateError::Install("install command is empty".to_string()));
        };

        log::info!("Running install command: {}", self.command.join(" "));

        let mut child = Command::new(program)
            .current_dir(&self.cwd)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| UpdateError::Install(format!("failed to spawn {program}: {err}")))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_task = async {
            if let Some(stdout) = stdout_pipe {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    progress.output(UpdatePhase::Installing, &line);
                }
            }
        };

        let stderr_task = async {
            let mut collected = Vec::new();
            if let Some(stderr) = stderr_pipe {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    progress.output(UpdatePhase::Installing, &line);
                    collected.push(line);
                }
            }
            collected
        };

        let ((), stderr_lines) = tokio::join!(stdout_task, stderr_task);

        let status = child
            .wait()
            .await
            .map_err(|err| UpdateError::Install(err.to_string()))?;

        if status.success() {
            Ok(())
        } else if stderr_lines.is_empty() {
            Err(UpdateError::Install(format!(
                "exit code {}",
                status.code().unwrap_or(-1)
            )))
        } else {
            Err(UpdateError::Install(stderr_lines.join("\n")))
        }
    }
}
