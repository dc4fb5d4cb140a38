//! Shared fixtures: a real upstream/local repository pair plus collaborator
//! fakes for the effect runner.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use tempfile::TempDir;
use themeup::config::UpstreamConfig;
use themeup::update::{
    BackupProducer, DependencyInstaller, OperationProgress, RestoreConsumer, UpdateError,
};

/// Runs a git command, panicking with stderr on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn read_file(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap()
}

pub fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-m", message]);
}

fn configure(dir: &Path) {
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// An upstream theme repository at v1.0.0 and a local checkout cloned from
/// it, with the upstream remote already configured.
pub struct Fixture {
    pub upstream: TempDir,
    pub local: TempDir,
    pub config: UpstreamConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let upstream = TempDir::new().unwrap();
        let up = upstream.path();
        git(up, &["init"]);
        configure(up);
        write_file(up, "package.json", r#"{"name":"demo-theme","version":"1.0.0"}"#);
        write_file(up, "src/layouts/Base.astro", "<!-- layout v1 -->\n");
        write_file(up, "src/components/Legacy.astro", "<!-- legacy -->\n");
        write_file(up, "src/content/blog/welcome.md", "# Welcome\n\ntemplate copy\n");
        write_file(up, "config/site.yaml", "title: Demo\n");
        commit_all(up, "theme v1.0.0");
        git(up, &["branch", "-M", "main"]);
        git(up, &["tag", "v1.0.0"]);

        let local = TempDir::new().unwrap();
        git(local.path(), &["clone", up.to_str().unwrap(), "."]);
        configure(local.path());
        git(local.path(), &["remote", "add", "upstream", up.to_str().unwrap()]);

        let config = UpstreamConfig {
            url: up.to_string_lossy().into_owned(),
            ..Default::default()
        };

        Self {
            upstream,
            local,
            config,
        }
    }

    pub fn upstream_path(&self) -> &Path {
        self.upstream.path()
    }

    pub fn local_path(&self) -> &Path {
        self.local.path()
    }

    /// Publishes v2.0.0 upstream: reworked layout, legacy component dropped.
    pub fn publish_v2(&self) {
        let up = self.upstream_path();
        write_file(up, "package.json", r#"{"name":"demo-theme","version":"2.0.0"}"#);
        write_file(up, "src/layouts/Base.astro", "<!-- layout v2 -->\n");
        git(up, &["rm", "--quiet", "src/components/Legacy.astro"]);
        commit_all(up, "theme v2.0.0");
        git(up, &["tag", "v2.0.0"]);
    }

    pub fn fetch_local(&self) {
        git(self.local_path(), &["fetch", "--tags", "upstream"]);
    }

    pub fn local_head(&self) -> String {
        git(self.local_path(), &["rev-parse", "HEAD"])
    }

    pub fn local_subject(&self) -> String {
        git(self.local_path(), &["log", "-1", "--pretty=%s"])
    }
}

/// Backup producer returning a fixed archive path without writing anything.
pub struct StaticBackup(pub PathBuf);

impl BackupProducer for StaticBackup {
    fn create_backup(&self) -> themeup::update::Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// Restore consumer that restores nothing.
pub struct NoopRestore;

impl RestoreConsumer for NoopRestore {
    fn restore(&self, _archive: &Path) -> themeup::update::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Restore consumer writing fixed files into the working tree.
pub struct ScriptedRestore {
    pub root: PathBuf,
    pub files: Vec<(String, String)>,
}

impl RestoreConsumer for ScriptedRestore {
    fn restore(&self, _archive: &Path) -> themeup::update::Result<Vec<String>> {
        for (rel, content) in &self.files {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        Ok(self.files.iter().map(|(rel, _)| rel.clone()).collect())
    }
}

/// Restore consumer that always fails, before touching the tree.
pub struct FailingRestore;

impl RestoreConsumer for FailingRestore {
    fn restore(&self, _archive: &Path) -> themeup::update::Result<Vec<String>> {
        Err(UpdateError::CleanRestore("archive is corrupt".to_string()))
    }
}

/// Installer that succeeds without running anything.
pub struct NoopInstaller;

#[async_trait]
impl DependencyInstaller for NoopInstaller {
    async fn install(&self, _progress: &OperationProgress) -> themeup::update::Result<()> {
        Ok(())
    }
}
