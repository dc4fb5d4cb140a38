//! Engine configuration: upstream description and per-run options.
//!
//! Both are captured once at the start of a run and threaded explicitly;
//! nothing in the engine reads ambient global state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_remote_name() -> String {
    "upstream".to_string()
}

fn default_main_branch() -> String {
    "main".to_string()
}

fn default_manifest_file() -> String {
    "package.json".to_string()
}

fn default_install_command() -> Vec<String> {
    vec!["pnpm".to_string(), "install".to_string()]
}

/// Describes the upstream template repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamConfig {
    /// Name of the git remote pointing at the template repository.
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
    /// Remote URL of the template repository.
    pub url: String,
    /// `owner/repo` slug used for release metadata lookups. Empty disables them.
    #[serde(default)]
    pub repo_slug: String,
    /// Primary branch of the upstream repository.
    #[serde(default = "default_main_branch")]
    pub main_branch: String,
    /// Manifest file carrying the template version.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// Command run to install dependencies after a successful update.
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            remote_name: default_remote_name(),
            url: String::new(),
            repo_slug: String::new(),
            main_branch: default_main_branch(),
            manifest_file: default_manifest_file(),
            install_command: default_install_command(),
        }
    }
}

impl UpstreamConfig {
    /// The remote-tracking reference of the upstream main line, e.g. `upstream/main`.
    pub fn main_ref(&self) -> String {
        format!("{}/{}", self.remote_name, self.main_branch)
    }
}

/// Loads and validates an [`UpstreamConfig`] from a YAML file.
pub fn load_upstream_config(path: &Path) -> std::result::Result<UpstreamConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let config: UpstreamConfig = serde_yaml::from_str(&content)?;
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "upstream url must not be empty".to_string(),
        ));
    }

    Ok(config)
}

/// Per-run flags, captured once when a run begins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOptions {
    /// Inspect only; no fetch, no merge, no writes.
    pub check_only: bool,
    /// Skip the backup step (rejected in rebase and clean modes).
    pub skip_backup: bool,
    /// Bypass the dirty-tree block and the backup prompt.
    pub force: bool,
    /// Update to a specific tag instead of the upstream main line.
    pub target_tag: Option<String>,
    /// Replay local commits on top of the upstream history.
    pub rebase: bool,
    /// Stop after the preview without touching the repository.
    pub dry_run: bool,
    /// Replace the tree with the upstream state, then restore user content.
    pub clean: bool,
}

impl UpdateOptions {
    /// Rejects option combinations the strategies cannot honor.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.rebase && self.clean {
            return Err(ConfigError::Validation(
                "rebase and clean modes are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}
