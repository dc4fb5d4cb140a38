//! Conflict classification and user-content auto-resolution.

use super::git::{parse, GitGateway};
use crate::content::is_user_content;

/// Strict partition of conflicting paths by ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSplit {
    /// Paths the user owns; resolvable by keeping the local version.
    pub user_files: Vec<String>,
    /// Paths the template owns; left for manual resolution.
    pub theme_files: Vec<String>,
}

/// Partitions conflicting paths into user content and template content.
pub fn classify_conflicts(files: &[String]) -> ConflictSplit {
    let mut split = ConflictSplit::default();
    for file in files {
        if is_user_content(file) {
            split.user_files.push(file.clone());
        } else {
            split.theme_files.push(file.clone());
        }
    }
    split
}

/// Paths currently in conflict.
///
/// Reads the unmerged diff filter first; falls back to porcelain status
/// codes when that reports nothing (rebase stops do, occasionally).
pub fn conflict_files(gateway: &GitGateway) -> Vec<String> {
    let diff = gateway
        .git_ok(&["diff", "--name-only", "--diff-filter=U"])
        .unwrap_or_default();

    let mut files: Vec<String> = diff
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if files.is_empty() {
        let status = gateway.git_ok(&["status", "--porcelain"]).unwrap_or_default();
        files = parse::porcelain_conflicts(&status);
    }

    let mut unique = Vec::with_capacity(files.len());
    for file in files {
        if !unique.contains(&file) {
            unique.push(file);
        }
    }
    unique
}

/// Forces the local version of each path into the index.
///
/// Returns the paths that could not be staged; their conflict markers are
/// restored so manual resolution still sees both sides.
pub fn auto_resolve_user_content(gateway: &GitGateway, files: &[String]) -> Vec<String> {
    let mut failed = Vec::new();

    for file in files {
        let checked_out = gateway
            .git_ok(&["checkout", "--ours", "--", file])
            .is_some();
        let staged = checked_out && gateway.git_ok(&["add", "--", file]).is_some();

        if !staged {
            if checked_out {
                let _ = gateway.git_ok(&["checkout", "-m", "--", file]);
            }
            log::warn!("Could not auto-resolve '{file}'");
            failed.push(file.clone());
        }
    }

    failed
}
