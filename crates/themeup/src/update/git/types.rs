//! Snapshot types read back from git.

use serde::{Deserialize, Serialize};

/// Working tree snapshot, recomputed at the start of every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub current_branch: String,
    pub is_clean: bool,
    pub uncommitted_count: usize,
    pub uncommitted_files: Vec<String>,
}

/// One `git log` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub date: String,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_status_serializes_camel_case() {
        let status = GitStatus {
            current_branch: "main".to_string(),
            is_clean: false,
            uncommitted_count: 1,
            uncommitted_files: vec!["src/pages/about.md".to_string()],
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"currentBranch\":\"main\""));
        assert!(json.contains("\"uncommittedCount\":1"));
    }
}
