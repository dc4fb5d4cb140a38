//! Update-specific error types.

use thiserror::Error;

/// Errors that can occur during an update run.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Upstream remote points at '{current_url}', expected '{expected}'; fix the remote manually")]
    RemoteMismatch {
        current_url: String,
        expected: String,
    },

    #[error("Upstream remote is not configured; check mode cannot add it")]
    RemoteMissing,

    #[error("Failed to add upstream remote")]
    RemoteAddFailed,

    #[error("Failed to fetch upstream: {0}")]
    Fetch(String),

    #[error("Tag '{tag}' does not exist{}", recent_hint(.recent))]
    TagNotFound { tag: String, recent: Vec<String> },

    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("Unresolved conflicts in: {}", .files.join(", "))]
    Conflict { files: Vec<String> },

    #[error("Downgrade failed: {0}")]
    Downgrade(String),

    #[error("Clean restore failed: {0}")]
    CleanRestore(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Dependency install failed: {0}")]
    Install(String),

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("Git network error: {0}")]
    GitNetwork(String),

    #[error("Git authentication failed: {0}")]
    GitAuth(String),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

fn recent_hint(recent: &[String]) -> String {
    if recent.is_empty() {
        String::new()
    } else {
        format!(". Recent tags: {}", recent.join(", "))
    }
}

impl UpdateError {
    /// Returns true if the error is likely transient and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpdateError::GitNetwork(_) | UpdateError::Fetch(_))
    }
}

/// Classifies a git stderr string into a more specific error variant.
pub fn classify_git_error(stderr: &str) -> UpdateError {
    let lower = stderr.to_lowercase();

    if lower.contains("could not resolve host")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("network is unreachable")
        || lower.contains("unable to access")
        || lower.contains("failed to connect")
        || lower.contains("couldn't connect to server")
        || lower.contains("the remote end hung up unexpectedly")
    {
        return UpdateError::GitNetwork(stderr.trim().to_string());
    }

    if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("invalid credentials")
    {
        return UpdateError::GitAuth(stderr.trim().to_string());
    }

    UpdateError::Git(stderr.trim().to_string())
}

/// Result type for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_network_error() {
        let err = classify_git_error("fatal: Could not resolve host: github.com");
        assert!(matches!(err, UpdateError::GitNetwork(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_auth_error() {
        let err = classify_git_error("fatal: Authentication failed for 'https://...'");
        assert!(matches!(err, UpdateError::GitAuth(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_generic_error() {
        let err = classify_git_error("error: pathspec 'nope' did not match any file(s)");
        assert!(matches!(err, UpdateError::Git(_)));
    }

    #[test]
    fn test_tag_not_found_hint() {
        let err = UpdateError::TagNotFound {
            tag: "v9.9.9".to_string(),
            recent: vec!["v2.1.0".to_string(), "v2.0.0".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Tag 'v9.9.9' does not exist. Recent tags: v2.1.0, v2.0.0"
        );

        let bare = UpdateError::TagNotFound {
            tag: "v9.9.9".to_string(),
            recent: vec![],
        };
        assert_eq!(bare.to_string(), "Tag 'v9.9.9' does not exist");
    }
}
