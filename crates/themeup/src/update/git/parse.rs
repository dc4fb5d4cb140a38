//! Git output parsing helpers.

use std::process::Output;

use super::types::CommitInfo;

/// Log format matching [`parse_commits`]: abbreviated hash, subject,
/// relative date, author.
pub const LOG_FORMAT: &str = "%h|%s|%ar|%an";

/// Formats a git error with both stdout and stderr for better debugging.
pub fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

/// Parses `git log` output produced with [`LOG_FORMAT`].
pub fn parse_commits(output: &str) -> Vec<CommitInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(4, '|');
            Some(CommitInfo {
                hash: parts.next()?.to_string(),
                message: parts.next()?.to_string(),
                date: parts.next()?.to_string(),
                author: parts.next()?.to_string(),
            })
        })
        .collect()
}

/// Paths from `status --porcelain` output, status columns stripped.
pub fn porcelain_paths(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.get(3..))
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect()
}

/// Conflicted paths from `status --porcelain` output.
///
/// A path is in conflict when either status column is `U`, or both sides
/// added (`AA`) or both deleted (`DD`) it.
pub fn porcelain_conflicts(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let code = line.get(..2)?;
            if code.contains('U') || code == "AA" || code == "DD" {
                line.get(3..).map(|path| path.trim().to_string())
            } else {
                None
            }
        })
        .filter(|path| !path.is_empty())
        .collect()
}
