//! Best-effort release metadata lookups against the GitHub releases API.
//!
//! Metadata is decoration for the preview. Lookups are bounded by a short
//! timeout and every failure collapses to `None`; the update flow never
//! depends on the network being reachable.

use std::time::Duration;

use serde::Deserialize;

use crate::update::version::normalize_tag;

const RELEASE_API_TIMEOUT: Duration = Duration::from_secs(3);
const USER_AGENT: &str = concat!("themeup/", env!("CARGO_PKG_VERSION"));

/// Release metadata for a tag, as returned by the releases API.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(rename = "html_url")]
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// Fetches release metadata for `version` from `owner/repo`.
///
/// Returns `None` on any failure: empty slug, timeout, non-success status,
/// or an unparseable payload.
pub async fn fetch_release_info(repo_slug: &str, version: &str) -> Option<ReleaseInfo> {
    if repo_slug.trim().is_empty() {
        return None;
    }

    let tag = normalize_tag(version);
    let api_url = format!("https://api.github.com/repos/{repo_slug}/releases/tags/{tag}");

    let client = reqwest::Client::builder()
        .timeout(RELEASE_API_TIMEOUT)
        .build()
        .ok()?;

    let response = client
        .get(&api_url)
        .header("Accept", "application/vnd.github.v3+json")
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        log::debug!("Release lookup for {tag} returned {}", response.status());
        return None;
    }

    response.json::<ReleaseInfo>().await.ok()
}

/// Web URL of a release page, built without touching the API.
pub fn release_url(repo_slug: &str, version: &str) -> String {
    format!(
        "https://github.com/{repo_slug}/releases/tag/{}",
        normalize_tag(version)
    )
}

/// Extracts a short plain-text summary from release notes markdown.
///
/// Keeps at most `max_lines` non-empty lines with heading markers stripped,
/// truncated to `max_chars` characters overall.
pub fn release_summary(body: &str, max_lines: usize, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut used = 0usize;

    for raw in body.lines() {
        let line = raw.trim_start_matches('#').trim();
        if line.is_empty() {
            continue;
        }
        if lines.len() == max_lines || used + line.len() > max_chars {
            lines.push("...".to_string());
            break;
        }
        used += line.len();
        lines.push(line.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_url_normalizes_tag() {
        assert_eq!(
            release_url("acme/theme", "2.1.0"),
            "https://github.com/acme/theme/releases/tag/v2.1.0"
        );
        assert_eq!(
            release_url("acme/theme", "v2.1.0"),
            "https://github.com/acme/theme/releases/tag/v2.1.0"
        );
    }

    #[test]
    fn test_summary_strips_headings_and_blanks() {
        let body = "## Highlights\n\n- faster builds\n- new shortcodes\n";
        let summary = release_summary(body, 5, 300);
        assert_eq!(summary, vec!["Highlights", "- faster builds", "- new shortcodes"]);
    }

    #[test]
    fn test_summary_truncates_line_count() {
        let body = "a\nb\nc\nd";
        let summary = release_summary(body, 2, 300);
        assert_eq!(summary, vec!["a", "b", "..."]);
    }

    #[test]
    fn test_summary_truncates_on_length() {
        let body = "short\nthis line is far too long to fit";
        let summary = release_summary(body, 5, 10);
        assert_eq!(summary, vec!["short", "..."]);
    }

    #[test]
    fn test_summary_of_empty_body() {
        assert!(release_summary("", 5, 300).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_with_empty_slug_is_none() {
        assert!(fetch_release_info("", "v1.0.0").await.is_none());
    }
}
