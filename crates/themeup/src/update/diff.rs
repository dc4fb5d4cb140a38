//! Divergence analysis between the local checkout and an upstream target.

use serde::{Deserialize, Serialize};

use super::git::{parse, CommitInfo, GitGateway};
use super::remote::RemoteSync;
use super::version::{self, normalize_tag, strip_tag, UNKNOWN_VERSION};
use crate::config::UpstreamConfig;

/// Snapshot of the divergence, derived entirely from gateway queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub has_upstream: bool,
    /// Commits on the target side of the symmetric difference.
    pub behind_count: u32,
    /// Commits on the local side of the symmetric difference.
    pub ahead_count: u32,
    /// Incoming commits for an upgrade, outgoing ones for a downgrade.
    pub commits: Vec<CommitInfo>,
    /// Local commits not reachable from the target.
    pub local_commits: Vec<CommitInfo>,
    pub current_version: String,
    pub latest_version: String,
    /// True iff a target tag was given that is a strict ancestor of HEAD
    /// (`ahead > 0 && behind == 0`). A force-pushed upstream that diverged
    /// can present the same shape and be misreported as a downgrade.
    pub is_downgrade: bool,
}

/// Computes [`UpdateInfo`] for a repository.
pub struct DiffAnalyzer<'a> {
    gateway: &'a GitGateway,
    config: &'a UpstreamConfig,
}

impl<'a> DiffAnalyzer<'a> {
    pub fn new(gateway: &'a GitGateway, config: &'a UpstreamConfig) -> Self {
        Self { gateway, config }
    }

    /// Resolves the comparison reference: a normalized tag, or the upstream
    /// main line when no tag was requested.
    pub fn target_ref(&self, target_tag: Option<&str>) -> String {
        match target_tag {
            Some(tag) => normalize_tag(tag),
            None => self.config.main_ref(),
        }
    }

    /// Analyzes the divergence between HEAD and the target reference.
    ///
    /// Without an upstream remote this degrades to a zeroed snapshot with an
    /// unknown latest version; it never fails.
    pub fn update_info(&self, target_tag: Option<&str>) -> UpdateInfo {
        let current_version = version::local_version(self.gateway, self.config);

        let remote = RemoteSync::new(self.gateway, self.config);
        if !remote.has_upstream_remote() {
            return UpdateInfo {
                has_upstream: false,
                behind_count: 0,
                ahead_count: 0,
                commits: Vec::new(),
                local_commits: Vec::new(),
                current_version,
                latest_version: UNKNOWN_VERSION.to_string(),
                is_downgrade: false,
            };
        }

        let normalized_tag = target_tag.map(normalize_tag);
        let target_ref = self.target_ref(target_tag);

        let (ahead_count, behind_count) = self.ahead_behind(&target_ref);
        let is_downgrade = downgrade_heuristic(normalized_tag.is_some(), ahead_count, behind_count);

        let incoming_range = format!("HEAD..{target_ref}");
        let outgoing_range = format!("{target_ref}..HEAD");
        let commits_range = if is_downgrade {
            &outgoing_range
        } else {
            &incoming_range
        };
        let commits = self.log_range(commits_range);
        let local_commits = self.log_range(&outgoing_range);

        let latest_version = match &normalized_tag {
            Some(tag) => strip_tag(tag),
            None => version::ref_version(self.gateway, self.config, &self.config.main_ref())
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        };

        UpdateInfo {
            has_upstream: true,
            behind_count,
            ahead_count,
            commits,
            local_commits,
            current_version,
            latest_version,
            is_downgrade,
        }
    }

    /// Symmetric-difference commit counts via `rev-list --left-right --count`.
    fn ahead_behind(&self, target_ref: &str) -> (u32, u32) {
        let range = format!("HEAD...{target_ref}");
        let output = self
            .gateway
            .git_ok(&["rev-list", "--left-right", "--count", &range])
            .unwrap_or_default();

        let mut parts = output.split_whitespace();
        let ahead = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);
        let behind = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);
        (ahead, behind)
    }

    fn log_range(&self, range: &str) -> Vec<CommitInfo> {
        let format = format!("--pretty=format:{}", parse::LOG_FORMAT);
        let output = self
            .gateway
            .git_ok(&["log", range, &format, "--no-merges"])
            .unwrap_or_default();
        parse::parse_commits(&output)
    }
}

/// A run is a downgrade iff a tag was requested and HEAD is strictly ahead
/// of it with nothing incoming.
pub(crate) fn downgrade_heuristic(tag_given: bool, ahead: u32, behind: u32) -> bool {
    tag_given && ahead > 0 && behind == 0
}
