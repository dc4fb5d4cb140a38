//! Update strategies: rebase, downgrade, clean replace, and regular merge.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::conflicts::{self, classify_conflicts};
use super::error::{Result, UpdateError};
use super::git::GitGateway;
use super::remote::RemoteSync;
use super::version::{self, normalize_tag};
use crate::config::UpstreamConfig;
use crate::content::is_user_content;

/// Batch size for `git rm`, bounded to keep argument lists under ARG_MAX.
const RM_BATCH_SIZE: usize = 100;
/// Merge commits inspected when probing for prior upstream merge history.
const MERGE_HISTORY_WINDOW: &str = "-20";

/// Strategy selection for one merge attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub target_tag: Option<String>,
    pub is_downgrade: bool,
    pub rebase: bool,
    pub clean: bool,
}

/// Outcome of a merge attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub success: bool,
    pub has_conflict: bool,
    pub conflict_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Conflicts raised mid-rebase; resolution continues with
    /// `rebase --continue`, not `commit`.
    pub is_rebase_conflict: bool,
    /// User-content conflicts resolved by keeping the local version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resolved_files: Option<Vec<String>>,
    /// Commit that existed before the clean sequence began; the sole
    /// rollback anchor for the restore step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_clean_sha: Option<String>,
}

impl MergeResult {
    fn succeeded() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Default::default()
        }
    }
}

/// Runs one of the four update strategies against the repository.
pub struct MergeExecutor<'a> {
    gateway: &'a GitGateway,
    config: &'a UpstreamConfig,
}

impl<'a> MergeExecutor<'a> {
    pub fn new(gateway: &'a GitGateway, config: &'a UpstreamConfig) -> Self {
        Self { gateway, config }
    }

    /// Applies the selected strategy. Priority: rebase, then downgrade, then
    /// clean, then regular merge. Never returns an error; failures are
    /// folded into the [`MergeResult`].
    pub fn merge_upstream(&self, options: &MergeOptions) -> MergeResult {
        let normalized_tag = options.target_tag.as_deref().map(normalize_tag);
        let target_ref = normalized_tag
            .clone()
            .unwrap_or_else(|| self.config.main_ref());

        log::info!(
            "Merging upstream (target {target_ref}, rebase={}, clean={}, downgrade={})",
            options.rebase,
            options.clean,
            options.is_downgrade
        );

        let attempt = if options.rebase {
            self.gateway
                .git(&["rebase", &target_ref])
                .map(|_| MergeResult::succeeded())
        } else if options.is_downgrade && normalized_tag.is_some() {
            self.downgrade(normalized_tag.as_deref().unwrap_or(&target_ref))
        } else if options.clean {
            self.clean_replace(&target_ref, normalized_tag.as_deref())
        } else {
            self.regular_merge(&target_ref, normalized_tag.as_deref())
        };

        match attempt {
            Ok(result) => result,
            Err(err) => self.handle_failure(options, err),
        }
    }

    /// Replaces the working tree with the tagged state and commits the
    /// difference forward, keeping history intact.
    fn downgrade(&self, tag: &str) -> Result<MergeResult> {
        self.gateway.git(&["checkout", tag, "--", "."])?;

        let status = self.gateway.git(&["status", "--porcelain"])?;
        if !status.trim().is_empty() {
            let message = format!("Downgrade to {tag}");
            self.gateway.git(&["commit", "-m", &message])?;
        }

        Ok(MergeResult::succeeded())
    }

    /// Records an `ours` merge, overwrites the tree with the target state,
    /// drops template files deleted upstream, and amends everything into the
    /// merge commit.
    fn clean_replace(&self, target_ref: &str, normalized_tag: Option<&str>) -> Result<MergeResult> {
        let pre_clean_sha = self.gateway.head_sha()?;

        let version_info = self.version_info(target_ref, normalized_tag);
        let message = format!("chore: clean update to {version_info}");
        self.gateway.git(&[
            "merge",
            "-s",
            "ours",
            "--no-ff",
            "--allow-unrelated-histories",
            target_ref,
            "-m",
            &message,
        ])?;

        self.gateway.git(&["checkout", target_ref, "--", "."])?;
        self.remove_deleted_upstream_files(target_ref);
        self.gateway.git(&["add", "-A"])?;
        self.gateway.git(&["commit", "--amend", "--no-edit"])?;

        Ok(MergeResult {
            success: true,
            pre_clean_sha: Some(pre_clean_sha),
            ..Default::default()
        })
    }

    fn regular_merge(&self, target_ref: &str, normalized_tag: Option<&str>) -> Result<MergeResult> {
        let version_info = self.version_info(target_ref, normalized_tag);
        let message = format!("chore: merge upstream theme {version_info}");
        self.gateway.git(&[
            "merge",
            "--no-ff",
            "--allow-unrelated-histories",
            target_ref,
            "-m",
            &message,
        ])?;
        Ok(MergeResult::succeeded())
    }

    /// Version label for merge commit messages: the tag, the manifest
    /// version at the target, or the literal `latest`.
    fn version_info(&self, target_ref: &str, normalized_tag: Option<&str>) -> String {
        if let Some(tag) = normalized_tag {
            return tag.to_string();
        }
        version::ref_version(self.gateway, self.config, target_ref)
            .map(|v| format!("v{v}"))
            .unwrap_or_else(|| "latest".to_string())
    }

    /// Deletes tracked template files absent from the target, in bounded
    /// batches. User content is never touched; individual batch failures
    /// are tolerated.
    fn remove_deleted_upstream_files(&self, target_ref: &str) {
        let local = self.gateway.git_ok(&["ls-files"]).unwrap_or_default();
        let upstream = self
            .gateway
            .git_ok(&["ls-tree", "-r", "--name-only", target_ref])
            .unwrap_or_default();

        let upstream_set: HashSet<&str> = upstream
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let to_remove: Vec<&str> = local
            .lines()
            .map(str::trim)
            .filter(|file| {
                !file.is_empty() && !upstream_set.contains(file) && !is_user_content(file)
            })
            .collect();

        if to_remove.is_empty() {
            return;
        }
        log::info!("Removing {} file(s) deleted upstream", to_remove.len());

        for chunk in to_remove.chunks(RM_BATCH_SIZE) {
            let mut args = vec!["rm", "--quiet", "--"];
            args.extend_from_slice(chunk);
            if self.gateway.git_ok(&args).is_none() {
                log::warn!("Failed to remove a batch of {} file(s)", chunk.len());
            }
        }
    }

    /// Inspects a failed attempt for conflicts and routes them per strategy.
    fn handle_failure(&self, options: &MergeOptions, err: UpdateError) -> MergeResult {
        if options.is_downgrade {
            return MergeResult::failed(err.to_string());
        }

        let conflict_files = conflicts::conflict_files(self.gateway);
        if conflict_files.is_empty() {
            return MergeResult::failed(err.to_string());
        }

        if options.rebase || options.clean {
            return MergeResult {
                has_conflict: true,
                conflict_files,
                is_rebase_conflict: options.rebase,
                ..Default::default()
            };
        }

        self.auto_resolve(conflict_files)
    }

    /// Regular-merge conflict handling: keep the local version of user
    /// content, complete the merge when nothing template-owned remains.
    fn auto_resolve(&self, conflict_files: Vec<String>) -> MergeResult {
        let split = classify_conflicts(&conflict_files);
        let mut theme_files = split.theme_files;

        let failed = if split.user_files.is_empty() {
            Vec::new()
        } else {
            conflicts::auto_resolve_user_content(self.gateway, &split.user_files)
        };
        let resolved: Vec<String> = split
            .user_files
            .iter()
            .filter(|file| !failed.contains(file))
            .cloned()
            .collect();
        theme_files.extend(failed);

        if theme_files.is_empty() && self.gateway.git_ok(&["commit", "--no-edit"]).is_some() {
            log::info!("Auto-resolved {} user-content conflict(s)", resolved.len());
            return MergeResult {
                success: true,
                auto_resolved_files: Some(resolved),
                ..Default::default()
            };
        }

        MergeResult {
            has_conflict: true,
            conflict_files: theme_files,
            auto_resolved_files: if resolved.is_empty() {
                None
            } else {
                Some(resolved)
            },
            ..Default::default()
        }
    }

    /// Abandons an in-progress merge, restoring the pre-merge state.
    pub fn abort_merge(&self) -> bool {
        self.gateway.git_ok(&["merge", "--abort"]).is_some()
    }

    /// Abandons an in-progress rebase.
    pub fn abort_rebase(&self) -> bool {
        self.gateway.git_ok(&["rebase", "--abort"]).is_some()
    }

    /// True when the normalized form of `tag` exists locally.
    pub fn tag_exists(&self, tag: &str) -> bool {
        let refname = format!("refs/tags/{}", normalize_tag(tag));
        self.gateway
            .git_ok(&["show-ref", "--verify", "--quiet", &refname])
            .is_some()
    }

    /// Most recently created version tags, newest first.
    pub fn recent_tags(&self, limit: usize) -> Vec<String> {
        self.gateway
            .git_ok(&["tag", "--sort=-creatordate", "--list", "v*"])
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(limit)
            .map(str::to_string)
            .collect()
    }

    /// True when a recent merge commit has a non-first parent reachable from
    /// the upstream main line, i.e. regular merges have been used before.
    /// A checkout updated only through squash merges has no such parent.
    pub fn has_upstream_merge_history(&self) -> bool {
        let remote = RemoteSync::new(self.gateway, self.config);
        if !remote.has_tracking_ref() {
            return false;
        }

        let main_ref = self.config.main_ref();
        let Some(merges) = self
            .gateway
            .git_ok(&["log", "--merges", "--format=%P", MERGE_HISTORY_WINDOW, "HEAD"])
        else {
            return false;
        };

        for line in merges.lines() {
            for parent in line.split_whitespace().skip(1) {
                // Exit code carries the answer; stdout is empty either way.
                if self
                    .gateway
                    .git_ok(&["merge-base", "--is-ancestor", parent, &main_ref])
                    .is_some()
                {
                    return true;
                }
            }
        }

        false
    }
}
