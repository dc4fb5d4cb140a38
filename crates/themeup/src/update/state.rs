//! The update state machine.
//!
//! `reduce` is a pure function over closed sum types. Effects and user
//! decisions feed it events; it never performs IO and never fails. Events
//! that make no sense in the current state move the input state back out
//! unchanged.

use serde::{Deserialize, Serialize};

use super::diff::UpdateInfo;
use super::git::GitStatus;
use super::merge::MergeResult;
use super::version::UNKNOWN_VERSION;
use crate::config::UpdateOptions;

/// Phases of the update flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStatus {
    Checking,
    DirtyWarning,
    BackupConfirm,
    BackingUp,
    Fetching,
    Preview,
    Merging,
    CleanRestoring,
    Installing,
    Done,
    Conflict,
    UpToDate,
    Error,
}

impl UpdateStatus {
    /// Terminal states absorb every event except a late error.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::DirtyWarning | Self::Done | Self::Conflict | Self::UpToDate | Self::Error
        )
    }

    /// Decision states wait for a caller-dispatched event; they have no effect.
    pub fn is_decision(self) -> bool {
        matches!(self, Self::BackupConfirm | Self::Preview)
    }
}

/// Full machine state. Exactly one instance exists per run; every
/// transition consumes it and returns the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateState {
    pub status: UpdateStatus,
    pub git_status: Option<GitStatus>,
    pub update_info: Option<UpdateInfo>,
    pub merge_result: Option<MergeResult>,
    /// Backup archive path, empty until the backup completes.
    pub backup_file: String,
    pub error: String,
    /// Non-empty when the run started on a branch other than the primary one.
    pub branch_warning: String,
    pub options: UpdateOptions,
    /// Squash-merge history detected; a one-time full merge is advised.
    pub needs_migration: bool,
    pub restored_files: Vec<String>,
    /// Branch updates are expected to run on; captured at creation.
    pub primary_branch: String,
}

/// Events feeding the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    /// Working tree probe finished.
    GitChecked(GitStatus),
    /// Fetch and divergence analysis finished.
    Fetched {
        info: UpdateInfo,
        needs_migration: bool,
    },
    /// User confirmed the backup.
    BackupConfirm,
    /// User declined the backup.
    BackupSkip,
    /// Backup archive written.
    BackupDone { backup_file: String },
    /// User confirmed the preview.
    UpdateConfirm,
    /// Merge strategy finished.
    Merged(MergeResult),
    /// Clean-mode restore finished.
    CleanRestored { restored_files: Vec<String> },
    /// Dependency install finished.
    Installed,
    /// Any effect failed.
    Error(String),
}

/// Initial state for one run.
pub fn create_initial_state(options: UpdateOptions, primary_branch: &str) -> UpdateState {
    UpdateState {
        status: UpdateStatus::Checking,
        git_status: None,
        update_info: None,
        merge_result: None,
        backup_file: String::new(),
        error: String::new(),
        branch_warning: String::new(),
        options,
        needs_migration: false,
        restored_files: Vec::new(),
        primary_branch: primary_branch.to_string(),
    }
}

/// Advances the machine by one event.
pub fn reduce(mut state: UpdateState, event: UpdateEvent) -> UpdateState {
    // The one cross-cutting transition: any state may fail.
    let event = match event {
        UpdateEvent::Error(error) => {
            state.status = UpdateStatus::Error;
            state.error = error;
            return state;
        }
        other => other,
    };

    match state.status {
        UpdateStatus::Checking => {
            let UpdateEvent::GitChecked(git_status) = event else {
                return state;
            };

            if git_status.current_branch != state.primary_branch {
                state.branch_warning = format!(
                    "on branch '{}', updates are meant to run on '{}'",
                    git_status.current_branch, state.primary_branch
                );
            }

            state.status = if !git_status.is_clean && !state.options.force {
                UpdateStatus::DirtyWarning
            } else {
                UpdateStatus::Fetching
            };
            state.git_status = Some(git_status);
            state
        }

        UpdateStatus::Fetching => {
            let UpdateEvent::Fetched {
                info,
                needs_migration,
            } = event
            else {
                return state;
            };

            let versions_match = info.current_version == info.latest_version
                && info.latest_version != UNKNOWN_VERSION;
            let has_changes =
                info.behind_count > 0 || (info.is_downgrade && info.ahead_count > 0);

            if versions_match || !has_changes {
                state.status = UpdateStatus::UpToDate;
                state.update_info = Some(info);
                return state;
            }

            // Rebase and clean rewrite or replace the tree; backup is not optional.
            let force_backup = state.options.rebase || state.options.clean;
            state.status = if force_backup {
                UpdateStatus::BackupConfirm
            } else if state.options.skip_backup || state.options.force {
                UpdateStatus::Preview
            } else {
                UpdateStatus::BackupConfirm
            };
            state.update_info = Some(info);
            state.needs_migration = needs_migration;
            state
        }

        UpdateStatus::BackupConfirm => match event {
            UpdateEvent::BackupConfirm => {
                state.status = UpdateStatus::BackingUp;
                state
            }
            UpdateEvent::BackupSkip => {
                // Skipping is only honored outside rebase/clean mode.
                if !state.options.rebase && !state.options.clean {
                    state.status = UpdateStatus::Preview;
                }
                state
            }
            _ => state,
        },

        UpdateStatus::BackingUp => {
            let UpdateEvent::BackupDone { backup_file } = event else {
                return state;
            };
            state.status = UpdateStatus::Preview;
            state.backup_file = backup_file;
            state
        }

        UpdateStatus::Preview => {
            if matches!(event, UpdateEvent::UpdateConfirm) {
                state.status = UpdateStatus::Merging;
            }
            state
        }

        UpdateStatus::Merging => {
            let UpdateEvent::Merged(result) = event else {
                return state;
            };

            if result.has_conflict {
                state.status = UpdateStatus::Conflict;
                state.merge_result = Some(result);
                return state;
            }

            if !result.success {
                state.status = UpdateStatus::Error;
                state.error = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "merge failed".to_string());
                state.merge_result = Some(result);
                return state;
            }

            state.status = if state.options.clean {
                UpdateStatus::CleanRestoring
            } else {
                UpdateStatus::Installing
            };
            state.merge_result = Some(result);
            state
        }

        UpdateStatus::CleanRestoring => {
            let UpdateEvent::CleanRestored { restored_files } = event else {
                return state;
            };
            state.status = UpdateStatus::Installing;
            state.restored_files = restored_files;
            state
        }

        UpdateStatus::Installing => {
            if matches!(event, UpdateEvent::Installed) {
                state.status = UpdateStatus::Done;
            }
            state
        }

        UpdateStatus::DirtyWarning
        | UpdateStatus::Done
        | UpdateStatus::Conflict
        | UpdateStatus::UpToDate
        | UpdateStatus::Error => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_status() -> GitStatus {
        GitStatus {
            current_branch: "main".to_string(),
            is_clean: true,
            uncommitted_count: 0,
            uncommitted_files: Vec::new(),
        }
    }

    fn dirty_status() -> GitStatus {
        GitStatus {
            current_branch: "main".to_string(),
            is_clean: false,
            uncommitted_count: 2,
            uncommitted_files: vec!["a.md".to_string(), "b.md".to_string()],
        }
    }

    fn behind_info() -> UpdateInfo {
        UpdateInfo {
            has_upstream: true,
            behind_count: 3,
            ahead_count: 0,
            commits: Vec::new(),
            local_commits: Vec::new(),
            current_version: "1.0.0".to_string(),
            latest_version: "1.2.0".to_string(),
            is_downgrade: false,
        }
    }

    fn initial(options: UpdateOptions) -> UpdateState {
        create_initial_state(options, "main")
    }

    fn fetched(info: UpdateInfo) -> UpdateEvent {
        UpdateEvent::Fetched {
            info,
            needs_migration: false,
        }
    }

    #[test]
    fn test_dirty_tree_blocks_without_force() {
        let state = initial(UpdateOptions::default());
        let next = reduce(state, UpdateEvent::GitChecked(dirty_status()));
        assert_eq!(next.status, UpdateStatus::DirtyWarning);
    }

    #[test]
    fn test_dirty_tree_proceeds_with_force() {
        let state = initial(UpdateOptions {
            force: true,
            ..Default::default()
        });
        let next = reduce(state, UpdateEvent::GitChecked(dirty_status()));
        assert_eq!(next.status, UpdateStatus::Fetching);
    }

    #[test]
    fn test_non_primary_branch_warns_but_proceeds() {
        let state = initial(UpdateOptions::default());
        let status = GitStatus {
            current_branch: "feature/x".to_string(),
            ..clean_status()
        };
        let next = reduce(state, UpdateEvent::GitChecked(status));
        assert_eq!(next.status, UpdateStatus::Fetching);
        assert!(next.branch_warning.contains("feature/x"));
    }

    #[test]
    fn test_matching_versions_short_circuit_to_up_to_date() {
        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::Fetching;

        let info = UpdateInfo {
            behind_count: 1,
            current_version: "1.2.0".to_string(),
            latest_version: "1.2.0".to_string(),
            ..behind_info()
        };
        let next = reduce(state, fetched(info));
        assert_eq!(next.status, UpdateStatus::UpToDate);
    }

    #[test]
    fn test_unknown_version_does_not_count_as_match() {
        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::Fetching;

        let info = UpdateInfo {
            current_version: "unknown".to_string(),
            latest_version: "unknown".to_string(),
            ..behind_info()
        };
        let next = reduce(state, fetched(info));
        assert_eq!(next.status, UpdateStatus::BackupConfirm);
    }

    #[test]
    fn test_no_changes_means_up_to_date() {
        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::Fetching;

        let info = UpdateInfo {
            behind_count: 0,
            ahead_count: 1,
            ..behind_info()
        };
        let next = reduce(state, fetched(info));
        assert_eq!(next.status, UpdateStatus::UpToDate);
    }

    #[test]
    fn test_downgrade_with_local_commits_counts_as_changes() {
        let mut state = initial(UpdateOptions {
            target_tag: Some("v1.0.0".to_string()),
            ..Default::default()
        });
        state.status = UpdateStatus::Fetching;

        let info = UpdateInfo {
            behind_count: 0,
            ahead_count: 2,
            is_downgrade: true,
            latest_version: "1.0.0".to_string(),
            ..behind_info()
        };
        let next = reduce(state, fetched(info));
        assert_eq!(next.status, UpdateStatus::BackupConfirm);
    }

    #[test]
    fn test_skip_backup_bypasses_confirmation() {
        let mut state = initial(UpdateOptions {
            skip_backup: true,
            ..Default::default()
        });
        state.status = UpdateStatus::Fetching;

        let next = reduce(state, fetched(behind_info()));
        assert_eq!(next.status, UpdateStatus::Preview);
    }

    #[test]
    fn test_rebase_forces_backup_confirmation() {
        for options in [
            UpdateOptions {
                rebase: true,
                skip_backup: true,
                ..Default::default()
            },
            UpdateOptions {
                clean: true,
                force: true,
                ..Default::default()
            },
        ] {
            let mut state = initial(options);
            state.status = UpdateStatus::Fetching;
            let next = reduce(state, fetched(behind_info()));
            assert_eq!(next.status, UpdateStatus::BackupConfirm);
        }
    }

    #[test]
    fn test_backup_skip_rejected_in_clean_mode() {
        let mut state = initial(UpdateOptions {
            clean: true,
            ..Default::default()
        });
        state.status = UpdateStatus::BackupConfirm;

        let next = reduce(state.clone(), UpdateEvent::BackupSkip);
        assert_eq!(next, state);
    }

    #[test]
    fn test_backup_skip_honored_in_merge_mode() {
        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::BackupConfirm;

        let next = reduce(state, UpdateEvent::BackupSkip);
        assert_eq!(next.status, UpdateStatus::Preview);
    }

    #[test]
    fn test_backup_done_records_archive() {
        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::BackingUp;

        let next = reduce(
            state,
            UpdateEvent::BackupDone {
                backup_file: "/backups/site-2026-01-01.tar".to_string(),
            },
        );
        assert_eq!(next.status, UpdateStatus::Preview);
        assert_eq!(next.backup_file, "/backups/site-2026-01-01.tar");
    }

    #[test]
    fn test_merge_outcomes_branch_three_ways() {
        let conflicted = MergeResult {
            has_conflict: true,
            conflict_files: vec!["src/layouts/Base.astro".to_string()],
            ..Default::default()
        };
        let failed = MergeResult {
            error: Some("boom".to_string()),
            ..Default::default()
        };
        let succeeded = MergeResult {
            success: true,
            ..Default::default()
        };

        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::Merging;
        let next = reduce(state.clone(), UpdateEvent::Merged(conflicted));
        assert_eq!(next.status, UpdateStatus::Conflict);

        let next = reduce(state.clone(), UpdateEvent::Merged(failed));
        assert_eq!(next.status, UpdateStatus::Error);
        assert_eq!(next.error, "boom");

        let next = reduce(state, UpdateEvent::Merged(succeeded));
        assert_eq!(next.status, UpdateStatus::Installing);
    }

    #[test]
    fn test_clean_merge_goes_through_restore() {
        let mut state = initial(UpdateOptions {
            clean: true,
            ..Default::default()
        });
        state.status = UpdateStatus::Merging;

        let result = MergeResult {
            success: true,
            pre_clean_sha: Some("abc123".to_string()),
            ..Default::default()
        };
        let next = reduce(state, UpdateEvent::Merged(result));
        assert_eq!(next.status, UpdateStatus::CleanRestoring);

        let next = reduce(
            next,
            UpdateEvent::CleanRestored {
                restored_files: vec!["src/content/blog".to_string()],
            },
        );
        assert_eq!(next.status, UpdateStatus::Installing);
        assert_eq!(next.restored_files, vec!["src/content/blog".to_string()]);

        let next = reduce(next, UpdateEvent::Installed);
        assert_eq!(next.status, UpdateStatus::Done);
    }

    #[test]
    fn test_error_is_cross_cutting() {
        for status in [
            UpdateStatus::Checking,
            UpdateStatus::Fetching,
            UpdateStatus::BackingUp,
            UpdateStatus::Preview,
            UpdateStatus::Merging,
            UpdateStatus::CleanRestoring,
            UpdateStatus::Installing,
        ] {
            let mut state = initial(UpdateOptions::default());
            state.status = status;
            let next = reduce(state, UpdateEvent::Error("fetch failed".to_string()));
            assert_eq!(next.status, UpdateStatus::Error);
            assert_eq!(next.error, "fetch failed");
        }
    }

    #[test]
    fn test_irrelevant_events_leave_state_unchanged() {
        let mut state = initial(UpdateOptions::default());
        state.status = UpdateStatus::Preview;

        let next = reduce(state.clone(), UpdateEvent::GitChecked(clean_status()));
        assert_eq!(next, state);

        let next = reduce(state.clone(), UpdateEvent::Installed);
        assert_eq!(next, state);
    }

    #[test]
    fn test_terminal_states_absorb_events() {
        for status in [
            UpdateStatus::Done,
            UpdateStatus::UpToDate,
            UpdateStatus::Conflict,
            UpdateStatus::DirtyWarning,
        ] {
            let mut state = initial(UpdateOptions::default());
            state.status = status;

            let next = reduce(state.clone(), UpdateEvent::UpdateConfirm);
            assert_eq!(next, state);

            let next = reduce(state.clone(), UpdateEvent::GitChecked(clean_status()));
            assert_eq!(next, state);
        }
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let make = || {
            let mut state = initial(UpdateOptions::default());
            state.status = UpdateStatus::Fetching;
            state
        };
        let a = reduce(make(), fetched(behind_info()));
        let b = reduce(make(), fetched(behind_info()));
        assert_eq!(a, b);
    }
}
