//! Effect runner: executes the side effect each state requires and feeds
//! the outcome back into the reducer as an event.
//!
//! Effects never panic the flow; every failure becomes an
//! [`UpdateEvent::Error`] and the reducer routes it to the error state.

use std::path::PathBuf;

use super::diff::DiffAnalyzer;
use super::error::UpdateError;
use super::git::GitGateway;
use super::hooks::{BackupProducer, DependencyInstaller, RestoreConsumer};
use super::merge::{MergeExecutor, MergeOptions};
use super::progress::{CancelToken, UpdatePhase, UpdateProgressBroadcaster};
use super::remote::{RemoteSync, UpstreamIssue};
use super::restore::CleanRestoreCoordinator;
use super::state::{reduce, UpdateEvent, UpdateState, UpdateStatus};
use crate::config::UpstreamConfig;

/// Tags shown in the TagNotFound hint.
const RECENT_TAGS_HINT: usize = 5;

/// Owns the gateway-backed components and the collaborators, and runs the
/// side effect behind each working state.
pub struct EffectRunner<'a> {
    gateway: &'a GitGateway,
    config: &'a UpstreamConfig,
    backup: &'a dyn BackupProducer,
    restorer: &'a dyn RestoreConsumer,
    installer: &'a dyn DependencyInstaller,
    broadcaster: UpdateProgressBroadcaster,
}

impl<'a> EffectRunner<'a> {
    pub fn new(
        gateway: &'a GitGateway,
        config: &'a UpstreamConfig,
        backup: &'a dyn BackupProducer,
        restorer: &'a dyn RestoreConsumer,
        installer: &'a dyn DependencyInstaller,
    ) -> Self {
        Self {
            gateway,
            config,
            backup,
            restorer,
            installer,
            broadcaster: UpdateProgressBroadcaster::default(),
        }
    }

    pub fn with_broadcaster(mut self, broadcaster: UpdateProgressBroadcaster) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn broadcaster(&self) -> &UpdateProgressBroadcaster {
        &self.broadcaster
    }

    /// Runs the side effect for the current state, if it has one.
    ///
    /// Returns `None` for decision states, terminal states, and cancelled
    /// effects. A cancelled effect's outcome is discarded so a stale result
    /// cannot corrupt a newer state.
    pub async fn run_effect(&self, state: &UpdateState, cancel: &CancelToken) -> Option<UpdateEvent> {
        if cancel.is_cancelled() || state.status.is_decision() || state.status.is_terminal() {
            return None;
        }

        let event = match state.status {
            UpdateStatus::Checking => self.check(state),
            UpdateStatus::Fetching => self.fetch(state),
            UpdateStatus::BackingUp => self.back_up(),
            UpdateStatus::Merging => self.merge(state),
            UpdateStatus::CleanRestoring => self.clean_restore(state),
            UpdateStatus::Installing => self.install().await,
            _ => return None,
        };

        if cancel.is_cancelled() {
            return None;
        }
        Some(event)
    }

    /// Advances the machine until it reaches a decision point or a terminal
    /// state. Callers dispatch decision events themselves (or stop there:
    /// check-only and dry runs end at the preview) and call this again.
    pub async fn drive(&self, mut state: UpdateState, cancel: &CancelToken) -> UpdateState {
        loop {
            match self.run_effect(&state, cancel).await {
                Some(event) => state = reduce(state, event),
                None => return state,
            }
        }
    }

    fn check(&self, state: &UpdateState) -> UpdateEvent {
        if let Err(err) = state.options.validate() {
            return UpdateEvent::Error(err.to_string());
        }

        let progress = self.broadcaster.start_operation();
        progress.phase(UpdatePhase::Checking, "Checking repository status");

        let git_status = match self.gateway.status() {
            Ok(status) => status,
            Err(err) => return UpdateEvent::Error(err.to_string()),
        };

        let remote = RemoteSync::new(self.gateway, self.config);
        let ensured = remote.ensure_upstream_remote(!state.options.check_only);
        if !ensured.success {
            let err = match ensured.reason {
                Some(UpstreamIssue::Mismatch) => UpdateError::RemoteMismatch {
                    current_url: ensured.current_url.unwrap_or_default(),
                    expected: self.config.url.clone(),
                },
                Some(UpstreamIssue::Missing) => UpdateError::RemoteMissing,
                _ => UpdateError::RemoteAddFailed,
            };
            return UpdateEvent::Error(err.to_string());
        }

        UpdateEvent::GitChecked(git_status)
    }

    fn fetch(&self, state: &UpdateState) -> UpdateEvent {
        let progress = self.broadcaster.start_operation();
        progress.phase(UpdatePhase::Fetching, "Fetching upstream");

        let remote = RemoteSync::new(self.gateway, self.config);
        if state.options.check_only {
            // Check mode must not touch the network; it needs an earlier fetch.
            if !remote.has_tracking_ref() {
                return UpdateEvent::Error(
                    UpdateError::Fetch(format!(
                        "no local tracking ref for {}; run 'git fetch {}' first",
                        self.config.main_ref(),
                        self.config.remote_name
                    ))
                    .to_string(),
                );
            }
        } else if let Err(err) = remote.fetch_upstream() {
            return UpdateEvent::Error(UpdateError::Fetch(err.to_string()).to_string());
        }

        let executor = MergeExecutor::new(self.gateway, self.config);
        if let Some(tag) = state.options.target_tag.as_deref() {
            if !executor.tag_exists(tag) {
                let err = UpdateError::TagNotFound {
                    tag: tag.to_string(),
                    recent: executor.recent_tags(RECENT_TAGS_HINT),
                };
                return UpdateEvent::Error(err.to_string());
            }
        }

        let info =
            DiffAnalyzer::new(self.gateway, self.config).update_info(state.options.target_tag.as_deref());

        // Rebase and clean runs rewrite history anyway; only regular merges
        // care whether past updates were squashed.
        let needs_migration = !state.options.clean
            && !state.options.rebase
            && !executor.has_upstream_merge_history();

        UpdateEvent::Fetched {
            info,
            needs_migration,
        }
    }

    fn back_up(&self) -> UpdateEvent {
        let progress = self.broadcaster.start_operation();
        progress.phase(UpdatePhase::BackingUp, "Backing up user content");

        match self.backup.create_backup() {
            Ok(archive) => UpdateEvent::BackupDone {
                backup_file: archive.to_string_lossy().into_owned(),
            },
            Err(err) => UpdateEvent::Error(UpdateError::Backup(err.to_string()).to_string()),
        }
    }

    fn merge(&self, state: &UpdateState) -> UpdateEvent {
        let progress = self.broadcaster.start_operation();
        progress.phase(UpdatePhase::Merging, "Applying upstream changes");

        let options = MergeOptions {
            target_tag: state.options.target_tag.clone(),
            is_downgrade: state
                .update_info
                .as_ref()
                .is_some_and(|info| info.is_downgrade),
            rebase: state.options.rebase,
            clean: state.options.clean,
        };

        let result = MergeExecutor::new(self.gateway, self.config).merge_upstream(&options);
        UpdateEvent::Merged(result)
    }

    fn clean_restore(&self, state: &UpdateState) -> UpdateEvent {
        let progress = self.broadcaster.start_operation();
        progress.phase(UpdatePhase::Restoring, "Restoring user content");

        if state.backup_file.is_empty() {
            return UpdateEvent::Error(
                "clean mode requires a backup archive, but none was created".to_string(),
            );
        }

        let archive = PathBuf::from(&state.backup_file);
        let pre_clean_sha = state
            .merge_result
            .as_ref()
            .and_then(|result| result.pre_clean_sha.as_deref());

        match CleanRestoreCoordinator::new(self.gateway).clean_restore(
            self.restorer,
            &archive,
            pre_clean_sha,
        ) {
            Ok(restored_files) => UpdateEvent::CleanRestored { restored_files },
            Err(err) => UpdateEvent::Error(err.to_string()),
        }
    }

    async fn install(&self) -> UpdateEvent {
        let progress = self.broadcaster.start_operation();
        progress.phase(UpdatePhase::Installing, "Installing dependencies");

        match self.installer.install(&progress).await {
            Ok(()) => {
                progress.completed("Dependencies installed");
                UpdateEvent::Installed
            }
            Err(err) => {
                progress.failed(&err.to_string());
                UpdateEvent::Error(err.to_string())
            }
        }
    }
}
