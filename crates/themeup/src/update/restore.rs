//! Clean-mode restore: user content back on top of the replaced tree.

use std::path::Path;

use super::error::Result;
use super::git::GitGateway;
use super::hooks::RestoreConsumer;

/// Folds restored user content into the clean-replace commit, rolling back
/// to the pre-clean anchor if anything fails.
pub struct CleanRestoreCoordinator<'a> {
    gateway: &'a GitGateway,
}

impl<'a> CleanRestoreCoordinator<'a> {
    pub fn new(gateway: &'a GitGateway) -> Self {
        Self { gateway }
    }

    /// Restores user content from `archive` and amends it into the merge
    /// commit. On any failure the repository is reset hard to
    /// `pre_clean_sha` (when known) before the error propagates.
    pub fn clean_restore(
        &self,
        restorer: &dyn RestoreConsumer,
        archive: &Path,
        pre_clean_sha: Option<&str>,
    ) -> Result<Vec<String>> {
        match self.restore_and_amend(restorer, archive) {
            Ok(restored) => {
                log::info!("Restored {} user-content item(s)", restored.len());
                Ok(restored)
            }
            Err(err) => {
                if let Some(sha) = pre_clean_sha {
                    log::warn!("Restore failed, rolling back to {sha}: {err}");
                    let _ = self.gateway.git_ok(&["reset", "--hard", sha]);
                } else {
                    log::error!("Restore failed with no rollback anchor: {err}");
                }
                Err(err)
            }
        }
    }

    fn restore_and_amend(
        &self,
        restorer: &dyn RestoreConsumer,
        archive: &Path,
    ) -> Result<Vec<String>> {
        let restored = restorer.restore(archive)?;
        self.gateway.git(&["add", "-A"])?;
        self.gateway.git(&["commit", "--amend", "--no-edit"])?;
        Ok(restored)
    }
}
