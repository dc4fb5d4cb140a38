//! The update engine: git-backed components, a pure state machine, and the
//! effect runner that connects them.

pub mod conflicts;
pub mod diff;
pub mod effects;
pub mod error;
pub mod git;
pub mod hooks;
pub mod merge;
pub mod progress;
pub mod remote;
pub mod restore;
pub mod state;
pub mod version;

pub use conflicts::{classify_conflicts, ConflictSplit};
pub use diff::{DiffAnalyzer, UpdateInfo};
pub use effects::EffectRunner;
pub use error::{classify_git_error, Result, UpdateError};
pub use git::{CommitInfo, GitGateway, GitStatus, ProcessRunner, SystemRunner};
pub use hooks::{BackupProducer, CommandInstaller, DependencyInstaller, RestoreConsumer};
pub use merge::{MergeExecutor, MergeOptions, MergeResult};
pub use progress::{
    CancelToken, OperationProgress, UpdatePhase, UpdateProgressBroadcaster, UpdateProgressEvent,
};
pub use remote::{EnsureUpstream, RemoteSync, UpstreamIssue};
pub use restore::CleanRestoreCoordinator;
pub use state::{create_initial_state, reduce, UpdateEvent, UpdateState, UpdateStatus};
