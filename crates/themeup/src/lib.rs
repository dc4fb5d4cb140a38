//! themeup - update orchestration engine for template-derived sites.
//!
//! Keeps a local content repository in sync with the upstream theme template
//! it was derived from. The engine is a pure state machine (`update::state`)
//! driven by an effect runner (`update::effects`) over a subprocess git
//! gateway (`update::git`).

pub mod config;
pub mod content;
pub mod error;
pub mod release;
pub mod update;

pub use config::{load_upstream_config, UpdateOptions, UpstreamConfig};
pub use content::{is_user_content, user_content_prefixes, ContentItem, CONTENT_ITEMS};
pub use error::{ConfigError, Result, ThemeupError};
pub use release::{fetch_release_info, release_summary, release_url, ReleaseInfo};
pub use update::{
    create_initial_state, reduce, CancelToken, EffectRunner, GitGateway, UpdateError, UpdateEvent,
    UpdateState, UpdateStatus,
};
