//! Version strings: tag normalization and manifest extraction.

use serde_json::Value;

use super::git::GitGateway;
use crate::config::UpstreamConfig;

/// Placeholder when no version can be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Coerces a version string to its leading-`v` tag form.
pub fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('v') {
        tag.to_string()
    } else {
        format!("v{tag}")
    }
}

/// Strips the leading `v` from a tag, yielding the bare version string.
pub fn strip_tag(tag: &str) -> String {
    tag.strip_prefix('v').unwrap_or(tag).to_string()
}

/// Reads the `version` field from manifest JSON text.
pub fn manifest_version(manifest: &str) -> Option<String> {
    let value: Value = serde_json::from_str(manifest).ok()?;
    value.get("version")?.as_str().map(str::to_string)
}

/// Version of the local checkout, read from the working-tree manifest.
pub fn local_version(gateway: &GitGateway, config: &UpstreamConfig) -> String {
    std::fs::read_to_string(gateway.repo_path().join(&config.manifest_file))
        .ok()
        .and_then(|text| manifest_version(&text))
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

/// Version recorded at a reference, via `git show <ref>:<manifest>`.
pub fn ref_version(gateway: &GitGateway, config: &UpstreamConfig, reference: &str) -> Option<String> {
    let spec = format!("{}:{}", reference, config.manifest_file);
    gateway
        .git_ok(&["show", &spec])
        .and_then(|text| manifest_version(&text))
}
