//! Manifest of user-owned content within a template-derived repository.
//!
//! Ownership drives conflict classification and the clean-mode restore:
//! paths listed here (the required ones) belong to the user and always win
//! over the template.

/// One backed-up content location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentItem {
    /// Path inside the repository.
    pub src: &'static str,
    /// Path inside a backup archive.
    pub dest: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Required items define user-content ownership; optional ones are
    /// backed up when present but stay template-owned.
    pub required: bool,
    /// Glob restricting which entries under `src` are included.
    pub pattern: Option<&'static str>,
}

/// All content locations the backup producer covers.
pub const CONTENT_ITEMS: &[ContentItem] = &[
    ContentItem {
        src: "src/content/blog",
        dest: "content/blog",
        label: "blog posts",
        required: true,
        pattern: None,
    },
    ContentItem {
        src: "config/site.yaml",
        dest: "config/site.yaml",
        label: "site configuration",
        required: true,
        pattern: None,
    },
    ContentItem {
        src: "src/pages",
        dest: "pages",
        label: "standalone pages",
        required: true,
        pattern: Some("*.md"),
    },
    ContentItem {
        src: "public/img",
        dest: "img",
        label: "user images",
        required: true,
        pattern: None,
    },
    ContentItem {
        src: ".env",
        dest: "env",
        label: "environment file",
        required: true,
        pattern: None,
    },
    ContentItem {
        src: "public/favicon.ico",
        dest: "favicon.ico",
        label: "favicon",
        required: false,
        pattern: None,
    },
    ContentItem {
        src: "src/assets/lqips.json",
        dest: "assets/lqips.json",
        label: "image placeholders",
        required: false,
        pattern: None,
    },
    ContentItem {
        src: "src/assets/similarities.json",
        dest: "assets/similarities.json",
        label: "related-post index",
        required: false,
        pattern: None,
    },
    ContentItem {
        src: "src/assets/summaries.json",
        dest: "assets/summaries.json",
        label: "post summaries",
        required: false,
        pattern: None,
    },
];

/// Repository paths that define user-content ownership.
pub fn user_content_prefixes() -> Vec<&'static str> {
    CONTENT_ITEMS
        .iter()
        .filter(|item| item.required)
        .map(|item| item.src)
        .collect()
}

/// True iff `path` equals a required prefix or is nested under one.
pub fn is_user_content(path: &str) -> bool {
    CONTENT_ITEMS
        .iter()
        .filter(|item| item.required)
        .any(|item| path == item.src || path.starts_with(&format!("{}/", item.src)))
}

/// Archive-path to repository-path mapping for the restore consumer.
pub fn restore_map() -> Vec<(&'static str, &'static str)> {
    CONTENT_ITEMS
        .iter()
        .map(|item| (item.dest, item.src))
        .collect()
}
