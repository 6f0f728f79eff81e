//! Core data models used throughout Docs Harness.
//!
//! These types represent the sources, documents, sections, and search results
//! that flow through the sync → crawl → normalize → extract → search pipeline.

use serde::{Deserialize, Serialize};

/// A remote documentation repository mirrored into the local cache.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Source {
    /// Stable identifier; also the name of the working-copy directory.
    pub id: String,
    /// Human-readable name shown in listings.
    pub name: String,
    /// Git remote URL.
    pub url: String,
    /// Branch to mirror.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Ordered inclusion patterns (see [`crate::crawl`]).
    pub include: Vec<String>,
    /// Free-text description of what the source covers.
    #[serde(default)]
    pub description: String,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Outcome of this cycle's sync for one source.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Working copy was cloned or fast-forwarded during this cycle.
    Fresh,
    /// Sync failed or was skipped; an older working copy is being used.
    Stale,
    /// No working copy exists; the source contributes nothing.
    Unavailable,
    /// First-party docs read straight from disk.
    Local,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Fresh => "fresh",
            SyncStatus::Stale => "stale",
            SyncStatus::Unavailable => "unavailable",
            SyncStatus::Local => "local",
        }
    }
}

/// One markdown file's worth of searchable content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexedDocument {
    /// `"{source_id}/{relative path without extension}"`.
    pub id: String,
    pub title: String,
    pub source_id: String,
    pub source_name: String,
    /// Path relative to the working copy, always `/`-separated.
    pub path: String,
    /// Cleaned body text.
    pub content: String,
    /// Canonical, browsable URL for the file.
    pub url: String,
    /// Front-matter `description`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Front-matter `keywords`, lowercased.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Hex SHA-256 of `content`.
    pub content_hash: String,
}

/// One level-2 or level-3 section within a document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexedHeading {
    /// `"{document_id}#{anchor}"`.
    pub id: String,
    pub document_id: String,
    pub source_id: String,
    pub anchor: String,
    /// Heading text as written.
    pub title: String,
    /// 2 or 3.
    pub level: u8,
    /// Document title followed by enclosing heading texts.
    pub breadcrumb: Vec<String>,
    /// Text between this heading and the next level-2/3 heading.
    pub content: String,
    /// Document URL plus `#anchor`.
    pub url: String,
    /// Relative path of the originating file.
    pub path: String,
}

/// A ranked reference to an indexed item plus the score that placed it.
#[derive(Debug, Clone, Serialize)]
pub struct Scored<T> {
    pub score: f64,
    #[serde(flatten)]
    pub item: T,
}

/// Per-source counts and sync status for `list_sources`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub document_count: usize,
    pub heading_count: usize,
    pub status: SyncStatus,
    /// `HEAD` of the working copy, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}
