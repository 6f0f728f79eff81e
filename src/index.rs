//! Index build pipeline and the published, immutable snapshot.
//!
//! A rebuild runs sync → crawl → normalize → extract for every source and
//! produces a complete [`IndexSnapshot`]. Sources are processed in parallel
//! (one task per source, file work on the blocking pool) and merged in
//! registry order, so indexing order and therefore tie-breaking is
//! deterministic. The finished snapshot replaces the previous one with a
//! single pointer swap; readers always see one whole generation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Config, IndexConfig, LocalDocsConfig, RetrievalConfig};
use crate::crawl::crawl;
use crate::heading::extract_headings;
use crate::models::{
    IndexedDocument, IndexedHeading, Scored, Source, SourceSummary, SyncStatus,
};
use crate::normalize::normalize;
use crate::scoring::SynonymTable;
use crate::search::Ranker;
use crate::sync::{build_web_url, resolve_cache_root, RepoSync};

/// One complete generation of the index.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub documents: Vec<IndexedDocument>,
    pub headings: Vec<IndexedHeading>,
    pub sources: Vec<SourceSummary>,
    by_id: HashMap<String, usize>,
    /// `None` until the first rebuild completes.
    pub built_at: Option<DateTime<Utc>>,
}

impl IndexSnapshot {
    fn assemble(parts: Vec<SourceIndex>) -> Self {
        let mut snapshot = IndexSnapshot {
            built_at: Some(Utc::now()),
            ..Default::default()
        };
        for part in parts {
            snapshot.sources.push(part.summary);
            for doc in part.documents {
                snapshot
                    .by_id
                    .insert(doc.id.clone(), snapshot.documents.len());
                snapshot.documents.push(doc);
            }
            snapshot.headings.extend(part.headings);
        }
        snapshot
    }

    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.by_id.get(id).map(|&i| &self.documents[i])
    }

    pub fn is_built(&self) -> bool {
        self.built_at.is_some()
    }
}

/// How canonical URLs are formed for a tree's files.
#[derive(Debug, Clone)]
enum LinkStyle {
    Remote { repo_url: String, branch: String },
    Local { base_url: Option<String> },
}

/// A directory tree to index, with the identity of the source it belongs to.
#[derive(Debug, Clone)]
struct TreeSpec {
    source_id: String,
    source_name: String,
    include: Vec<String>,
    links: LinkStyle,
}

struct SourceIndex {
    summary: SourceSummary,
    documents: Vec<IndexedDocument>,
    headings: Vec<IndexedHeading>,
}

impl SourceIndex {
    fn empty(summary: SourceSummary) -> Self {
        Self {
            summary,
            documents: Vec::new(),
            headings: Vec::new(),
        }
    }
}

/// A zero-count summary, reported until indexing says otherwise.
fn pending_summary(id: &str, name: &str, description: &str, status: SyncStatus) -> SourceSummary {
    SourceSummary {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        document_count: 0,
        heading_count: 0,
        status,
        commit: None,
    }
}

/// The query-serving index: configuration plus the current snapshot.
#[derive(Debug)]
pub struct DocsIndex {
    sources: Vec<Source>,
    local: Option<LocalDocsConfig>,
    settings: IndexConfig,
    retrieval: RetrievalConfig,
    ranker: Ranker,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl DocsIndex {
    /// An unbuilt index. Queries return nothing until [`DocsIndex::rebuild`].
    pub fn new(config: &Config) -> Self {
        Self {
            sources: config.remote_sources(),
            local: config.local_docs.clone(),
            settings: config.index.clone(),
            retrieval: config.retrieval.clone(),
            ranker: Ranker::new(
                config.scoring.clone(),
                SynonymTable::with_overrides(&config.synonyms),
            ),
            snapshot: RwLock::new(Arc::new(IndexSnapshot::default())),
        }
    }

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sync every source, rebuild both collections, and publish the result.
    pub async fn rebuild(&self, sync: &RepoSync) -> Arc<IndexSnapshot> {
        let mut handles = Vec::new();

        if let Some(local) = &self.local {
            let local = local.clone();
            let settings = self.settings.clone();
            let failed = pending_summary(&local.id, &local.name, "", SyncStatus::Unavailable);
            handles.push((
                failed,
                tokio::spawn(async move { index_local(local, settings).await }),
            ));
        }

        for source in &self.sources {
            let source = source.clone();
            let sync = sync.clone();
            let settings = self.settings.clone();
            let failed = pending_summary(
                &source.id,
                &source.name,
                &source.description,
                SyncStatus::Unavailable,
            );
            handles.push((
                failed,
                tokio::spawn(async move { index_remote(source, sync, settings).await }),
            ));
        }

        let parts = join_sources(handles).await;
        let snapshot = Arc::new(IndexSnapshot::assemble(parts));
        info!(
            documents = snapshot.documents.len(),
            headings = snapshot.headings.len(),
            sources = snapshot.sources.len(),
            "index rebuilt"
        );

        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }

    pub fn search_documents(
        &self,
        query: &str,
        source: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Scored<IndexedDocument>> {
        let snapshot = self.snapshot();
        let limit = limit.unwrap_or(self.retrieval.document_limit);
        self.ranker
            .search_documents(&snapshot.documents, query, source, limit)
    }

    pub fn search_headings(
        &self,
        query: &str,
        source: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Scored<IndexedHeading>> {
        let snapshot = self.snapshot();
        let limit = limit.unwrap_or(self.retrieval.heading_limit);
        self.ranker
            .search_headings(&snapshot.headings, query, source, limit)
    }

    pub fn get_document(&self, id: &str) -> Option<IndexedDocument> {
        self.snapshot().get(id).cloned()
    }

    /// Indexed sections of one document, in document order.
    pub fn document_headings(&self, id: &str) -> Vec<IndexedHeading> {
        self.snapshot()
            .headings
            .iter()
            .filter(|h| h.document_id == id)
            .cloned()
            .collect()
    }

    pub fn list_sources(&self) -> Vec<SourceSummary> {
        self.snapshot().sources.clone()
    }
}

/// Resolve the cache root and prepare the sync manager for this process.
///
/// An unusable explicit `cache.dir` is a configuration error. When probing
/// finds no writable directory, remote sources are disabled instead.
pub async fn bootstrap_sync(config: &Config) -> Result<RepoSync> {
    let sync = if let Some(dir) = &config.cache.dir {
        let root = resolve_cache_root(Some(dir.as_path()))?;
        RepoSync::new(root, &config.sync).await
    } else {
        match resolve_cache_root(None) {
            Ok(root) => RepoSync::new(root, &config.sync).await,
            Err(e) => {
                warn!(error = %e, "no usable cache directory; remote sources are disabled");
                return Ok(RepoSync::disabled(std::env::temp_dir()));
            }
        }
    };
    info!(
        cache_root = %sync.cache_root().display(),
        git = sync.is_enabled(),
        "sync manager ready"
    );
    Ok(sync)
}

/// Build a ready-to-query index: bootstrap sync, then one full rebuild.
pub async fn build_index(config: &Config) -> Result<DocsIndex> {
    let sync = bootstrap_sync(config).await?;
    let index = DocsIndex::new(config);
    index.rebuild(&sync).await;
    Ok(index)
}

/// Await per-source tasks in registry order. A task that panicked still
/// reports its source, with zero counts.
async fn join_sources(handles: Vec<(SourceSummary, JoinHandle<SourceIndex>)>) -> Vec<SourceIndex> {
    let mut parts = Vec::with_capacity(handles.len());
    for (failed, handle) in handles {
        match handle.await {
            Ok(part) => parts.push(part),
            Err(e) => {
                warn!(source = %failed.id, error = %e, "indexing task failed");
                parts.push(SourceIndex::empty(failed));
            }
        }
    }
    parts
}

async fn index_local(local: LocalDocsConfig, settings: IndexConfig) -> SourceIndex {
    let mut summary = pending_summary(&local.id, &local.name, "", SyncStatus::Local);

    if !local.root.is_dir() {
        warn!(source = %local.id, root = %local.root.display(), "local docs root not found");
        return SourceIndex::empty(summary);
    }

    let tree = TreeSpec {
        source_id: local.id.clone(),
        source_name: local.name.clone(),
        include: local.include.clone(),
        links: LinkStyle::Local {
            base_url: local.base_url.clone(),
        },
    };
    let (documents, headings) = index_tree_blocking(tree, local.root.clone(), settings).await;
    summary.document_count = documents.len();
    summary.heading_count = headings.len();
    info!(source = %summary.id, documents = documents.len(), headings = headings.len(), "indexed local docs");

    SourceIndex {
        summary,
        documents,
        headings,
    }
}

async fn index_remote(source: Source, sync: RepoSync, settings: IndexConfig) -> SourceIndex {
    let mut summary = pending_summary(
        &source.id,
        &source.name,
        &source.description,
        SyncStatus::Unavailable,
    );

    let Some(copy) = sync.sync_source(&source).await else {
        return SourceIndex::empty(summary);
    };
    summary.status = copy.status;
    summary.commit = copy.commit;

    let tree = TreeSpec {
        source_id: source.id.clone(),
        source_name: source.name.clone(),
        include: source.include.clone(),
        links: LinkStyle::Remote {
            repo_url: source.url.clone(),
            branch: source.branch.clone(),
        },
    };
    let (documents, headings) = index_tree_blocking(tree, copy.path, settings).await;
    summary.document_count = documents.len();
    summary.heading_count = headings.len();
    info!(
        source = %summary.id,
        status = summary.status.as_str(),
        documents = documents.len(),
        headings = headings.len(),
        "indexed source"
    );

    SourceIndex {
        summary,
        documents,
        headings,
    }
}

async fn index_tree_blocking(
    tree: TreeSpec,
    root: PathBuf,
    settings: IndexConfig,
) -> (Vec<IndexedDocument>, Vec<IndexedHeading>) {
    let source_id = tree.source_id.clone();
    match tokio::task::spawn_blocking(move || index_tree(&tree, &root, &settings)).await {
        Ok(result) => result,
        Err(e) => {
            warn!(source = %source_id, error = %e, "crawl task failed");
            (Vec::new(), Vec::new())
        }
    }
}

/// Crawl, normalize, and extract one working tree.
fn index_tree(
    tree: &TreeSpec,
    root: &Path,
    settings: &IndexConfig,
) -> (Vec<IndexedDocument>, Vec<IndexedHeading>) {
    let mut documents = Vec::new();
    let mut headings = Vec::new();
    let mut seen_ids = HashSet::new();

    for file in crawl(root, &tree.include) {
        let Some(rel_path) = relative_path(root, &file) else {
            continue;
        };
        let doc_id = format!("{}/{}", tree.source_id, strip_extension(&rel_path));
        if seen_ids.contains(&doc_id) {
            continue;
        }

        let raw = match std::fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(source = %tree.source_id, path = %rel_path, error = %e, "skipping unreadable file");
                continue;
            }
        };

        let Some(normalized) = normalize(&raw, &rel_path, settings.min_document_chars) else {
            debug!(source = %tree.source_id, path = %rel_path, "skipping short document");
            continue;
        };
        seen_ids.insert(doc_id.clone());

        let doc = IndexedDocument {
            id: doc_id,
            title: normalized.title,
            source_id: tree.source_id.clone(),
            source_name: tree.source_name.clone(),
            url: document_url(&tree.links, &file, &rel_path),
            path: rel_path,
            content_hash: content_hash(&normalized.content),
            content: normalized.content,
            description: normalized.description,
            keywords: normalized.keywords,
        };
        headings.extend(extract_headings(&doc, settings.min_section_chars));
        documents.push(doc);
    }

    (documents, headings)
}

fn relative_path(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// `docs/intro.md` → `docs/intro`.
fn strip_extension(rel_path: &str) -> &str {
    let name_start = rel_path.rfind('/').map_or(0, |i| i + 1);
    match rel_path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &rel_path[..name_start + dot],
        _ => rel_path,
    }
}

fn document_url(links: &LinkStyle, file: &Path, rel_path: &str) -> String {
    match links {
        LinkStyle::Remote { repo_url, branch } => build_web_url(repo_url, branch, rel_path),
        LinkStyle::Local {
            base_url: Some(base),
        } => format!("{}/{}", base.trim_end_matches('/'), strip_extension(rel_path)),
        LinkStyle::Local { base_url: None } => {
            let abs = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
            format!("file://{}", abs.to_string_lossy().replace('\\', "/"))
        }
    }
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("README.md"), "README");
        assert_eq!(strip_extension("docs/intro.mdx"), "docs/intro");
        assert_eq!(strip_extension("docs/v1.2/notes"), "docs/v1.2/notes");
        assert_eq!(strip_extension("docs/.env"), "docs/.env");
    }

    #[test]
    fn test_index_tree_dedups_and_filters() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.md"), "# Widget\n\nSetup instructions here for the widget.").unwrap();
        fs::write(tmp.path().join("stub.md"), "tiny").unwrap();
        let tree = TreeSpec {
            source_id: "widget".into(),
            source_name: "Widget".into(),
            include: vec!["README.md".into(), "*.md".into()],
            links: LinkStyle::Remote {
                repo_url: "https://github.com/example/widget.git".into(),
                branch: "main".into(),
            },
        };
        let (docs, _) = index_tree(&tree, tmp.path(), &IndexConfig::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "widget/README");
        assert_eq!(docs[0].title, "Widget");
        assert_eq!(
            docs[0].url,
            "https://github.com/example/widget/blob/main/README.md"
        );
        assert_eq!(docs[0].content_hash, content_hash(&docs[0].content));
    }

    #[test]
    fn test_dropped_stub_does_not_claim_its_id() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("guide.md"), "TODO").unwrap();
        fs::write(
            tmp.path().join("guide.mdx"),
            "# Guide\n\nThe full guide lives in the MDX version of this page.",
        )
        .unwrap();
        let tree = TreeSpec {
            source_id: "w".into(),
            source_name: "Widget".into(),
            include: vec!["*.md".into(), "*.mdx".into()],
            links: LinkStyle::Local { base_url: None },
        };
        let (docs, _) = index_tree(&tree, tmp.path(), &IndexConfig::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "w/guide");
        assert_eq!(docs[0].path, "guide.mdx");
    }

    #[test]
    fn test_local_links_use_base_url() {
        let links = LinkStyle::Local {
            base_url: Some("https://docs.example.com/".into()),
        };
        assert_eq!(
            document_url(&links, Path::new("/tmp/x/guide/intro.md"), "guide/intro.md"),
            "https://docs.example.com/guide/intro"
        );
    }

    #[tokio::test]
    async fn test_panicked_source_still_listed() {
        let ok = pending_summary("first", "First", "", SyncStatus::Local);
        let failed = pending_summary("second", "Second", "", SyncStatus::Unavailable);
        let handles = vec![
            (
                failed.clone(),
                tokio::spawn(async move { SourceIndex::empty(ok) }),
            ),
            (
                failed.clone(),
                tokio::spawn(async { panic!("crawl blew up") }),
            ),
        ];

        let snapshot = IndexSnapshot::assemble(join_sources(handles).await);
        let ids: Vec<&str> = snapshot.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(snapshot.sources[1], failed);
        assert_eq!(snapshot.sources[1].document_count, 0);
    }

    #[tokio::test]
    async fn test_unbuilt_index_is_empty() {
        let index = DocsIndex::new(&Config::default());
        assert!(!index.snapshot().is_built());
        assert!(index.search_documents("setup", None, None).is_empty());
        assert!(index.search_headings("setup", None, None).is_empty());
        assert!(index.get_document("adcp/README").is_none());
        assert!(index.list_sources().is_empty());
    }
}
