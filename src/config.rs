//! TOML configuration parsing and validation.
//!
//! Every section is optional: a missing file (at the default path) or an
//! empty file yields a configuration built entirely from defaults, with the
//! compiled-in source list from [`crate::registry`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::models::Source;
use crate::registry;
use crate::scoring::ScoringConfig;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
    pub local_docs: Option<LocalDocsConfig>,
    /// Replaces the built-in registry when present.
    pub sources: Option<Vec<Source>>,
    pub scoring: ScoringConfig,
    /// Merged over the built-in synonym table, key by key.
    pub synonyms: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Explicit cache root. When unset the root is probed at startup.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub clone_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Use existing working copies without touching the network.
    pub offline: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            clone_timeout_secs: 60,
            fetch_timeout_secs: 30,
            offline: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// Documents whose cleaned content is shorter than this are dropped.
    pub min_document_chars: usize,
    /// Sections whose trimmed body is shorter than this are not indexed.
    pub min_section_chars: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_document_chars: 20,
            min_section_chars: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub document_limit: usize,
    pub heading_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            document_limit: 5,
            heading_limit: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7340".to_string(),
        }
    }
}

/// The first-party documentation tree, indexed straight from disk.
#[derive(Debug, Deserialize, Clone)]
pub struct LocalDocsConfig {
    #[serde(default = "default_local_id")]
    pub id: String,
    #[serde(default = "default_local_name")]
    pub name: String,
    pub root: PathBuf,
    #[serde(default = "default_local_include")]
    pub include: Vec<String>,
    /// Prefix for canonical URLs; `file://` links are used when unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_local_id() -> String {
    "local".to_string()
}

fn default_local_name() -> String {
    "Local documentation".to_string()
}

fn default_local_include() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.mdx".to_string()]
}

impl Config {
    /// Remote sources in registry order: the configured list if present,
    /// otherwise the compiled-in registry.
    pub fn remote_sources(&self) -> Vec<Source> {
        match &self.sources {
            Some(list) => list.clone(),
            None => registry::builtin_sources(),
        }
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a file that does not exist means "all defaults".
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!("config {} not found, using defaults", path.display());
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.retrieval.document_limit == 0 {
        bail!("retrieval.document_limit must be >= 1");
    }
    if config.retrieval.heading_limit == 0 {
        bail!("retrieval.heading_limit must be >= 1");
    }

    let mut seen = HashSet::new();
    if let Some(local) = &config.local_docs {
        check_source_id(&local.id)?;
        seen.insert(local.id.clone());
    }

    for source in config.remote_sources() {
        check_source_id(&source.id)?;
        if !seen.insert(source.id.clone()) {
            bail!("duplicate source id: '{}'", source.id);
        }
        if source.url.trim().is_empty() {
            bail!("source '{}' has an empty url", source.id);
        }
        if source.branch.trim().is_empty() {
            bail!("source '{}' has an empty branch", source.id);
        }
    }

    Ok(())
}

/// Source ids name cache subdirectories, so they must be a single safe segment.
fn check_source_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        bail!(
            "invalid source id '{}': use letters, digits, '-', '_' or '.'",
            id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        validate(&config).unwrap();
        assert_eq!(config.sync.clone_timeout_secs, 60);
        assert_eq!(config.index.min_section_chars, 20);
        assert_eq!(config.retrieval.document_limit, 5);
        assert!(config.local_docs.is_none());
        assert_eq!(config.remote_sources(), registry::builtin_sources());
    }

    #[test]
    fn test_sources_replace_registry() {
        let config: Config = toml::from_str(
            r#"
[[sources]]
id = "widget"
name = "Widget"
url = "https://github.com/example/widget.git"
include = ["README.md"]
"#,
        )
        .unwrap();
        validate(&config).unwrap();
        let sources = config.remote_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].branch, "main");
    }

    #[test]
    fn test_duplicate_source_id_rejected() {
        let config: Config = toml::from_str(
            r#"
[local_docs]
root = "./docs"

[[sources]]
id = "local"
name = "Clash"
url = "https://github.com/example/clash.git"
include = ["*.md"]
"#,
        )
        .unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate source id"));
    }

    #[test]
    fn test_path_like_source_id_rejected() {
        let config: Config = toml::from_str(
            r#"
[[sources]]
id = "../escape"
name = "Bad"
url = "https://github.com/example/bad.git"
include = ["*.md"]
"#,
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config: Config = toml::from_str("[retrieval]\nheading_limit = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_scoring_overrides_are_partial() {
        let config: Config = toml::from_str(
            r#"
[scoring.documents]
title_phrase = 500.0

[synonyms]
widget = ["gadget"]
"#,
        )
        .unwrap();
        assert_eq!(config.scoring.documents.title_phrase, 500.0);
        assert_eq!(config.scoring.documents.content_phrase, 50.0);
        assert_eq!(config.synonyms["widget"], vec!["gadget".to_string()]);
    }
}
