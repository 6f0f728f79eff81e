//! File crawler: resolves inclusion patterns against a working copy.
//!
//! The pattern grammar is deliberately small. Exactly three forms are
//! understood, each evaluated independently:
//!
//! | Form | Example | Matches |
//! |------|---------|---------|
//! | Exact path | `README.md`, `docs/intro.md` | that regular file, if present |
//! | Single wildcard | `*.md`, `docs/*.md` | files directly inside the directory whose name fits the `*` |
//! | Recursive | `docs/**/*.md`, `**/*.md` | files at any depth under the prefix whose name fits |
//!
//! There is no negation and no brace/character-class syntax. Anything the
//! grammar does not describe matches nothing. Recursive traversal never
//! descends into hidden entries or dependency caches.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory names that are never descended into by recursive patterns.
const SKIPPED_DIRS: &[&str] = &["node_modules", "bower_components", "venv", "__pycache__"];

/// A parsed inclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePattern {
    /// A literal relative path.
    Exact(String),
    /// `dir/prefix*suffix` matched against direct children of `dir`.
    Wildcard { dir: String, name: NameMatcher },
    /// `dir/**/prefix*suffix` matched at any depth under `dir`.
    Recursive { dir: String, name: NameMatcher },
}

/// Prefix/suffix match around a single `*`; without a `*` it is an exact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatcher {
    prefix: String,
    suffix: Option<String>,
}

impl NameMatcher {
    fn parse(segment: &str) -> Self {
        match (segment.find('*'), segment.rfind('*')) {
            (Some(first), Some(last)) => Self {
                prefix: segment[..first].to_string(),
                suffix: Some(segment[last + 1..].to_string()),
            },
            _ => Self {
                prefix: segment.to_string(),
                suffix: None,
            },
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.suffix {
            None => name == self.prefix,
            Some(suffix) => {
                name.len() >= self.prefix.len() + suffix.len()
                    && name.starts_with(&self.prefix)
                    && name.ends_with(suffix.as_str())
            }
        }
    }
}

impl FilePattern {
    /// Parse a pattern. Returns `None` for anything outside the grammar.
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim().trim_start_matches("./");
        if pattern.is_empty() || pattern.starts_with('/') {
            return None;
        }
        let segments: Vec<&str> = pattern.split('/').collect();
        if segments.iter().any(|s| s.is_empty() || *s == "..") {
            return None;
        }

        let (name, dirs) = segments.split_last()?;
        if name.contains("**") {
            return None;
        }

        match dirs.iter().position(|s| *s == "**") {
            Some(pos) => {
                // `**` must be the last directory segment and appear once.
                if pos != dirs.len() - 1 || dirs[..pos].iter().any(|s| s.contains('*')) {
                    return None;
                }
                Some(FilePattern::Recursive {
                    dir: dirs[..pos].join("/"),
                    name: NameMatcher::parse(name),
                })
            }
            None => {
                if dirs.iter().any(|s| s.contains('*')) {
                    return None;
                }
                if name.contains('*') {
                    Some(FilePattern::Wildcard {
                        dir: dirs.join("/"),
                        name: NameMatcher::parse(name),
                    })
                } else {
                    Some(FilePattern::Exact(pattern.to_string()))
                }
            }
        }
    }

    /// Resolve this pattern under `base`, in lexical order.
    pub fn resolve(&self, base: &Path) -> Vec<PathBuf> {
        match self {
            FilePattern::Exact(rel) => {
                let path = base.join(rel);
                if path.is_file() {
                    vec![path]
                } else {
                    Vec::new()
                }
            }
            FilePattern::Wildcard { dir, name } => {
                let dir_path = join_dir(base, dir);
                let entries = match std::fs::read_dir(&dir_path) {
                    Ok(entries) => entries,
                    Err(_) => return Vec::new(),
                };
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .filter(|e| name.matches(&e.file_name().to_string_lossy()))
                    .map(|e| e.path())
                    .collect();
                files.sort();
                files
            }
            FilePattern::Recursive { dir, name } => {
                let root = join_dir(base, dir);
                if !root.is_dir() {
                    return Vec::new();
                }
                WalkDir::new(&root)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_skipped(e))
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| name.matches(&e.file_name().to_string_lossy()))
                    .map(|e| e.into_path())
                    .collect()
            }
        }
    }
}

fn join_dir(base: &Path, dir: &str) -> PathBuf {
    if dir.is_empty() {
        base.to_path_buf()
    } else {
        base.join(dir)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref())
}

/// Resolve every pattern under `base`, in pattern order.
///
/// The same file may be returned more than once when several patterns match
/// it; callers deduplicate.
pub fn crawl(base: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for raw in patterns {
        match FilePattern::parse(raw) {
            Some(pattern) => files.extend(pattern.resolve(base)),
            None => debug!(pattern = %raw, "pattern outside supported grammar; ignored"),
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn rel(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(root, "README.md");
        touch(root, "CHANGELOG.md");
        touch(root, "notes.txt");
        touch(root, "docs/intro.md");
        touch(root, "docs/guide/setup.md");
        touch(root, "docs/guide/deep/more.mdx");
        touch(root, "docs/.hidden/secret.md");
        touch(root, "docs/node_modules/pkg/readme.md");
        touch(root, ".github/pull_request_template.md");
        tmp
    }

    #[test]
    fn test_exact_match() {
        let tmp = fixture();
        let files = crawl(tmp.path(), &["README.md".into(), "missing.md".into()]);
        assert_eq!(rel(tmp.path(), &files), vec!["README.md"]);
    }

    #[test]
    fn test_exact_directory_is_not_a_file() {
        let tmp = fixture();
        assert!(crawl(tmp.path(), &["docs".into()]).is_empty());
    }

    #[test]
    fn test_single_wildcard_is_one_level() {
        let tmp = fixture();
        let files = crawl(tmp.path(), &["*.md".into()]);
        assert_eq!(rel(tmp.path(), &files), vec!["CHANGELOG.md", "README.md"]);

        let files = crawl(tmp.path(), &["docs/*.md".into()]);
        assert_eq!(rel(tmp.path(), &files), vec!["docs/intro.md"]);
    }

    #[test]
    fn test_recursive_skips_hidden_and_dependencies() {
        let tmp = fixture();
        let files = crawl(tmp.path(), &["docs/**/*.md".into()]);
        assert_eq!(
            rel(tmp.path(), &files),
            vec!["docs/guide/setup.md", "docs/intro.md"]
        );
    }

    #[test]
    fn test_recursive_from_root() {
        let tmp = fixture();
        let files = crawl(tmp.path(), &["**/*.mdx".into()]);
        assert_eq!(rel(tmp.path(), &files), vec!["docs/guide/deep/more.mdx"]);

        let files = crawl(tmp.path(), &["**/*.md".into()]);
        let names = rel(tmp.path(), &files);
        assert!(names.contains(&"README.md".to_string()));
        assert!(!names.iter().any(|n| n.starts_with(".github")));
    }

    #[test]
    fn test_overlapping_patterns_are_not_deduplicated() {
        let tmp = fixture();
        let files = crawl(tmp.path(), &["README.md".into(), "*.md".into()]);
        let names = rel(tmp.path(), &files);
        assert_eq!(names.iter().filter(|n| *n == "README.md").count(), 2);
    }

    #[test]
    fn test_malformed_patterns_match_nothing() {
        let tmp = fixture();
        for pattern in ["", "/etc/passwd", "../x.md", "d*cs/*.md", "docs/**/**/*.md", "**"] {
            assert!(
                crawl(tmp.path(), &[pattern.to_string()]).is_empty(),
                "pattern {:?} should match nothing",
                pattern
            );
        }
    }

    #[test]
    fn test_name_matcher() {
        let m = NameMatcher::parse("*.md");
        assert!(m.matches("a.md"));
        assert!(!m.matches("a.mdx"));
        let m = NameMatcher::parse("api-*.md");
        assert!(m.matches("api-auth.md"));
        assert!(!m.matches("guide.md"));
        let m = NameMatcher::parse("ab*ba");
        assert!(!m.matches("aba"));
    }
}
