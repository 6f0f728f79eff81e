//! Scoring weights, query-word extraction, and synonym expansion.
//!
//! Everything here is plain data plus pure functions so the ranking in
//! [`crate::search`] can be tuned from config and tested without an index.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Weights applied to document-level candidates.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DocumentWeights {
    pub title_phrase: f64,
    pub content_phrase: f64,
    pub title_word: f64,
    pub keyword_word: f64,
    pub content_occurrence: f64,
    pub content_occurrence_cap: usize,
    pub getting_started: f64,
}

impl Default for DocumentWeights {
    fn default() -> Self {
        Self {
            title_phrase: 100.0,
            content_phrase: 50.0,
            title_word: 20.0,
            keyword_word: 15.0,
            content_occurrence: 2.0,
            content_occurrence_cap: 10,
            getting_started: 30.0,
        }
    }
}

/// Weights applied to heading-level candidates.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HeadingWeights {
    pub title_phrase: f64,
    pub title_exact: f64,
    pub content_phrase: f64,
    pub breadcrumb_phrase: f64,
    pub title_word: f64,
    pub breadcrumb_word: f64,
    pub content_occurrence: f64,
    pub content_occurrence_cap: usize,
}

impl Default for HeadingWeights {
    fn default() -> Self {
        Self {
            title_phrase: 150.0,
            title_exact: 50.0,
            content_phrase: 30.0,
            breadcrumb_phrase: 40.0,
            title_word: 25.0,
            breadcrumb_word: 10.0,
            content_occurrence: 3.0,
            content_occurrence_cap: 5,
        }
    }
}

/// Onboarding boost: a "how do I start" query meeting an entry-point document.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GettingStarted {
    /// Substrings of the lowercased query that mark it as onboarding.
    pub query_terms: Vec<String>,
    /// Substrings of the lowercased path or title that mark an entry point.
    pub path_hints: Vec<String>,
}

impl Default for GettingStarted {
    fn default() -> Self {
        Self {
            query_terms: to_strings(&[
                "setup",
                "set up",
                "install",
                "quickstart",
                "getting started",
                "how do i",
            ]),
            path_hints: to_strings(&[
                "quickstart",
                "readme",
                "index",
                "getting-started",
                "installation",
            ]),
        }
    }
}

impl GettingStarted {
    pub fn is_onboarding_query(&self, query_lower: &str) -> bool {
        self.query_terms
            .iter()
            .any(|t| !t.is_empty() && query_lower.contains(t.as_str()))
    }

    pub fn is_entry_point(&self, path: &str, title: &str) -> bool {
        let path = path.to_lowercase();
        let title = title.to_lowercase();
        self.path_hints
            .iter()
            .any(|h| !h.is_empty() && (path.contains(h.as_str()) || title.contains(h.as_str())))
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub documents: DocumentWeights,
    pub headings: HeadingWeights,
    pub getting_started: GettingStarted,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const BUILTIN_SYNONYMS: &[(&str, &[&str])] = &[
    // onboarding
    ("setup", &["install", "installation", "quickstart", "getting started", "configure"]),
    ("install", &["installation", "setup", "npm", "pip"]),
    ("quickstart", &["getting started", "setup", "tutorial"]),
    // auth
    ("auth", &["authentication", "authorization", "token", "bearer", "api key"]),
    ("authentication", &["auth", "token", "credentials", "oauth"]),
    // ad tech
    ("gam", &["google ad manager", "dfp"]),
    ("dfp", &["google ad manager", "gam"]),
    ("ctv", &["connected tv", "streaming", "ott"]),
    ("ott", &["over the top", "streaming", "ctv"]),
    ("dsp", &["demand side platform", "buyer"]),
    ("ssp", &["supply side platform", "publisher", "seller"]),
    ("cpm", &["cost per mille", "pricing", "rate"]),
    // protocol
    ("mcp", &["model context protocol", "tools"]),
    ("a2a", &["agent to agent", "agent-to-agent"]),
    ("schema", &["json schema", "validation", "spec"]),
    ("webhook", &["callback", "notification", "push"]),
    ("signal", &["signals", "audience", "segment"]),
    ("signals", &["signal", "audience", "segment"]),
    ("targeting", &["audience", "signals", "geo"]),
    // domain nouns
    ("buy", &["media buy", "purchase", "create_media_buy"]),
    ("campaign", &["media buy", "flight", "package"]),
    ("creative", &["creatives", "asset", "ad unit"]),
    ("format", &["formats", "creative format", "specs"]),
    ("product", &["products", "inventory", "get_products"]),
    ("inventory", &["products", "placements", "supply"]),
    ("pricing", &["price", "cpm", "budget"]),
    ("error", &["errors", "error code", "failure", "troubleshooting"]),
    ("sdk", &["client", "library", "package"]),
];

/// Word → related terms used to widen a query before scoring.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN_SYNONYMS
            .iter()
            .map(|(word, syns)| (word.to_string(), to_strings(syns)))
            .collect();
        Self { entries }
    }

    /// The built-in table with `overrides` replacing whole entries.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::builtin();
        for (word, syns) in overrides {
            table.entries.insert(
                word.to_lowercase(),
                syns.iter().map(|s| s.to_lowercase()).collect(),
            );
        }
        table
    }

    pub fn synonyms(&self, word: &str) -> &[String] {
        self.entries.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercased query words longer than two characters, punctuation trimmed.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Query words, each followed by its synonyms, deduplicated in order.
pub fn expand_query(query: &str, synonyms: &SynonymTable) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut expanded = Vec::new();
    for word in query_words(query) {
        let syns = synonyms.synonyms(&word).to_vec();
        for term in std::iter::once(word).chain(syns) {
            if seen.insert(term.clone()) {
                expanded.push(term);
            }
        }
    }
    expanded
}

/// Non-overlapping occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}
