//! Relevance ranking for documents and sections.
//!
//! Both modes score every candidate independently with additive,
//! config-weighted components (see [`crate::scoring`]), drop zero scores,
//! and stable-sort descending so ties keep indexing order.

use std::cmp::Ordering;

use crate::models::{IndexedDocument, IndexedHeading, Scored};
use crate::scoring::{count_occurrences, expand_query, ScoringConfig, SynonymTable};

/// A query prepared once and scored against many candidates.
struct PreparedQuery {
    phrase: String,
    words: Vec<String>,
    onboarding: bool,
}

/// Scores candidates with a fixed weight set and synonym table.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    scoring: ScoringConfig,
    synonyms: SynonymTable,
}

impl Ranker {
    pub fn new(scoring: ScoringConfig, synonyms: SynonymTable) -> Self {
        Self { scoring, synonyms }
    }

    fn prepare(&self, query: &str) -> Option<PreparedQuery> {
        let phrase = query.trim().to_lowercase();
        if phrase.is_empty() {
            return None;
        }
        Some(PreparedQuery {
            words: expand_query(&phrase, &self.synonyms),
            onboarding: self.scoring.getting_started.is_onboarding_query(&phrase),
            phrase,
        })
    }

    pub fn score_document(&self, query: &str, doc: &IndexedDocument) -> f64 {
        match self.prepare(query) {
            Some(q) => self.document_score(&q, doc),
            None => 0.0,
        }
    }

    pub fn score_heading(&self, query: &str, heading: &IndexedHeading) -> f64 {
        match self.prepare(query) {
            Some(q) => self.heading_score(&q, heading),
            None => 0.0,
        }
    }

    fn document_score(&self, q: &PreparedQuery, doc: &IndexedDocument) -> f64 {
        let w = &self.scoring.documents;
        let title = doc.title.to_lowercase();
        let content = doc.content.to_lowercase();
        let mut score = 0.0;

        if title.contains(&q.phrase) {
            score += w.title_phrase;
        }
        if content.contains(&q.phrase) {
            score += w.content_phrase;
        }

        for word in &q.words {
            if title.contains(word.as_str()) {
                score += w.title_word;
            }
            if doc.keywords.iter().any(|k| k == word) {
                score += w.keyword_word;
            }
            let hits = count_occurrences(&content, word).min(w.content_occurrence_cap);
            score += hits as f64 * w.content_occurrence;
        }

        if q.onboarding
            && self
                .scoring
                .getting_started
                .is_entry_point(&doc.path, &doc.title)
        {
            score += w.getting_started;
        }

        score
    }

    fn heading_score(&self, q: &PreparedQuery, heading: &IndexedHeading) -> f64 {
        let w = &self.scoring.headings;
        let title = heading.title.to_lowercase();
        let content = heading.content.to_lowercase();
        let breadcrumb = heading.breadcrumb.join(" ").to_lowercase();
        let mut score = 0.0;

        if title.contains(&q.phrase) {
            score += w.title_phrase;
            if title == q.phrase {
                score += w.title_exact;
            }
        }
        if content.contains(&q.phrase) {
            score += w.content_phrase;
        }
        if breadcrumb.contains(&q.phrase) {
            score += w.breadcrumb_phrase;
        }

        for word in &q.words {
            if title.contains(word.as_str()) {
                score += w.title_word;
            }
            if breadcrumb.contains(word.as_str()) {
                score += w.breadcrumb_word;
            }
            let hits = count_occurrences(&content, word).min(w.content_occurrence_cap);
            score += hits as f64 * w.content_occurrence;
        }

        score
    }

    /// Rank `docs` for `query`, optionally restricted to one source.
    pub fn search_documents(
        &self,
        docs: &[IndexedDocument],
        query: &str,
        source: Option<&str>,
        limit: usize,
    ) -> Vec<Scored<IndexedDocument>> {
        let Some(q) = self.prepare(query) else {
            return Vec::new();
        };
        rank(
            docs.iter()
                .filter(|d| source.map_or(true, |s| d.source_id == s))
                .map(|d| (self.document_score(&q, d), d)),
            limit,
        )
    }

    /// Rank `headings` for `query`, optionally restricted to one source.
    pub fn search_headings(
        &self,
        headings: &[IndexedHeading],
        query: &str,
        source: Option<&str>,
        limit: usize,
    ) -> Vec<Scored<IndexedHeading>> {
        let Some(q) = self.prepare(query) else {
            return Vec::new();
        };
        rank(
            headings
                .iter()
                .filter(|h| source.map_or(true, |s| h.source_id == s))
                .map(|h| (self.heading_score(&q, h), h)),
            limit,
        )
    }
}

fn rank<'a, T, I>(candidates: I, limit: usize) -> Vec<Scored<T>>
where
    T: Clone + 'a,
    I: Iterator<Item = (f64, &'a T)>,
{
    let mut scored: Vec<(f64, &T)> = candidates.filter(|(score, _)| *score > 0.0).collect();
    // sort_by is stable: equal scores keep indexing order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
        .into_iter()
        .map(|(score, item)| Scored {
            score,
            item: item.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str, path: &str, title: &str, content: &str) -> IndexedDocument {
        IndexedDocument {
            id: format!("{}/{}", source, path.trim_end_matches(".md")),
            title: title.into(),
            source_id: source.into(),
            source_name: source.into(),
            path: path.into(),
            content: content.into(),
            url: format!("https://example.com/{}", path),
            description: None,
            keywords: Vec::new(),
            content_hash: String::new(),
        }
    }

    fn heading(title: &str, breadcrumb: &[&str], content: &str) -> IndexedHeading {
        IndexedHeading {
            id: format!("widget/guide#{}", title.to_lowercase()),
            document_id: "widget/guide".into(),
            source_id: "widget".into(),
            anchor: title.to_lowercase(),
            title: title.into(),
            level: 2,
            breadcrumb: breadcrumb.iter().map(|s| s.to_string()).collect(),
            content: content.into(),
            url: "https://example.com/guide".into(),
            path: "guide.md".into(),
        }
    }

    fn ranker() -> Ranker {
        Ranker::new(ScoringConfig::default(), SynonymTable::builtin())
    }

    #[test]
    fn test_title_match_outranks_body_match() {
        let docs = vec![
            doc("w", "a.md", "General notes", "this mentions pricing once"),
            doc("w", "b.md", "Pricing", "nothing relevant here"),
        ];
        let results = ranker().search_documents(&docs, "pricing", None, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item.path, "b.md");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_zero_scores_excluded_and_blank_query_empty() {
        let docs = vec![doc("w", "a.md", "Alpha", "completely unrelated body")];
        assert!(ranker().search_documents(&docs, "webhook", None, 10).is_empty());
        assert!(ranker().search_documents(&docs, "   ", None, 10).is_empty());
    }

    #[test]
    fn test_ties_keep_indexing_order() {
        let docs = vec![
            doc("w", "one.md", "Formats one", "x"),
            doc("w", "two.md", "Formats two", "x"),
            doc("w", "three.md", "Formats three", "x"),
        ];
        let results = ranker().search_documents(&docs, "formats", None, 10);
        let paths: Vec<&str> = results.iter().map(|r| r.item.path.as_str()).collect();
        assert_eq!(paths, vec!["one.md", "two.md", "three.md"]);
    }

    #[test]
    fn test_limit_and_source_filter() {
        let docs = vec![
            doc("a", "x.md", "Targeting", "targeting"),
            doc("b", "y.md", "Targeting", "targeting"),
            doc("b", "z.md", "Targeting", "targeting"),
        ];
        let r = ranker();
        assert_eq!(r.search_documents(&docs, "targeting", None, 2).len(), 2);
        let only_b = r.search_documents(&docs, "targeting", Some("b"), 10);
        assert_eq!(only_b.len(), 2);
        assert!(only_b.iter().all(|s| s.item.source_id == "b"));
    }

    #[test]
    fn test_synonyms_widen_matches() {
        let docs = vec![doc(
            "w",
            "adserver.md",
            "Ad server integration",
            "Connect your Google Ad Manager network.",
        )];
        let results = ranker().search_documents(&docs, "gam", None, 10);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_getting_started_bonus() {
        let readme = doc("w", "README.md", "Widget", "Run the installer to begin.");
        let api = doc("w", "docs/api.md", "Api", "Run the installer to begin.");
        let r = ranker();
        let bonus = r.score_document("how do i begin", &readme) - r.score_document("how do i begin", &api);
        assert_eq!(bonus, ScoringConfig::default().documents.getting_started);
    }

    #[test]
    fn test_front_matter_keywords_score() {
        let mut tagged = doc("w", "a.md", "Overview", "body");
        tagged.keywords = vec!["ctv".into()];
        let plain = doc("w", "b.md", "Overview", "body");
        let r = ranker();
        assert_eq!(
            r.score_document("ctv", &tagged),
            ScoringConfig::default().documents.keyword_word
        );
        assert_eq!(r.score_document("ctv", &plain), 0.0);
    }

    #[test]
    fn test_heading_exact_title_bonus() {
        let exact = heading("Auth", &["Api"], "Use a bearer token.");
        let partial = heading("Auth flows", &["Api"], "Use a bearer token.");
        let r = ranker();
        let weights = ScoringConfig::default().headings;
        let diff = r.score_heading("auth", &exact) - r.score_heading("auth", &partial);
        assert_eq!(diff, weights.title_exact);
    }

    #[test]
    fn test_heading_breadcrumb_contributes() {
        let headings = vec![
            heading("Overview", &["Pricing"], "General text."),
            heading("Overview", &["Other"], "General text."),
        ];
        let results = ranker().search_headings(&headings, "pricing", None, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.breadcrumb, vec!["Pricing".to_string()]);
    }

    #[test]
    fn test_score_monotonic_in_occurrences() {
        let few = doc("w", "a.md", "Notes", "signal");
        let many = doc("w", "b.md", "Notes", "signal signal signal");
        let r = ranker();
        assert!(r.score_document("signal", &many) > r.score_document("signal", &few));
    }
}
