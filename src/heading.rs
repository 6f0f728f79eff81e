//! Section extraction for level-2 and level-3 headings.
//!
//! A document body is scanned line by line. Lines inside fenced code blocks
//! are always body text. Each `##`/`###` heading outside a fence closes the
//! previous section and opens a new one whose breadcrumb is the document
//! title followed by the enclosing headings still on the stack.
//!
//! Anchors follow the usual rendered-page convention: a slug of the heading
//! text, with `-1`, `-2`, … appended on collision. Headings whose section is
//! too short to index still reserve their slug, so later anchors line up with
//! what a browser would generate for the same page.

use std::collections::{HashMap, HashSet};

use crate::models::{IndexedDocument, IndexedHeading};

struct OpenSection {
    level: u8,
    title: String,
    anchor: String,
    breadcrumb: Vec<String>,
    body: Vec<String>,
}

/// Tracks anchors already handed out within one document.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    taken: HashSet<String>,
    collisions: HashMap<String, usize>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique anchor for `text`.
    pub fn reserve(&mut self, text: &str) -> String {
        let base = slugify(text);
        if self.taken.insert(base.clone()) {
            return base;
        }
        let count = self.collisions.entry(base.clone()).or_insert(0);
        loop {
            *count += 1;
            let candidate = format!("{}-{}", base, count);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Lowercase, keep `[a-z0-9 -]`, hyphenate whitespace, collapse and trim
/// hyphens. An empty result becomes `section`.
pub fn slugify(text: &str) -> String {
    let filtered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(filtered.len());
    for c in filtered.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Parse an ATX heading of level 2 or 3. Returns `(level, text)`.
fn parse_heading(line: &str) -> Option<(u8, String)> {
    let trimmed = line.trim_start();
    // up to three spaces of indentation, as in CommonMark
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if !(2..=3).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    let mut text = rest.trim();
    // closing sequence: a run of `#` preceded by whitespace
    let stripped = text.trim_end_matches('#');
    if stripped.len() < text.len() && (stripped.is_empty() || stripped.ends_with([' ', '\t'])) {
        text = stripped.trim_end();
    }
    if text.is_empty() {
        return None;
    }
    Some((hashes as u8, text.to_string()))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Split `doc` into indexable sections.
///
/// Sections whose trimmed body has fewer than `min_section_chars`
/// characters are omitted.
pub fn extract_headings(doc: &IndexedDocument, min_section_chars: usize) -> Vec<IndexedHeading> {
    let mut headings = Vec::new();
    let mut slugs = SlugRegistry::new();
    let mut stack: Vec<(u8, String)> = Vec::new();
    let mut current: Option<OpenSection> = None;
    let mut in_fence = false;

    for line in doc.content.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some((level, title)) = parse_heading(line) {
                if let Some(section) = current.take() {
                    close_section(doc, section, min_section_chars, &mut headings);
                }

                while stack.last().is_some_and(|(l, _)| *l >= level) {
                    stack.pop();
                }
                let mut breadcrumb = Vec::with_capacity(stack.len() + 1);
                breadcrumb.push(doc.title.clone());
                breadcrumb.extend(stack.iter().map(|(_, t)| t.clone()));
                stack.push((level, title.clone()));

                current = Some(OpenSection {
                    level,
                    anchor: slugs.reserve(&title),
                    title,
                    breadcrumb,
                    body: Vec::new(),
                });
                continue;
            }
        }

        if let Some(section) = current.as_mut() {
            section.body.push(line.to_string());
        }
    }

    if let Some(section) = current.take() {
        close_section(doc, section, min_section_chars, &mut headings);
    }

    headings
}

fn close_section(
    doc: &IndexedDocument,
    section: OpenSection,
    min_section_chars: usize,
    out: &mut Vec<IndexedHeading>,
) {
    let body = section.body.join("\n").trim().to_string();
    if body.chars().count() < min_section_chars {
        return;
    }
    out.push(IndexedHeading {
        id: format!("{}#{}", doc.id, section.anchor),
        document_id: doc.id.clone(),
        source_id: doc.source_id.clone(),
        url: format!("{}#{}", doc.url, section.anchor),
        anchor: section.anchor,
        title: section.title,
        level: section.level,
        breadcrumb: section.breadcrumb,
        content: body,
        path: doc.path.clone(),
    });
}
