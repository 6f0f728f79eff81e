//! Markdown normalization: front matter, import noise, and title resolution.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// A markdown file reduced to what the index stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDoc {
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Default)]
struct FrontMatter {
    title: Option<String>,
    description: Option<String>,
    keywords: Vec<String>,
}

static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(?:import\s+.+?\s+from\s+['"][^'"]+['"];?|import\s+['"][^'"]+['"];?|\{%-?\s*include\s+.*?-?%\})\s*$"#,
    )
    .expect("import regex is valid")
});

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank-line regex is valid"));

/// Normalize one file. Returns `None` when the cleaned content is shorter
/// than `min_chars` characters.
pub fn normalize(raw: &str, rel_path: &str, min_chars: usize) -> Option<NormalizedDoc> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let text = text.replace("\r\n", "\n");

    let (front, body) = split_front_matter(&text);

    let joined = strip_imports(body);
    let content = BLANK_RUN
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string();

    if content.chars().count() < min_chars {
        return None;
    }

    let title = front
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| first_h1(&content))
        .unwrap_or_else(|| title_from_path(rel_path));

    Some(NormalizedDoc {
        title,
        content,
        description: front.description,
        keywords: front.keywords,
    })
}

/// Split a leading `---` block off the text. Text without a closed block is
/// returned unchanged.
fn split_front_matter(text: &str) -> (FrontMatter, &str) {
    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return (FrontMatter::default(), text),
    }

    let mut offset = text.split_inclusive('\n').next().map_or(0, str::len);
    let start = offset;
    for line in lines {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let block = &text[start..offset];
            let body = &text[offset + line.len()..];
            return (parse_front_matter(block), body);
        }
        offset += line.len();
    }

    (FrontMatter::default(), text)
}

fn parse_front_matter(block: &str) -> FrontMatter {
    let mut front = FrontMatter::default();
    let mut in_keywords = false;

    for line in block.lines() {
        if in_keywords {
            if let Some(item) = line.trim_start().strip_prefix("- ") {
                push_keyword(&mut front.keywords, item);
                continue;
            }
            in_keywords = false;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "title" => front.title = Some(unquote(value).to_string()),
            "description" if !value.is_empty() => {
                front.description = Some(unquote(value).to_string())
            }
            "keywords" => {
                if value.is_empty() {
                    in_keywords = true;
                } else {
                    let list = value.trim_start_matches('[').trim_end_matches(']');
                    for item in list.split(',') {
                        push_keyword(&mut front.keywords, item);
                    }
                }
            }
            _ => {}
        }
    }

    front
}

fn push_keyword(keywords: &mut Vec<String>, raw: &str) {
    let keyword = unquote(raw.trim()).trim().to_lowercase();
    if !keyword.is_empty() && !keywords.contains(&keyword) {
        keywords.push(keyword);
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Drop MDX import and include lines. Code samples inside fences keep theirs.
fn strip_imports(body: &str) -> String {
    let mut in_fence = false;
    let mut kept = Vec::new();
    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && IMPORT_LINE.is_match(line) {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}

/// First `# ` heading outside fenced code.
fn first_h1(content: &str) -> Option<String> {
    let mut in_fence = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(text) = trimmed.strip_prefix("# ") {
            let text = text.trim().trim_end_matches('#').trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// `docs/getting-started_guide.md` → `Getting Started Guide`.
pub fn title_from_path(rel_path: &str) -> String {
    let stem = Path::new(rel_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter_title_wins() {
        let raw = "---\ntitle: \"Media Buys\"\ndescription: How buys work\n---\n# Ignored\n\nBody text that is long enough.";
        let doc = normalize(raw, "docs/buys.md", 10).unwrap();
        assert_eq!(doc.title, "Media Buys");
        assert_eq!(doc.description.as_deref(), Some("How buys work"));
        assert!(doc.content.starts_with("# Ignored"));
        assert!(!doc.content.contains("title:"));
    }

    #[test]
    fn test_h1_title_skips_fences() {
        let raw = "```sh\n# not a title\n```\n\n# Real Title\n\nSome body text here.";
        let doc = normalize(raw, "x.md", 10).unwrap();
        assert_eq!(doc.title, "Real Title");
    }

    #[test]
    fn test_title_from_filename() {
        let doc = normalize("Just some plain prose, no headings.", "docs/getting-started_guide.md", 10)
            .unwrap();
        assert_eq!(doc.title, "Getting Started Guide");
        assert_eq!(title_from_path("docs/api.md"), "Api");
    }

    #[test]
    fn test_imports_and_includes_removed() {
        let raw = "import Tabs from '@theme/Tabs';\nimport './styles.css';\n{% include note.html %}\nReal content stays put.";
        let doc = normalize(raw, "x.mdx", 5).unwrap();
        assert_eq!(doc.content, "Real content stays put.");
    }

    #[test]
    fn test_fenced_imports_are_kept() {
        let raw = "import Tabs from '@theme/Tabs';\n\n# Client\n\n```ts\nimport { AdcpClient } from '@adcp/client';\n```";
        let doc = normalize(raw, "client.mdx", 5).unwrap();
        assert!(!doc.content.contains("@theme/Tabs"));
        assert!(doc
            .content
            .contains("import { AdcpClient } from '@adcp/client';"));
        assert_eq!(doc.title, "Client");
    }

    #[test]
    fn test_prose_starting_with_import_is_kept() {
        let raw = "import your data with the CLI before running queries.";
        let doc = normalize(raw, "x.md", 5).unwrap();
        assert_eq!(doc.content, raw);
    }

    #[test]
    fn test_blank_runs_collapse() {
        let raw = "para one\n\n\n  \n\npara two\n\npara three";
        let doc = normalize(raw, "x.md", 5).unwrap();
        assert_eq!(doc.content, "para one\n\npara two\n\npara three");
    }

    #[test]
    fn test_short_documents_dropped() {
        assert!(normalize("---\ntitle: Stub\n---\n\nTODO", "stub.md", 20).is_none());
        assert!(normalize("", "empty.md", 1).is_none());
    }

    #[test]
    fn test_keywords_inline_and_list() {
        let raw = "---\nkeywords: [GAM, 'Ad Server']\n---\nbody text long enough";
        let doc = normalize(raw, "x.md", 5).unwrap();
        assert_eq!(doc.keywords, vec!["gam".to_string(), "ad server".to_string()]);

        let raw = "---\nkeywords:\n  - signals\n  - targeting\ntitle: T\n---\nbody text long enough";
        let doc = normalize(raw, "x.md", 5).unwrap();
        assert_eq!(doc.keywords, vec!["signals".to_string(), "targeting".to_string()]);
        assert_eq!(doc.title, "T");
    }

    #[test]
    fn test_bom_and_dots_terminator() {
        let raw = "\u{feff}---\ntitle: Dotted\n...\nbody text long enough";
        let doc = normalize(raw, "x.md", 5).unwrap();
        assert_eq!(doc.title, "Dotted");
        assert_eq!(doc.content, "body text long enough");
    }

    #[test]
    fn test_unclosed_front_matter_is_content() {
        let raw = "---\nnot closed\nmore text here";
        let doc = normalize(raw, "x.md", 5).unwrap();
        assert!(doc.content.starts_with("---"));
    }
}
