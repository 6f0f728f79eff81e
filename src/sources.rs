//! `dox sources`: per-source status table.

use crate::index::DocsIndex;
use crate::models::SourceSummary;

pub fn print_sources(index: &DocsIndex) {
    let sources = index.list_sources();
    if sources.is_empty() {
        println!("No sources configured.");
        return;
    }
    for line in render_table(&sources) {
        println!("{}", line);
    }
}

fn render_table(sources: &[SourceSummary]) -> Vec<String> {
    let mut lines = Vec::with_capacity(sources.len() + 1);
    lines.push(format!(
        "{:<24} {:<12} {:>6} {:>9}  COMMIT",
        "SOURCE", "STATUS", "DOCS", "SECTIONS"
    ));
    for s in sources {
        let commit = s
            .commit
            .as_deref()
            .map(|c| c.chars().take(10).collect::<String>())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{:<24} {:<12} {:>6} {:>9}  {}",
            s.id,
            s.status.as_str(),
            s.document_count,
            s.heading_count,
            commit
        ));
    }
    lines
}
