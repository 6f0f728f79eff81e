//! `dox get`, `dox search`, and `dox headings` output.

use crate::index::DocsIndex;

/// Print one document and its section outline. Returns `false` if the id is
/// not indexed.
pub fn run_get(index: &DocsIndex, id: &str) -> bool {
    let Some(doc) = index.get_document(id) else {
        eprintln!("Error: document not found: {}", id);
        return false;
    };

    println!("--- Document ---");
    println!("id:       {}", doc.id);
    println!("title:    {}", doc.title);
    println!("source:   {} ({})", doc.source_id, doc.source_name);
    println!("path:     {}", doc.path);
    println!("url:      {}", doc.url);
    if let Some(ref description) = doc.description {
        println!("summary:  {}", description);
    }
    if !doc.keywords.is_empty() {
        println!("keywords: {}", doc.keywords.join(", "));
    }
    println!();

    println!("--- Body ---");
    println!("{}", doc.content);
    println!();

    let sections = index.document_headings(id);
    println!("--- Sections ({}) ---", sections.len());
    for h in &sections {
        let indent = if h.level == 3 { "  " } else { "" };
        println!("{}{}  #{}", indent, h.title, h.anchor);
    }

    true
}

pub fn run_search(index: &DocsIndex, query: &str, source: Option<&str>, limit: Option<usize>) {
    let results = index.search_documents(query, source, limit);
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        println!("{}. [{:.1}] {}", i + 1, r.score, r.item.title);
        println!("    id:  {}", r.item.id);
        println!("    url: {}", r.item.url);
    }
}

pub fn run_headings(index: &DocsIndex, query: &str, source: Option<&str>, limit: Option<usize>) {
    let results = index.search_headings(query, source, limit);
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        println!(
            "{}. [{:.1}] {} > {}",
            i + 1,
            r.score,
            r.item.breadcrumb.join(" > "),
            r.item.title
        );
        println!("    url: {}", r.item.url);
    }
}
