//! Compiled-in documentation sources.
//!
//! Adding a source to a default deployment is a code change here; a config
//! file may replace the whole list with `[[sources]]` entries.

use crate::models::Source;

struct BuiltinSource {
    id: &'static str,
    name: &'static str,
    url: &'static str,
    branch: &'static str,
    include: &'static [&'static str],
    description: &'static str,
}

const BUILTIN_SOURCES: &[BuiltinSource] = &[
    BuiltinSource {
        id: "adcp",
        name: "AdCP Protocol",
        url: "https://github.com/adcontextprotocol/adcp.git",
        branch: "main",
        include: &["README.md", "docs/**/*.md", "docs/**/*.mdx"],
        description: "Ad Context Protocol specification: tasks, schemas, and reference docs",
    },
    BuiltinSource {
        id: "adcp-client-js",
        name: "AdCP JavaScript client",
        url: "https://github.com/adcontextprotocol/adcp-client.git",
        branch: "main",
        include: &["README.md", "docs/**/*.md"],
        description: "TypeScript/JavaScript SDK for calling AdCP agents",
    },
    BuiltinSource {
        id: "adcp-client-python",
        name: "AdCP Python client",
        url: "https://github.com/adcontextprotocol/adcp-client-python.git",
        branch: "main",
        include: &["README.md", "*.md", "docs/**/*.md"],
        description: "Python SDK for calling AdCP agents",
    },
];

/// The compiled-in sources, in registry order.
pub fn builtin_sources() -> Vec<Source> {
    BUILTIN_SOURCES
        .iter()
        .map(|s| Source {
            id: s.id.to_string(),
            name: s.name.to_string(),
            url: s.url.to_string(),
            branch: s.branch.to_string(),
            include: s.include.iter().map(|p| p.to_string()).collect(),
            description: s.description.to_string(),
        })
        .collect()
}
