//! Tool extension trait and the built-in documentation tools.
//!
//! The query interface is exposed to the tool-dispatch layer as a set of
//! [`Tool`] implementations collected in a [`ToolRegistry`]. The HTTP server
//! lists them at `GET /tools/list` and dispatches `POST /tools/{name}`.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ToolRegistry                 │
//! │  search_docs  search_headings  get_doc       │
//! │  list_sources            (+ custom tools)    │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!            ToolContext → DocsIndex snapshot
//! ```
//!
//! # Usage
//!
//! ```rust
//! use docs_harness::traits::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! // tools.register(Box::new(MyTool::new()));
//! assert_eq!(tools.len(), 4);
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::index::DocsIndex;
use crate::models::{IndexedDocument, IndexedHeading, Scored, SourceSummary};

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use docs_harness::traits::{Tool, ToolContext};
///
/// pub struct SourceCountTool;
///
/// #[async_trait]
/// impl Tool for SourceCountTool {
///     fn name(&self) -> &str { "source_count" }
///     fn description(&self) -> &str { "Count indexed documentation sources" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         Ok(json!({ "sources": ctx.list_sources().len() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name (`POST /tools/{name}`); lowercase with underscores.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Marked `"builtin": true` in `GET /tools/list`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. The returned value is wrapped in `{ "result": ... }`.
    ///
    /// Parameters are passed through unvalidated; each tool checks what it
    /// needs and fails with a message the server maps to a status code.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Tool metadata as served by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

impl ToolInfo {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

/// Bridge from a tool invocation to the current index snapshot.
#[derive(Clone)]
pub struct ToolContext {
    index: Arc<DocsIndex>,
}

impl ToolContext {
    pub fn new(index: Arc<DocsIndex>) -> Self {
        Self { index }
    }

    pub fn search_documents(
        &self,
        query: &str,
        source: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Scored<IndexedDocument>> {
        self.index.search_documents(query, source, limit)
    }

    pub fn search_headings(
        &self,
        query: &str,
        source: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Scored<IndexedHeading>> {
        self.index.search_headings(query, source, limit)
    }

    pub fn get_document(&self, id: &str) -> Option<IndexedDocument> {
        self.index.get_document(id)
    }

    pub fn document_headings(&self, id: &str) -> Vec<IndexedHeading> {
        self.index.document_headings(id)
    }

    pub fn list_sources(&self) -> Vec<SourceSummary> {
        self.index.list_sources()
    }
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    let value = params.get(key).and_then(Value::as_str).unwrap_or("");
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

fn optional_limit(params: &Value) -> Result<Option<usize>> {
    match params.get("limit") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 => Ok(Some(n as usize)),
            _ => bail!("invalid limit: expected a positive integer"),
        },
    }
}

fn optional_source(params: &Value) -> Option<&str> {
    params
        .get("source")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn search_schema(what: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": format!("Words or phrase to find in {}", what) },
            "source": { "type": "string", "description": "Restrict results to one source id" },
            "limit": { "type": "integer", "minimum": 1, "description": "Max results" }
        },
        "required": ["query"]
    })
}

/// Ranked whole-document search.
pub struct SearchDocsTool;

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search documentation pages by relevance"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        search_schema("document titles and bodies")
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let limit = optional_limit(&params)?;
        let results = ctx.search_documents(query, optional_source(&params), limit);
        Ok(json!({ "results": results }))
    }
}

/// Ranked section-level search with breadcrumbs and anchors.
pub struct SearchHeadingsTool;

#[async_trait]
impl Tool for SearchHeadingsTool {
    fn name(&self) -> &str {
        "search_headings"
    }

    fn description(&self) -> &str {
        "Search documentation sections and return deep links"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        search_schema("section headings, breadcrumbs and bodies")
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let limit = optional_limit(&params)?;
        let results = ctx.search_headings(query, optional_source(&params), limit);
        Ok(json!({ "results": results }))
    }
}

/// Full document retrieval by id, with its section outline.
pub struct GetDocTool;

#[async_trait]
impl Tool for GetDocTool {
    fn name(&self) -> &str {
        "get_doc"
    }

    fn description(&self) -> &str {
        "Retrieve a documentation page by id"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Document id, e.g. \"adcp/docs/intro\"" }
            },
            "required": ["id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_str(&params, "id")?;
        let Some(doc) = ctx.get_document(id) else {
            bail!("document not found: {}", id);
        };
        let sections: Vec<Value> = ctx
            .document_headings(id)
            .into_iter()
            .map(|h| json!({ "anchor": h.anchor, "title": h.title, "level": h.level, "url": h.url }))
            .collect();
        Ok(json!({ "document": doc, "sections": sections }))
    }
}

/// Per-source counts and sync status.
pub struct ListSourcesTool;

#[async_trait]
impl Tool for ListSourcesTool {
    fn name(&self) -> &str {
        "list_sources"
    }

    fn description(&self) -> &str {
        "List documentation sources with document counts and sync status"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "sources": ctx.list_sources() }))
    }
}

/// Registry for built-in and custom tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// A registry holding the four documentation tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchDocsTool));
        registry.register(Box::new(SearchHeadingsTool));
        registry.register(Box::new(GetDocTool));
        registry.register(Box::new(ListSourcesTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
