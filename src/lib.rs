//! # Docs Harness
//!
//! Mirrors documentation repositories into a local cache and serves ranked
//! document- and section-level search to assistant tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │ Registry │──▶│   Sync   │──▶│   Crawl   │──▶│Normalize │
//! │ + config │   │ git, tmo │   │ 3 pattern │   │ + title  │
//! └──────────┘   └──────────┘   └───────────┘   └────┬─────┘
//!                                                    ▼
//!                ┌──────────┐   ┌───────────┐   ┌──────────┐
//!                │ CLI/HTTP │◀──│  Search   │◀──│ Headings │
//!                │  tools   │   │ snapshot  │   │ anchors  │
//!                └──────────┘   └───────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Sources, documents, sections, results |
//! | [`registry`] | Compiled-in documentation sources |
//! | [`sync`] | Shallow git working copies with timeouts |
//! | [`crawl`] | Inclusion-pattern file crawler |
//! | [`normalize`] | Front matter, import noise, titles |
//! | [`heading`] | Sections, breadcrumbs, anchor slugs |
//! | [`scoring`] | Weights, query words, synonyms |
//! | [`search`] | Document and section ranking |
//! | [`index`] | Build pipeline and published snapshot |
//! | [`traits`] | `Tool` trait and built-in tools |
//! | [`server`] | JSON tool server |
//! | [`sources`], [`get`] | CLI output |

pub mod config;
pub mod crawl;
pub mod get;
pub mod heading;
pub mod index;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod scoring;
pub mod search;
pub mod server;
pub mod sources;
pub mod sync;
pub mod traits;
