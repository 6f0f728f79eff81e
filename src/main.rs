//! # Docs Harness CLI (`dox`)
//!
//! Every command syncs the configured sources, builds the index once, and
//! then answers from that snapshot.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dox sources` | Sources with sync status and document/section counts |
//! | `dox search "<query>"` | Ranked documents |
//! | `dox headings "<query>"` | Ranked sections with breadcrumbs and deep links |
//! | `dox get <id>` | A full document and its section outline |
//! | `dox serve` | Start the JSON tool server |
//!
//! ## Examples
//!
//! ```bash
//! dox search "create media buy" --source adcp
//! dox headings "authentication" --limit 5
//! dox --offline get adcp/docs/intro
//! dox --config ./config/dox.toml serve
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use docs_harness::config;
use docs_harness::get;
use docs_harness::index::build_index;
use docs_harness::server;
use docs_harness::sources;

/// Docs Harness: mirrored documentation repositories with ranked search.
#[derive(Parser)]
#[command(name = "dox", version, about)]
struct Cli {
    /// Path to configuration file (TOML). A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/dox.toml")]
    config: PathBuf,

    /// Use existing working copies without touching the network.
    #[arg(long, global = true)]
    offline: bool,

    /// Debug-level logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sources with sync status and counts.
    Sources,

    /// Search whole documents.
    Search {
        query: String,
        /// Restrict results to one source id.
        #[arg(long)]
        source: Option<String>,
        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search sections (level-2/3 headings).
    Headings {
        query: String,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a document by id (`<source>/<path-without-extension>`).
    Get { id: String },

    /// Serve the documentation tools over HTTP.
    Serve,
}

fn initialize_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.verbose)?;

    let mut cfg = config::load_config_or_default(&cli.config)?;
    if cli.offline {
        cfg.sync.offline = true;
    }

    let index = build_index(&cfg).await?;

    match cli.command {
        Commands::Sources => sources::print_sources(&index),
        Commands::Search {
            query,
            source,
            limit,
        } => get::run_search(&index, &query, source.as_deref(), limit),
        Commands::Headings {
            query,
            source,
            limit,
        } => get::run_headings(&index, &query, source.as_deref(), limit),
        Commands::Get { id } => {
            if !get::run_get(&index, &id) {
                std::process::exit(1);
            }
        }
        Commands::Serve => server::run_server(&cfg, Arc::new(index)).await?,
    }

    Ok(())
}
