//! Lectern CLI - command-line search over a local document corpus.
//!
//! # Usage
//!
//! ```bash
//! # Search the corpus
//! lectern "btree indexing"
//! lectern "supervised learning" -n 5 --method probabilistic
//! lectern "query" --json
//!
//! # Restrict results to folders
//! lectern "normal forms" --scope DBMS --scope ML
//!
//! # Maintain the index
//! lectern --rebuild
//! lectern --ingest ~/notes/lecture.txt
//! ```

mod config;
mod output;
mod search;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lectern_core::search::SearchMethod;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Multi-signal search over a local document corpus.
///
/// Ranks documents with lexical, probabilistic and semantic models and
/// fuses their scores. The index is cached on disk and rebuilt when the
/// corpus changes.
#[derive(Parser)]
#[command(name = "lectern", version, about)]
struct Cli {
    /// Search query
    query: Option<String>,

    /// Maximum number of results to return
    #[arg(short = 'n', long, default_value = "10")]
    limit: usize,

    /// Ranking model to answer the query with
    #[arg(long, value_enum, default_value = "fused")]
    method: MethodArg,

    /// Restrict results to these corpus folders (repeatable)
    #[arg(long)]
    scope: Vec<String>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Corpus root directory
    #[arg(long, default_value = "./documents")]
    corpus: PathBuf,

    /// Custom data directory (default: platform standard location)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Rescan the corpus and rebuild the index before searching
    #[arg(long)]
    rebuild: bool,

    /// Copy a file into the corpus and index it
    #[arg(long, value_name = "FILE")]
    ingest: Option<PathBuf>,

    /// Disable synonym expansion of the query
    #[arg(long)]
    no_expand: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    /// TF-IDF cosine over the capped vocabulary
    Lexical,
    /// BM25 probabilistic relevance
    Probabilistic,
    /// Dense embedding cosine (delegates to lexical when unavailable)
    Semantic,
    /// Weighted fusion of all three models
    Fused,
}

impl From<MethodArg> for SearchMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Lexical => SearchMethod::Lexical,
            MethodArg::Probabilistic => SearchMethod::Probabilistic,
            MethodArg::Semantic => SearchMethod::Semantic,
            MethodArg::Fused => SearchMethod::Fused,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let engine = search::open_engine(&cli.corpus, cli.data_dir.as_ref(), !cli.no_expand).await?;

    let mut acted = false;
    if cli.rebuild {
        let count = engine.reload(true).await.context("Rebuild failed")?;
        eprintln!("Rebuilt index over {} documents.", count);
        acted = true;
    }
    if let Some(source) = &cli.ingest {
        let rel = search::ingest_file(&engine, &cli.corpus, source).await?;
        eprintln!(
            "Ingested {} ({} documents indexed).",
            rel,
            engine.document_count()
        );
        acted = true;
    }

    match &cli.query {
        Some(query) => {
            let hits = engine
                .search(query, cli.method.into(), cli.limit, &cli.scope)
                .await?;

            let rendered = if cli.json {
                output::format_json(query, &hits)
            } else {
                output::format_human(query, &hits)
            };
            println!("{}", rendered);
        }
        None if !acted => {
            eprintln!("No search query provided. Use --help for usage information.");
            std::process::exit(1);
        }
        None => {}
    }

    Ok(())
}
