// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing)
// 3. Dispatch to the appropriate subcommand handler
// 4. Print a summary and exit with a proper code (0 = success, 2 = error)
//
// The crawl itself lives in crawl::Crawler; this file only wires the pieces
// together: Wikipedia client, Neo4j (or in-memory) graph, checkpoint files and
// the Ctrl-C handler.
// =============================================================================

mod checkpoint;
mod cli;
mod crawl;
mod graph;
mod wiki;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use checkpoint::{CheckpointStore, JsonFileStore, MemoryCheckpointStore};
use cli::{Cli, Commands, CrawlArgs};
use crawl::{CrawlOutcome, CrawlSummary, Crawler, Frontier};
use graph::{GraphWriter, MemoryGraph, Neo4jStore};
use wiki::WikiClient;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Status {
            state_dir,
            start_page,
            show,
        } => handle_status(&state_dir, &start_page, show).await,
    }
}

// RUST_LOG wins; otherwise the verbosity flags pick the level
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

// Cancels `token` on Ctrl-C; the crawler finishes with a final checkpoint
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, saving progress and stopping");
            token.cancel();
        }
    });
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let source = WikiClient::new(args.wiki_config()).context("could not build the HTTP client")?;
    let file_store = JsonFileStore::new(&args.state_dir);

    let mut frontier = Frontier::load(&file_store, &args.start_page)
        .await
        .with_context(|| format!("could not load the checkpoint from {}", file_store.dir().display()))?;
    println!(
        "📂 Loaded {} visited pages and {} pages in queue.",
        frontier.visited_len(),
        frontier.queue_len()
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let summary = if args.dry_run {
        // Same crawl, but nothing leaves the process
        let mut crawler = Crawler::new(
            source,
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            args.settings(),
        )
        .with_cancellation(cancel);

        let summary = crawler.run(&mut frontier).await?;
        debug!(state = ?crawler.state(), "crawler finished");

        let graph = crawler.writer().store();
        println!(
            "🧪 Dry run: {} nodes and {} edges from {} page writes (nothing was saved)",
            graph.node_count(),
            graph.edge_count(),
            graph.upserts()
        );
        summary
    } else {
        let store = Neo4jStore::new(args.neo4j_config()?).context("invalid Neo4j settings")?;
        store
            .ensure_schema()
            .await
            .context("could not reach the Neo4j database")?;

        let mut crawler = Crawler::new(
            source,
            GraphWriter::new(store),
            file_store,
            args.settings(),
        )
        .with_cancellation(cancel);

        let summary = crawler.run(&mut frontier).await?;
        debug!(state = ?crawler.state(), "crawler finished");
        summary
    };

    print_summary(&summary);
    Ok(0)
}

// Handles the 'status' subcommand
async fn handle_status(state_dir: &Path, start_page: &str, show: usize) -> Result<i32> {
    let store = JsonFileStore::new(state_dir);
    if store.load_visited().await?.is_none() && store.load_frontier().await?.is_none() {
        println!("No checkpoint found in {}", store.dir().display());
        return Ok(0);
    }

    // Same rules as `crawl`, so a missing queue.json shows the seeded start page
    let frontier = Frontier::load(&store, start_page).await?;
    println!("📂 Checkpoint in {}", store.dir().display());
    println!("   ✅ Visited: {}", frontier.visited_len());
    println!("   📋 Queued: {}", frontier.queue_len());

    if frontier.queue_len() > 0 {
        println!("\nNext up:");
        for (i, title) in frontier.pending().take(show).enumerate() {
            println!("   {:>3}. {}", i + 1, title);
        }
        if frontier.queue_len() > show {
            println!("   ... and {} more", frontier.queue_len() - show);
        }
    }
    Ok(0)
}

fn print_summary(summary: &CrawlSummary) {
    let reason = match summary.outcome {
        CrawlOutcome::Exhausted => "no pages left to crawl",
        CrawlOutcome::BudgetReached => "page budget reached",
        CrawlOutcome::Cancelled => "interrupted",
    };

    println!();
    println!("📊 Summary ({}):", reason);
    println!("   ✅ Crawled this session: {}", summary.crawled);
    println!("   ❌ Failed to fetch: {}", summary.failed);
    println!("   ⏭️  Already visited: {}", summary.skipped);
    println!("   💾 Checkpoints written: {}", summary.checkpoints);
    println!("   📋 Visited in total: {}", summary.visited_total);
    println!("   🕸️  Still queued: {}", summary.frontier_len);
}
