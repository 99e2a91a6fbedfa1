// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: run (or resume) the crawl and write the link graph to Neo4j
// - status: show what the last checkpoint contains, without crawling
//
// Neo4j credentials can come from flags or from NEO4J_URI / NEO4J_USER /
// NEO4J_PASSWORD / NEO4J_DB environment variables (clap's `env` feature).
//
// Rust concepts:
// - Derive macros: Parser, Subcommand and Args generate the parsing code
// - Option<T>: credentials are optional at parse time, validated later
// =============================================================================

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::crawl::CrawlSettings;
use crate::graph::Neo4jConfig;
use crate::wiki::{WikiConfig, DEFAULT_API_URL, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "wiki-graph-crawler",
    version,
    about = "Crawl Wikipedia breadth-first and store its link graph in Neo4j",
    long_about = "wiki-graph-crawler walks Wikipedia article links breadth-first from a start page, \
                  stores every page -> link edge in Neo4j and checkpoints its progress so an \
                  interrupted crawl resumes where it stopped."
)]
pub struct Cli {
    /// Show debug output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl Wikipedia, resuming from the checkpoint in --state-dir if there is one
    ///
    /// Example: wiki-graph-crawler crawl --start-page Hydrogen --max-pages 500
    Crawl(CrawlArgs),

    /// Show the checkpoint in --state-dir without crawling
    Status {
        /// Directory holding visited.json and queue.json
        #[arg(long, default_value = ".")]
        state_dir: PathBuf,

        /// Article a crawl would start from when queue.json is missing
        #[arg(long, default_value = "Hydrogen")]
        start_page: String,

        /// How many queued titles to list
        #[arg(long, default_value_t = 10)]
        show: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Article to start from (ignored when a checkpoint exists)
    #[arg(long, default_value = "Hydrogen")]
    pub start_page: String,

    /// Stop once this many pages have been crawled, across all sessions
    #[arg(long, default_value_t = 1000, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_pages: usize,

    /// Save a checkpoint every N crawled pages
    #[arg(long, default_value_t = 5, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub save_every: usize,

    /// Minimum delay between Wikipedia API requests, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Directory for visited.json and queue.json
    #[arg(long, default_value = ".")]
    pub state_dir: PathBuf,

    /// MediaWiki API endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// User-Agent sent to Wikipedia (their policy asks for contact details)
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Neo4j HTTP URI, e.g. http://localhost:7474
    #[arg(long, env = "NEO4J_URI")]
    pub neo4j_uri: Option<Url>,

    #[arg(long, env = "NEO4J_USER")]
    pub neo4j_user: Option<String>,

    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub neo4j_password: Option<String>,

    #[arg(long, env = "NEO4J_DB", default_value = "neo4j")]
    pub neo4j_db: String,

    /// Crawl without a database: keep the graph in memory and never write
    /// checkpoints
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--{flag} (or {env}) is required unless --dry-run is given")]
    MissingNeo4jSetting {
        flag: &'static str,
        env: &'static str,
    },
}

impl CrawlArgs {
    pub fn settings(&self) -> CrawlSettings {
        CrawlSettings {
            max_pages: self.max_pages,
            checkpoint_every: self.save_every,
        }
    }

    pub fn wiki_config(&self) -> WikiConfig {
        WikiConfig {
            api_url: self.api_url.clone(),
            user_agent: self.user_agent.clone(),
            delay: Duration::from_millis(self.delay_ms),
            ..WikiConfig::default()
        }
    }

    /// Collects the Neo4j settings, failing on the first one that is missing.
    pub fn neo4j_config(&self) -> Result<Neo4jConfig, ConfigError> {
        fn required<T: Clone>(
            value: &Option<T>,
            flag: &'static str,
            env: &'static str,
        ) -> Result<T, ConfigError> {
            value
                .clone()
                .ok_or(ConfigError::MissingNeo4jSetting { flag, env })
        }

        Ok(Neo4jConfig {
            uri: required(&self.neo4j_uri, "neo4j-uri", "NEO4J_URI")?,
            user: required(&self.neo4j_user, "neo4j-user", "NEO4J_USER")?,
            password: required(&self.neo4j_password, "neo4j-password", "NEO4J_PASSWORD")?,
            database: self.neo4j_db.clone(),
        })
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why RangedU64ValueParser?
//    - A budget or checkpoint interval of 0 makes no sense
//    - Rejecting it at parse time gives the user clap's normal error message
//
// 2. Why are the Neo4j options Option<...>?
//    - `--dry-run` does not need a database at all
//    - So we validate them in neo4j_config() instead of making clap require them
//
// 3. hide_env_values = true
//    - Keeps the password out of `--help` output
// -----------------------------------------------------------------------------
