// src/crawl/mod.rs
// =============================================================================
// This module handles the breadth-first crawl of the Wikipedia link graph.
//
// Features:
// - Breadth-first crawling starting from one article
// - A page budget that bounds how many articles get crawled
// - Periodic checkpoints so a restarted crawl picks up where it stopped
// - Cooperative cancellation with a final checkpoint
//
// Submodules:
// - frontier: the visited set and the pending queue
// - engine: the crawl loop that ties fetcher, graph and checkpoints together
// =============================================================================

mod engine;
mod frontier;

pub use engine::{CrawlOutcome, CrawlSettings, CrawlSummary, Crawler};
pub use frontier::Frontier;
