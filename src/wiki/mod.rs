// src/wiki/mod.rs
// =============================================================================
// This module talks to the Wikipedia (MediaWiki) API.
//
// Submodules:
// - fetch: the paginated "which articles does this page link to?" client
// - wire: decoding of the raw JSON responses
// - pacer: the politeness delay between requests
// =============================================================================

mod fetch;
mod pacer;
mod wire;

pub use fetch::{LinkSource, WikiClient, WikiConfig, DEFAULT_API_URL, DEFAULT_USER_AGENT};

// Only the crawl tests build link listings and fetch errors by hand
#[cfg(test)]
pub use fetch::{FetchError, PageLinks};
