// src/checkpoint/mod.rs
// =============================================================================
// Durable crawl state: the visited set and the pending queue.
//
// The two are stored as independent blobs, each a flat list of titles:
// - visited: every page whose links have been fetched and persisted
// - frontier: pages waiting to be crawled, in BFS order
//
// Backends:
// - JsonFileStore: visited.json + queue.json in a state directory
// - MemoryCheckpointStore: in-process, for tests and dry runs
// =============================================================================

mod json_file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use json_file::JsonFileStore;
pub use memory::MemoryCheckpointStore;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint file {path} is not a JSON list of titles: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint store unavailable: {0}")]
    Unavailable(String),
}

/// A durable home for crawl state.
///
/// A missing blob is `Ok(None)`, not an error: it simply means no previous
/// session has written it yet.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load_visited(&self) -> Result<Option<Vec<String>>, CheckpointError>;
    async fn load_frontier(&self) -> Result<Option<Vec<String>>, CheckpointError>;
    async fn store_visited(&self, visited: &[String]) -> Result<(), CheckpointError>;
    async fn store_frontier(&self, frontier: &[String]) -> Result<(), CheckpointError>;
}
