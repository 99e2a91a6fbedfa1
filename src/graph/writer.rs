// src/graph/writer.rs
// =============================================================================
// Turns one crawled page into one idempotent graph write.
//
// For a page P with links [L1, L2, ...] the store must, in a single
// transaction:
// 1. Merge the node P (fill in its page id only if it has none yet)
// 2. Merge a node for every Li (no page id; that comes when Li is crawled)
// 3. Merge the edge P -HAS_LINK-> Li
//
// Running the same write twice must leave the graph unchanged.
// =============================================================================

use async_trait::async_trait;
use indexmap::IndexSet;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

/// The parameters of one "page has links to ..." upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinksUpsert {
    pub page: String,
    pub page_id: Option<u64>,
    pub links: Vec<String>,
}

/// Persistence failures. These stop the crawl: dropping a write would
/// leave the graph silently incomplete.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid graph store URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("graph store answered HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("graph store rejected the statement: {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("graph store unavailable: {0}")]
    Unavailable(String),
}

/// A graph database that can apply a `PageLinksUpsert` atomically.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_page_links(&self, upsert: &PageLinksUpsert) -> Result<(), GraphError>;
}

/// Writes crawl results to a `GraphStore`.
#[derive(Debug)]
pub struct GraphWriter<S> {
    store: S,
}

impl<S: GraphStore> GraphWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persists `page -> links` as one transactional unit.
    pub async fn persist(
        &self,
        page: &str,
        page_id: Option<u64>,
        links: &IndexSet<String>,
    ) -> Result<(), GraphError> {
        let upsert = PageLinksUpsert {
            page: page.to_string(),
            page_id,
            links: links.iter().cloned().collect(),
        };
        self.store.upsert_page_links(&upsert).await?;
        debug!(page, ?page_id, links = upsert.links.len(), "persisted page links");
        Ok(())
    }
}
