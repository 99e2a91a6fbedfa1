// src/graph/memory.rs
// =============================================================================
// An in-memory graph with the same merge rules as the Neo4j statement.
//
// Used by `--dry-run` (crawl without a database) and by the tests.
// Each upsert is applied under one lock, so it is all-or-nothing.
// =============================================================================

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::writer::{GraphError, GraphStore, PageLinksUpsert};

#[derive(Debug, Default)]
struct GraphState {
    // title -> page id (None until the page itself is crawled)
    nodes: BTreeMap<String, Option<u64>>,
    edges: BTreeSet<(String, String)>,
    upserts: usize,
    fail_on: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// Number of upserts applied so far.
    pub fn upserts(&self) -> usize {
        self.lock().upserts
    }

    /// `None` if the node does not exist, `Some(id)` otherwise.
    #[cfg(test)]
    pub fn page_id(&self, title: &str) -> Option<Option<u64>> {
        self.lock().nodes.get(title).copied()
    }

    /// Link targets of `title`, sorted.
    #[cfg(test)]
    pub fn edges_from(&self, title: &str) -> Vec<String> {
        self.lock()
            .edges
            .iter()
            .filter(|(from, _)| from == title)
            .map(|(_, to)| to.clone())
            .collect()
    }

    /// Makes upserts for `title` fail, to simulate an unreachable store.
    #[cfg(test)]
    pub fn fail_on(&self, title: &str) {
        self.lock().fail_on.insert(title.to_string());
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn upsert_page_links(&self, upsert: &PageLinksUpsert) -> Result<(), GraphError> {
        let mut state = self.lock();
        if state.fail_on.contains(&upsert.page) {
            return Err(GraphError::Unavailable(format!(
                "write for '{}' refused",
                upsert.page
            )));
        }

        // ON CREATE SET page_id / ON MATCH SET coalesce(page_id, $page_id)
        let id = state.nodes.entry(upsert.page.clone()).or_insert(None);
        if id.is_none() {
            *id = upsert.page_id;
        }

        for link in &upsert.links {
            state.nodes.entry(link.clone()).or_insert(None);
            state.edges.insert((upsert.page.clone(), link.clone()));
        }
        state.upserts += 1;
        Ok(())
    }
}
