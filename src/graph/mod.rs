// src/graph/mod.rs
// =============================================================================
// This module persists the crawled link graph.
//
// Submodules:
// - writer: GraphWriter, the GraphStore trait and its error type
// - neo4j: the production store (Neo4j HTTP transactional API)
// - memory: an in-memory store with identical merge rules
// =============================================================================

mod memory;
mod neo4j;
mod writer;

pub use memory::MemoryGraph;
pub use neo4j::{Neo4jConfig, Neo4jStore};
pub use writer::{GraphError, GraphStore, GraphWriter};

#[cfg(test)]
pub use writer::PageLinksUpsert;
