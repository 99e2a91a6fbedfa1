// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: which pages are done, which are waiting.
//
// Three collections work together:
// - visited: HashSet of titles already crawled (links fetched + persisted)
// - queue: VecDeque of titles waiting, in breadth-first order
// - queued: HashSet mirror of `queue` for O(1) "is it already waiting?"
//
// Invariant: `queue` and `queued` always hold exactly the same titles, and a
// title is never pushed while it is visited or already waiting.
//
// Rust concepts:
// - VecDeque: push_back/pop_front for FIFO order
// - HashSet: constant-time membership checks
// =============================================================================

use std::collections::{HashSet, VecDeque};

use crate::checkpoint::{CheckpointError, CheckpointStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    visited: HashSet<String>,
    queue: VecDeque<String>,
    queued: HashSet<String>,
}

/// Serializable copy of the frontier for the checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Sorted so that identical state produces identical files.
    pub visited: Vec<String>,
    /// Exact queue order.
    pub frontier: Vec<String>,
}

impl Frontier {
    /// A fresh crawl: nothing visited, only the start page waiting.
    #[cfg(test)]
    pub fn seeded(start_page: &str) -> Self {
        Self::restore(Vec::new(), vec![start_page.to_string()])
    }

    /// Rebuilds the frontier from checkpointed lists.
    ///
    /// Titles are taken as given; a visited title that is also queued stays
    /// queued and is skipped when it comes up. Repeated queue entries are
    /// collapsed to their first position.
    pub fn restore(visited: Vec<String>, frontier: Vec<String>) -> Self {
        let mut restored = Self {
            visited: visited.into_iter().collect(),
            ..Self::default()
        };
        for title in frontier {
            if restored.queued.insert(title.clone()) {
                restored.queue.push_back(title);
            }
        }
        restored
    }

    /// Loads the frontier from a checkpoint store.
    ///
    /// Each blob is independent: no visited blob means an empty visited set,
    /// no frontier blob means the crawl starts from `start_page`. When a
    /// frontier blob exists it is authoritative and `start_page` is ignored.
    pub async fn load<C: CheckpointStore + ?Sized>(
        store: &C,
        start_page: &str,
    ) -> Result<Self, CheckpointError> {
        let visited = store.load_visited().await?.unwrap_or_default();
        let frontier = store
            .load_frontier()
            .await?
            .unwrap_or_else(|| vec![start_page.to_string()]);
        Ok(Self::restore(visited, frontier))
    }

    /// Writes both blobs to the checkpoint store, frontier first.
    ///
    /// If the second write fails, the stored frontier is new and the stored
    /// visited set is old. Pages crawled since the last checkpoint then count
    /// as unvisited and get crawled again, which is harmless. The other order
    /// could record a page as visited while its links never reached the
    /// stored frontier, cutting them off for good.
    pub async fn save<C: CheckpointStore + ?Sized>(&self, store: &C) -> Result<(), CheckpointError> {
        let snapshot = self.snapshot();
        store.store_frontier(&snapshot.frontier).await?;
        store.store_visited(&snapshot.visited).await
    }

    /// Removes and returns the next page, keeping `queued` in sync.
    pub fn dequeue(&mut self) -> Option<String> {
        let title = self.queue.pop_front()?;
        self.queued.remove(&title);
        Some(title)
    }

    /// Puts a page back at the head of the queue.
    ///
    /// Used when a page was dequeued but could not be finished (cancelled
    /// mid-fetch, or its write failed) so the next session starts with it.
    pub fn requeue_front(&mut self, title: String) {
        if self.visited.contains(&title) || !self.queued.insert(title.clone()) {
            return;
        }
        self.queue.push_front(title);
    }

    /// Records a page as crawled. Idempotent.
    pub fn mark_visited(&mut self, title: &str) {
        if !self.visited.contains(title) {
            self.visited.insert(title.to_string());
        }
    }

    /// Queues `title` unless it is already visited or waiting.
    ///
    /// Returns whether the title was added.
    pub fn enqueue_if_new(&mut self, title: &str) -> bool {
        if self.visited.contains(title) || self.queued.contains(title) {
            return false;
        }
        self.queued.insert(title.to_string());
        self.queue.push_back(title.to_string());
        true
    }

    pub fn is_visited(&self, title: &str) -> bool {
        self.visited.contains(title)
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Titles waiting to be crawled, in crawl order.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();
        Snapshot {
            visited,
            frontier: self.queue.iter().cloned().collect(),
        }
    }
}
