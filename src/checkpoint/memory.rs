// src/checkpoint/memory.rs
// In-process checkpoint store. Used for dry runs and by the engine tests,
// which need to count writes and simulate an unavailable store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{CheckpointError, CheckpointStore};

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    visited: Mutex<Option<Vec<String>>>,
    frontier: Mutex<Option<Vec<String>>>,
    visited_writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing checkpoint, as if a previous session wrote it.
    #[cfg(test)]
    pub fn with_state(visited: Vec<String>, frontier: Vec<String>) -> Self {
        Self {
            visited: Mutex::new(Some(visited)),
            frontier: Mutex::new(Some(frontier)),
            ..Self::default()
        }
    }

    /// Number of completed checkpoints. The visited set is written last,
    /// so each visited write closes one checkpoint.
    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.visited_writes.load(Ordering::SeqCst)
    }

    /// Makes every following write fail until switched back.
    #[cfg(test)]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CheckpointError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CheckpointError::Unavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

fn read(slot: &Mutex<Option<Vec<String>>>) -> Option<Vec<String>> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn write(slot: &Mutex<Option<Vec<String>>>, titles: &[String]) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(titles.to_vec());
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load_visited(&self) -> Result<Option<Vec<String>>, CheckpointError> {
        Ok(read(&self.visited))
    }

    async fn load_frontier(&self) -> Result<Option<Vec<String>>, CheckpointError> {
        Ok(read(&self.frontier))
    }

    async fn store_visited(&self, visited: &[String]) -> Result<(), CheckpointError> {
        self.check_available()?;
        write(&self.visited, visited);
        self.visited_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn store_frontier(&self, frontier: &[String]) -> Result<(), CheckpointError> {
        self.check_available()?;
        write(&self.frontier, frontier);
        Ok(())
    }
}
