// src/checkpoint/json_file.rs
// =============================================================================
// Checkpoints as two JSON files in a state directory:
//
//   <state-dir>/visited.json   ["Hydrogen", "Oxygen", ...]
//   <state-dir>/queue.json     ["Ozone", "Ice", ...]
//
// Files are written to a ".tmp" sibling first and then renamed over the old
// one, so a crash mid-write leaves the previous checkpoint intact.
// =============================================================================

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{CheckpointError, CheckpointStore};

const VISITED_FILE: &str = "visited.json";
const QUEUE_FILE: &str = "queue.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_list(&self, name: &str) -> Result<Option<Vec<String>>, CheckpointError> {
        let path = self.dir.join(name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(&path, source)),
        };

        let titles = serde_json::from_slice(&bytes).map_err(|source| CheckpointError::Format {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(titles))
    }

    async fn write_list(&self, name: &str, titles: &[String]) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;

        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));

        let bytes = serde_json::to_vec(titles).map_err(|source| CheckpointError::Format {
            path: path.display().to_string(),
            source,
        })?;

        fs::write(&tmp, bytes)
            .await
            .map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| io_error(&path, source))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CheckpointError {
    CheckpointError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl CheckpointStore for JsonFileStore {
    async fn load_visited(&self) -> Result<Option<Vec<String>>, CheckpointError> {
        self.read_list(VISITED_FILE).await
    }

    async fn load_frontier(&self) -> Result<Option<Vec<String>>, CheckpointError> {
        self.read_list(QUEUE_FILE).await
    }

    async fn store_visited(&self, visited: &[String]) -> Result<(), CheckpointError> {
        self.write_list(VISITED_FILE, visited).await
    }

    async fn store_frontier(&self, frontier: &[String]) -> Result<(), CheckpointError> {
        self.write_list(QUEUE_FILE, frontier).await
    }
}
