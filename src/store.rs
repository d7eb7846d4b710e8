use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Category;
use crate::error::{PipelineError, Result};
use crate::utils::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ContentEntity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// One JSON array per category under `data_dir`.
pub struct ContentStore {
    data_dir: PathBuf,
}

impl ContentStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, category: &Category) -> PathBuf {
        self.data_dir.join(format!("{}.json", category))
    }

    /// Replace the category's document with `entities`.
    pub fn write(&self, category: &Category, entities: &[ContentEntity]) -> Result<()> {
        let path = self.path(category);
        // serde_json's pretty printer indents with two spaces.
        let mut json = serde_json::to_vec_pretty(entities)
            .map_err(|e| PipelineError::persistence(&path, io::Error::other(e)))?;
        json.push(b'\n');
        write_atomic(&path, &json)?;
        debug!("Wrote {} entities to {}", entities.len(), path.display());
        Ok(())
    }

    /// Persisted entities for `category`; empty when nothing was scraped yet.
    pub fn read(&self, category: &Category) -> Result<Vec<ContentEntity>> {
        let path = self.path(category);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PipelineError::configuration(&path, e)),
        };
        serde_json::from_str(&raw).map_err(|e| PipelineError::configuration(&path, e))
    }
}
