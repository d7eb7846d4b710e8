use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SelectorRules {
    pub row: String,
    pub name: String,
    pub desc: String,
}

/// One external page to scrape and the selectors that pull rows out of it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub url: String,
    pub selector: SelectorRules,
}

/// Category name -> descriptors, in configured order.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct SourceConfig(BTreeMap<String, Vec<SourceDescriptor>>);

impl SourceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PipelineError::configuration(path, format!("cannot read: {}", e)))?;
        serde_json::from_str(&raw).map_err(|e| PipelineError::configuration(path, e))
    }

    pub fn for_category(&self, category: &str) -> &[SourceDescriptor] {
        self.0.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
