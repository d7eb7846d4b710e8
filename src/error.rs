use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures raised by the pipeline stages.
///
/// `Transport` and `Extraction` are per-source and get logged where they
/// happen. `Persistence` and `Configuration` abort the running stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("invalid selector {selector:?}: {reason}")]
    Extraction { selector: String, reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bad configuration in {}: {reason}", .path.display())]
    Configuration { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn persistence(path: &Path, source: io::Error) -> Self {
        Self::Persistence {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn configuration(path: &Path, reason: impl ToString) -> Self {
        Self::Configuration {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Per-item failures are recovered from; everything else is fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Extraction { .. })
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_item_errors_are_recoverable() {
        let transport = PipelineError::Transport {
            url: "https://example.com".into(),
            reason: "timed out".into(),
        };
        assert!(transport.is_recoverable());

        let persistence =
            PipelineError::persistence(Path::new("data/items.json"), io::Error::other("disk full"));
        assert!(!persistence.is_recoverable());
        assert_eq!(
            persistence.to_string(),
            "failed to write data/items.json: disk full"
        );
    }
}
