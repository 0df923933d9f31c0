//! Document loading seam.
//!
//! Turning files into text is a collaborator concern; the agent only needs
//! the decoded text and where it came from.

use crate::error::Result;
use async_trait::async_trait;

/// Raw text produced by a [`DocumentLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    /// The source identifier (path or caller-supplied label).
    pub source: String,
    /// Detected file type, e.g. `"txt"` or `"csv"`.
    pub file_type: String,
    /// Decoded text content.
    pub raw_text: String,
}

impl LoadedSource {
    /// Wrap text that is already decoded.
    pub fn inline(source: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            file_type: "text".into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Supplies raw text for a source identifier.
///
/// Fails with `SourceNotFound` or `UnsupportedFormat`; the orchestrator
/// surfaces both unchanged.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<LoadedSource>;
}
