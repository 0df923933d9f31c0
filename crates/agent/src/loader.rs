//! Plain-text document loader.

use async_trait::async_trait;
use formagent_core::error::{Error, Result};
use formagent_core::loader::{DocumentLoader, LoadedSource};
use std::path::Path;
use tracing::debug;

/// Extensions read as UTF-8 text.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown", "csv", "json", "html", "htm"];

/// Prefix marking a source string as inline text rather than a path.
pub const INLINE_PREFIX: &str = "text:";

/// Loads text-based files from disk. Binary formats are rejected.
#[derive(Debug, Clone, Default)]
pub struct TextFileLoader;

impl TextFileLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for TextFileLoader {
    async fn load(&self, source: &str) -> Result<LoadedSource> {
        let path = Path::new(source);

        if !path.exists() {
            if let Some(text) = source.strip_prefix(INLINE_PREFIX) {
                return Ok(LoadedSource::inline("inline", text.trim_start()));
            }
            return Err(Error::SourceNotFound(source.to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::UnsupportedFormat {
                source_name: source.to_string(),
                format: if extension.is_empty() {
                    "none".into()
                } else {
                    extension
                },
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::SourceNotFound(source.to_string()),
            _ => Error::UnsupportedFormat {
                source_name: source.to_string(),
                format: format!("unreadable ({e})"),
            },
        })?;
        let raw_text = String::from_utf8_lossy(&bytes).into_owned();

        debug!(source, file_type = %extension, chars = raw_text.len(), "Loaded document");

        Ok(LoadedSource {
            source: source.to_string(),
            file_type: extension,
            raw_text,
        })
    }
}
