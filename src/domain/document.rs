//! Spec document entity.

use std::path::{Path, PathBuf};

/// An OpenAPI document held in a temporary file
///
/// Each transform writes a new file; the previous one is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocument {
    /// Where the document lives on disk
    pub path: PathBuf,
    /// Text content; invalid UTF-8 sequences are replaced
    pub content: String,
}

impl SpecDocument {
    /// Create a document from its location and content
    pub fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }

    /// Read a document from disk
    ///
    /// Never fails on encoding; parsers should read the raw bytes instead.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self::new(path.to_path_buf(), content))
    }

    /// Size of the content in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
