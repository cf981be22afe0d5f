//! Spec normalizer: deterministic pretty-printing of the raw document.

use crate::domain::SpecDocument;
use crate::error::{PipelineError, PipelineResult};
use crate::services::temp;
use serde_json::Value;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reformat JSON text as indented JSON, keeping member order and number text
///
/// Applying it to its own output yields the same text.
pub fn format_json(content: impl AsRef<[u8]>) -> serde_json::Result<String> {
    let content = content.as_ref();
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let value: Value = serde_json::from_slice(content)?;
    serde_json::to_string_pretty(&value)
}

/// Writes a formatted copy of the raw spec; the input file is never modified
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecNormalizer;

impl SpecNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Format the document at `raw` into a new temporary file
    pub async fn normalize(&self, raw: &Path) -> PipelineResult<SpecDocument> {
        let bytes = tokio::fs::read(raw).await?;

        let formatted = format_json(&bytes).map_err(|source| PipelineError::FormatError {
            path: raw.to_path_buf(),
            source,
        })?;

        let path = temp::temp_file_path("json")?;
        tokio::fs::write(&path, &formatted).await?;

        tracing::info!(path = %path.display(), "Normalized spec");
        Ok(SpecDocument::new(path, formatted))
    }
}
