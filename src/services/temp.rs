//! Fresh temporary locations for a run.
//!
//! Paths are uniquely named and persisted; nothing here deletes them.

use std::io;
use std::path::PathBuf;

const PREFIX: &str = "trustedform-openapi-";

/// Allocate a new, empty temporary file with the given extension
pub fn temp_file_path(extension: &str) -> io::Result<PathBuf> {
    let suffix = format!(".{}", extension);
    let file = tempfile::Builder::new()
        .prefix(PREFIX)
        .suffix(&suffix)
        .tempfile()?;
    file.into_temp_path()
        .keep()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Allocate a new, empty temporary directory
pub fn temp_dir() -> io::Result<PathBuf> {
    let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
    Ok(dir.keep())
}
