//! Working repository entity.

use crate::config::{SOURCE_DIR_NAME, SPEC_FILE_NAME};
use std::path::{Path, PathBuf};

/// A freshly cloned copy of the client repository, owned by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingRepository {
    /// Clone root
    pub root: PathBuf,
    /// Generated source directory (`<root>/src`)
    pub source_dir: PathBuf,
    /// Conventional spec location (`<root>/swagger.json`)
    pub spec_path: PathBuf,
    /// Project descriptor (`<root>/src/<Library>.csproj`)
    pub descriptor_path: PathBuf,
}

impl WorkingRepository {
    /// Describe the layout of a clone rooted at `root`
    pub fn new(root: PathBuf, descriptor_file_name: &str) -> Self {
        let source_dir = root.join(SOURCE_DIR_NAME);
        let spec_path = root.join(SPEC_FILE_NAME);
        let descriptor_path = source_dir.join(descriptor_file_name);

        Self {
            root,
            source_dir,
            spec_path,
            descriptor_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
