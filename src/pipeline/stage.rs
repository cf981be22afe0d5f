//! Repository stager: fresh clone, spec placement and source cleaning.

use crate::config::{TargetConfig, DESCRIPTOR_EXTENSION};
use crate::domain::{SpecDocument, WorkingRepository};
use crate::error::PipelineResult;
use crate::pipeline::clean::clean_source_dir;
use crate::services::git::GitClient;
use crate::services::temp;
use std::io;
use std::path::Path;

/// Prepares a clean working copy of the client repository
pub struct RepositoryStager<'a> {
    git: &'a dyn GitClient,
    target: &'a TargetConfig,
}

impl<'a> RepositoryStager<'a> {
    pub fn new(git: &'a dyn GitClient, target: &'a TargetConfig) -> Self {
        Self { git, target }
    }

    /// Clone into a new temp directory, move the spec in and clean `src`
    pub async fn stage(&self, normalized: &SpecDocument) -> PipelineResult<WorkingRepository> {
        let root = temp::temp_dir()?;
        self.git
            .clone_repo(&self.target.repository_url(), &root)
            .await?;

        let repo = WorkingRepository::new(root, &self.target.descriptor_file_name());

        remove_if_exists(&repo.spec_path).await?;
        move_file(&normalized.path, &repo.spec_path).await?;
        tracing::info!(path = %repo.spec_path.display(), "Staged spec");

        let source_dir = repo.source_dir.clone();
        let report = tokio::task::spawn_blocking(move || {
            clean_source_dir(&source_dir, DESCRIPTOR_EXTENSION)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        if report.is_clean() {
            tracing::info!(
                files = report.files_deleted,
                directories = report.directories_deleted,
                "Cleaned source directory"
            );
        } else {
            tracing::warn!(
                files = report.files_deleted,
                directories = report.directories_deleted,
                failures = report.failures.len(),
                "Cleaned source directory with failures"
            );
        }

        Ok(repo)
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Rename, falling back to copy + delete across filesystems
async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_if_exists_tolerates_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("swagger.json");
        remove_if_exists(&path).await.unwrap();

        std::fs::write(&path, "{}").unwrap();
        remove_if_exists(&path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_move_file_replaces_source() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.json");
        let to = temp.path().join("nested/b.json");
        std::fs::create_dir_all(to.parent().unwrap()).unwrap();
        std::fs::write(&from, "content").unwrap();

        move_file(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "content");
    }
}
