//! Source directory cleaning before regeneration.
//!
//! Deletes every file except project descriptors, then removes directories
//! left empty, deepest first. Individual failures are logged and skipped.

use crate::domain::CleanReport;
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Clean `dir`, keeping files with the `descriptor_extension`
pub fn clean_source_dir(dir: &Path, descriptor_extension: &str) -> CleanReport {
    clean_with(dir, descriptor_extension, |path| fs::remove_file(path))
}

/// Clean `dir` using `remove_file` for every file deletion
pub fn clean_with<F>(dir: &Path, descriptor_extension: &str, mut remove_file: F) -> CleanReport
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut report = CleanReport::default();

    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "Directory does not exist");
        return report;
    }

    let (files, mut dirs) = enumerate(dir, &mut report);

    for file in files {
        if is_descriptor(&file, descriptor_extension) {
            report.preserved.push(file);
            continue;
        }
        match remove_file(&file) {
            Ok(()) => {
                tracing::info!(path = %file.display(), "Deleted file");
                report.files_deleted += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %file.display(), "Failed to delete file: {}", e);
                report.failures.push(file);
            }
        }
    }

    // Deepest first, so a parent becomes empty once its children are gone
    dirs.sort_by(|(a_path, a_depth), (b_path, b_depth)| {
        b_depth
            .cmp(a_depth)
            .then_with(|| b_path.as_os_str().len().cmp(&a_path.as_os_str().len()))
    });

    for (path, _) in dirs {
        match remove_if_empty(&path) {
            Ok(true) => {
                tracing::info!(path = %path.display(), "Deleted empty directory");
                report.directories_deleted += 1;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to delete directory: {}", e);
                report.failures.push(path);
            }
        }
    }

    report
}

/// Collect files and (depth-tagged) subdirectories below `dir`
fn enumerate(dir: &Path, report: &mut CleanReport) -> (Vec<PathBuf>, Vec<(PathBuf, usize)>) {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(path = %dir.display(), "Failed to enumerate entry: {}", e);
                report.failures.push(dir.to_path_buf());
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            dirs.push((entry.path().to_path_buf(), entry.depth()));
        } else {
            files.push(entry.into_path());
        }
    }

    (files, dirs)
}

/// Name ends with `.<descriptor_extension>`, ignoring ASCII case
fn is_descriptor(path: &Path, descriptor_extension: &str) -> bool {
    let suffix = format!(".{}", descriptor_extension);
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();
    let (name, suffix) = (name.as_bytes(), suffix.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn remove_if_empty(path: &Path) -> io::Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    if fs::read_dir(path)?.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(path)?;
    Ok(true)
}
