//! Unified error types for the runner.

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Subprocess execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Git operation errors
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Clone of {url} failed: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Push failed: {0}")]
    PushFailed(String),

    #[error("Git operation failed: {0}")]
    Operation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Headless browser errors
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation to {url} did not reach network idle within {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("Download was not triggered: {0}")]
    DownloadNotTriggered(String),

    #[error("Browser runtime installation failed: {0}")]
    InstallFailed(String),

    #[error("Failed to spawn browser driver: {0}")]
    SpawnFailed(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Driver error (code {code}): {message}")]
    Driver { code: i32, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures that end a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("Spec download was not triggered: {0}")]
    DownloadNotTriggered(String),

    #[error("Spec at {path} is not valid JSON: {source}")]
    FormatError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Clone failed: {0}")]
    CloneFailed(String),

    #[error("Client generation failed: {0}")]
    GenerationFailed(String),

    #[error("Dependency restore failed: {0}")]
    RestoreFailed(String),

    #[error("Required credential {0} is not set")]
    MissingCredential(String),

    #[error("Push failed: {0}")]
    PushFailed(String),

    #[error("Browser error: {0}")]
    Browser(BrowserError),

    #[error("Git error: {0}")]
    Git(GitError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run cancelled")]
    Cancelled,
}

impl From<BrowserError> for PipelineError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::NavigationTimeout { url, timeout_secs } => {
                Self::NavigationTimeout { url, timeout_secs }
            }
            BrowserError::DownloadNotTriggered(msg) => Self::DownloadNotTriggered(msg),
            other => Self::Browser(other),
        }
    }
}

impl From<GitError> for PipelineError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::CloneFailed { url, message } => {
                Self::CloneFailed(format!("{}: {}", url, message))
            }
            GitError::PushFailed(msg) => Self::PushFailed(msg),
            other => Self::Git(other),
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for pipeline stages
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Result type alias for Git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type alias for browser operations
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for subprocess operations
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_timeout_maps_to_navigation_timeout() {
        let err: PipelineError = BrowserError::NavigationTimeout {
            url: "https://docs.example".to_string(),
            timeout_secs: 60,
        }
        .into();
        assert!(matches!(
            err,
            PipelineError::NavigationTimeout { timeout_secs: 60, .. }
        ));
    }

    #[test]
    fn test_git_errors_map_to_taxonomy() {
        let clone: PipelineError = GitError::CloneFailed {
            url: "https://github.com/acme/lib".to_string(),
            message: "not found".to_string(),
        }
        .into();
        assert!(matches!(clone, PipelineError::CloneFailed(ref m) if m.contains("acme/lib")));

        let push: PipelineError = GitError::PushFailed("rejected".to_string()).into();
        assert!(matches!(push, PipelineError::PushFailed(_)));

        let other: PipelineError = GitError::Operation("boom".to_string()).into();
        assert!(matches!(other, PipelineError::Git(_)));
    }
}
