//! Stage and run outcomes.

use std::fmt;
use std::path::PathBuf;

/// Result of the release build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    pub succeeded: bool,
}

impl BuildOutcome {
    pub fn new(succeeded: bool) -> Self {
        Self { succeeded }
    }

    /// Whether publishing may proceed
    pub fn permits_publish(&self) -> bool {
        self.succeeded
    }
}

/// How a run that did not error ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Changes were committed and pushed
    Published,
    /// Regeneration produced no changes; nothing was pushed
    Unchanged,
    /// The build failed; publishing was skipped
    BuildFailed,
}

impl RunOutcome {
    /// Whether the process should exit successfully
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::BuildFailed)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::BuildFailed => write!(f, "build failed"),
        }
    }
}

/// Summary of one cleaning pass over the source directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Files removed
    pub files_deleted: usize,
    /// Empty directories removed
    pub directories_deleted: usize,
    /// Descriptor files left in place
    pub preserved: Vec<PathBuf>,
    /// Entries that could not be removed or enumerated
    pub failures: Vec<PathBuf>,
}

impl CleanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
