//! Infrastructure services for the runner.
//!
//! This module contains:
//! - CommandRunner / ProcessService: opaque subprocess execution
//! - GitClient / GitService: clone, commit and push
//! - BrowserDriver / PlaywrightDriver: headless browser automation
//! - DotnetToolchain: restore, build and tool updates
//! - temp: fresh temporary files and directories

pub mod browser;
pub mod dotnet;
pub mod git;
pub mod process;
pub mod temp;

pub use browser::{BrowserDriver, BrowserSession, Download, PlaywrightDriver};
pub use dotnet::DotnetToolchain;
pub use git::{GitClient, GitService};
pub use process::{CommandRunner, ProcessOutcome, ProcessService};
