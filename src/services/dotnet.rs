//! dotnet toolchain wrapper: restore, build and global tool updates.

use crate::error::{PipelineError, PipelineResult};
use crate::services::process::{args, CommandRunner};
use std::path::Path;
use std::sync::Arc;

const DOTNET: &str = "dotnet";

/// Thin layer over the `dotnet` CLI
#[derive(Clone)]
pub struct DotnetToolchain {
    runner: Arc<dyn CommandRunner>,
}

impl DotnetToolchain {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Restore the project's dependencies; any failure is fatal
    pub async fn restore(&self, project: &Path) -> PipelineResult<()> {
        let outcome = self
            .runner
            .execute(
                DOTNET,
                project.parent(),
                &args(["restore".to_string(), project.display().to_string()]),
            )
            .await
            .map_err(|e| PipelineError::RestoreFailed(e.to_string()))?;

        if !outcome.success() {
            return Err(PipelineError::RestoreFailed(format!(
                "dotnet restore exited with {}: {}",
                outcome.exit_code,
                outcome.tail(10)
            )));
        }
        Ok(())
    }

    /// Build the project without restoring; returns whether the build succeeded
    pub async fn build(&self, project: &Path, configuration: &str) -> PipelineResult<bool> {
        let outcome = self
            .runner
            .execute(
                DOTNET,
                project.parent(),
                &args([
                    "build".to_string(),
                    project.display().to_string(),
                    "--configuration".to_string(),
                    configuration.to_string(),
                    "--no-restore".to_string(),
                ]),
            )
            .await?;

        if !outcome.success() {
            tracing::error!(
                exit_code = outcome.exit_code,
                "Build output:\n{}",
                outcome.tail(20)
            );
        }
        Ok(outcome.success())
    }

    /// Install or update a global dotnet tool
    pub async fn update_global_tool(&self, package: &str) -> PipelineResult<bool> {
        let outcome = self
            .runner
            .execute(DOTNET, None, &args(["tool", "update", "--global", package]))
            .await?;
        Ok(outcome.success())
    }
}
