//! Client generator: runs kiota against the staged spec.

use crate::config::{GeneratorConfig, TargetConfig, SOURCE_DIR_NAME};
use crate::domain::WorkingRepository;
use crate::error::{PipelineError, PipelineResult};
use crate::services::dotnet::DotnetToolchain;
use crate::services::process::CommandRunner;

const KIOTA: &str = "kiota";

/// Regenerates the client sources under `src`
pub struct ClientGenerator<'a> {
    runner: &'a dyn CommandRunner,
    dotnet: &'a DotnetToolchain,
    settings: &'a GeneratorConfig,
    target: &'a TargetConfig,
}

impl<'a> ClientGenerator<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        dotnet: &'a DotnetToolchain,
        settings: &'a GeneratorConfig,
        target: &'a TargetConfig,
    ) -> Self {
        Self {
            runner,
            dotnet,
            settings,
            target,
        }
    }

    /// Update the generator tool, then generate into `src`
    pub async fn generate(&self, repo: &WorkingRepository) -> PipelineResult<()> {
        let updated = self
            .dotnet
            .update_global_tool(&self.settings.tool_package)
            .await
            .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;
        if !updated {
            return Err(PipelineError::GenerationFailed(format!(
                "could not install or update {}",
                self.settings.tool_package
            )));
        }

        let outcome = self
            .runner
            .execute(KIOTA, Some(&repo.root), &self.generate_args(repo))
            .await
            .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;

        if !outcome.success() {
            return Err(PipelineError::GenerationFailed(format!(
                "kiota exited with {}: {}",
                outcome.exit_code,
                outcome.tail(10)
            )));
        }

        tracing::info!(output = %repo.source_dir.display(), "Generated client");
        Ok(())
    }

    /// Arguments for `kiota generate`
    pub fn generate_args(&self, repo: &WorkingRepository) -> Vec<String> {
        let mut args = vec![
            "generate".to_string(),
            "-l".to_string(),
            self.settings.language.clone(),
            "-d".to_string(),
            repo.spec_path.display().to_string(),
            "-o".to_string(),
            SOURCE_DIR_NAME.to_string(),
            "-c".to_string(),
            self.settings.client_class.clone(),
            "-n".to_string(),
            self.target.library.clone(),
        ];
        if self.settings.exception_based_errors {
            args.push("--ebc".to_string());
        }
        if self.settings.backing_store {
            args.push("--cc".to_string());
        }
        args
    }
}
