//! The refresh pipeline.
//!
//! Stages run strictly in order, each handing its output to the next:
//! - SpecFetcher: scrape the swagger download
//! - SpecNormalizer: deterministic formatting
//! - RepositoryStager: clone, place spec, clean `src`
//! - ClientGenerator: run kiota
//! - BuildPublisher: restore, build, commit and push
//!
//! Any error aborts the run. A failed build ends it without publishing.

pub mod clean;
pub mod fetch;
pub mod generate;
pub mod normalize;
pub mod publish;
pub mod stage;

pub use clean::{clean_source_dir, clean_with};
pub use fetch::SpecFetcher;
pub use generate::ClientGenerator;
pub use normalize::{format_json, SpecNormalizer};
pub use publish::BuildPublisher;
pub use stage::RepositoryStager;

use crate::config::RunnerConfig;
use crate::domain::{Credential, RunOutcome};
use crate::error::{PipelineError, PipelineResult};
use crate::services::{
    BrowserDriver, CommandRunner, DotnetToolchain, GitClient, GitService, PlaywrightDriver,
    ProcessService,
};
use std::future::Future;
use std::sync::Arc;

/// External capabilities the pipeline drives
#[derive(Clone)]
pub struct Capabilities {
    pub browser: Arc<dyn BrowserDriver>,
    pub git: Arc<dyn GitClient>,
    pub runner: Arc<dyn CommandRunner>,
}

impl Capabilities {
    /// Real browser, git CLI and child processes
    pub fn system(config: &RunnerConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessService::new());
        Self {
            browser: Arc::new(PlaywrightDriver::new(
                config.browser.resolve_driver_dir(),
                runner.clone(),
            )),
            git: Arc::new(GitService::new()),
            runner,
        }
    }
}

/// One end-to-end refresh run
pub struct Pipeline {
    config: RunnerConfig,
    capabilities: Capabilities,
    dotnet: DotnetToolchain,
    /// Push credential; only checked once the build has passed
    credential: Option<Credential>,
}

impl Pipeline {
    pub fn new(
        config: RunnerConfig,
        capabilities: Capabilities,
        credential: Option<Credential>,
    ) -> Self {
        let dotnet = DotnetToolchain::new(capabilities.runner.clone());
        Self {
            config,
            capabilities,
            dotnet,
            credential,
        }
    }

    /// Wire real capabilities and read the credential from the configured variable
    pub fn from_environment(config: RunnerConfig) -> Self {
        let capabilities = Capabilities::system(&config);
        let credential = Credential::from_env(&config.publish.token_variable);
        Self::new(config, capabilities, credential)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every stage to completion
    pub async fn run(&self) -> PipelineResult<RunOutcome> {
        let config = &self.config;

        let raw = SpecFetcher::new(
            self.capabilities.browser.as_ref(),
            &config.target,
            &config.browser,
        )
        .fetch()
        .await?;

        let normalized = SpecNormalizer::new().normalize(&raw.path).await?;

        let repo = RepositoryStager::new(self.capabilities.git.as_ref(), &config.target)
            .stage(&normalized)
            .await?;

        ClientGenerator::new(
            self.capabilities.runner.as_ref(),
            &self.dotnet,
            &config.generator,
            &config.target,
        )
        .generate(&repo)
        .await?;

        let outcome = BuildPublisher::new(
            &self.dotnet,
            self.capabilities.git.as_ref(),
            &config.build,
            &config.publish,
        )
        .build_and_publish(&repo, self.credential.as_ref())
        .await?;

        tracing::info!(repo = %repo.root.display(), %outcome, "Run finished");
        Ok(outcome)
    }

    /// Run until finished or until `shutdown` resolves, whichever is first
    ///
    /// On shutdown the run is dropped at its current await point; temporary
    /// files and clones are left behind.
    pub async fn run_until<F>(&self, shutdown: F) -> PipelineResult<RunOutcome>
    where
        F: Future,
    {
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                tracing::warn!("Run cancelled");
                Err(PipelineError::Cancelled)
            }
        }
    }
}
