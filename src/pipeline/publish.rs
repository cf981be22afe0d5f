//! Build publisher: restore, release build and the gated commit + push.

use crate::config::{BuildConfig, PublishConfig};
use crate::domain::{BuildOutcome, CommitAuthor, Credential, RunOutcome, WorkingRepository};
use crate::error::{PipelineError, PipelineResult};
use crate::services::dotnet::DotnetToolchain;
use crate::services::git::GitClient;

/// Builds the regenerated project and publishes it only when the build passes
pub struct BuildPublisher<'a> {
    dotnet: &'a DotnetToolchain,
    git: &'a dyn GitClient,
    build: &'a BuildConfig,
    publish: &'a PublishConfig,
}

impl<'a> BuildPublisher<'a> {
    pub fn new(
        dotnet: &'a DotnetToolchain,
        git: &'a dyn GitClient,
        build: &'a BuildConfig,
        publish: &'a PublishConfig,
    ) -> Self {
        Self {
            dotnet,
            git,
            build,
            publish,
        }
    }

    /// Restore then build the project descriptor
    pub async fn build(&self, repo: &WorkingRepository) -> PipelineResult<BuildOutcome> {
        self.dotnet.restore(&repo.descriptor_path).await?;
        let succeeded = self
            .dotnet
            .build(&repo.descriptor_path, &self.build.configuration)
            .await?;
        Ok(BuildOutcome::new(succeeded))
    }

    /// Commit and push; requires the credential
    pub async fn publish(
        &self,
        repo: &WorkingRepository,
        credential: Option<&Credential>,
    ) -> PipelineResult<RunOutcome> {
        let credential = credential
            .ok_or_else(|| PipelineError::MissingCredential(self.publish.token_variable.clone()))?;

        let author = CommitAuthor::new(&self.publish.author_name, &self.publish.author_email);
        let committed = self
            .git
            .commit(repo.root(), &self.publish.commit_message, &author)
            .await?;
        if !committed {
            tracing::info!("Generated client is unchanged, nothing to publish");
            return Ok(RunOutcome::Unchanged);
        }

        self.git.push(repo.root(), credential).await?;
        Ok(RunOutcome::Published)
    }

    /// Build, and publish only if the build succeeded
    pub async fn build_and_publish(
        &self,
        repo: &WorkingRepository,
        credential: Option<&Credential>,
    ) -> PipelineResult<RunOutcome> {
        let outcome = self.build(repo).await?;
        if !outcome.permits_publish() {
            tracing::error!("Build was not successful, exiting...");
            return Ok(RunOutcome::BuildFailed);
        }
        self.publish(repo, credential).await
    }
}
