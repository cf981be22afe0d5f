//! Spec fetcher: scrapes the swagger download from the documentation site.

use crate::config::{BrowserConfig, TargetConfig};
use crate::domain::SpecDocument;
use crate::error::PipelineResult;
use crate::services::browser::{BrowserDriver, BrowserSession, Download};
use crate::services::temp;
use std::path::PathBuf;

/// Drives a stealth browser to the docs page and saves the downloaded spec
pub struct SpecFetcher<'a> {
    browser: &'a dyn BrowserDriver,
    target: &'a TargetConfig,
    settings: &'a BrowserConfig,
}

impl<'a> SpecFetcher<'a> {
    pub fn new(
        browser: &'a dyn BrowserDriver,
        target: &'a TargetConfig,
        settings: &'a BrowserConfig,
    ) -> Self {
        Self {
            browser,
            target,
            settings,
        }
    }

    /// Download the spec into a fresh temporary file
    ///
    /// The download is saved before the browser closes, since closing discards
    /// the browser's own copy. The browser is closed whether or not the
    /// download succeeded.
    pub async fn fetch(&self) -> PipelineResult<SpecDocument> {
        self.browser.ensure_installed().await?;

        let mut session = self.browser.launch_stealth().await?;
        let saved = self.download(session.as_mut()).await;
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        let (path, download) = saved?;

        let document = SpecDocument::read(&path).await?;
        tracing::info!(
            path = %document.path.display(),
            bytes = document.len(),
            suggested = %download.suggested_filename,
            "Downloaded spec"
        );
        Ok(document)
    }

    async fn download(
        &self,
        session: &mut dyn BrowserSession,
    ) -> PipelineResult<(PathBuf, Download)> {
        tracing::info!(url = %self.target.docs_url, "Navigating to documentation");
        session
            .navigate(&self.target.docs_url, self.settings.navigation_timeout())
            .await?;

        session.click(&self.target.download_selector).await?;

        let download = session
            .await_download(self.settings.download_timeout())
            .await?;

        let path = temp::temp_file_path("json")?;
        tokio::fs::copy(&download.path, &path).await?;
        Ok((path, download))
    }
}
