//! End-to-end pipeline scenarios against fake capabilities.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use trustedform_openapi_runner::config::RunnerConfig;
use trustedform_openapi_runner::domain::{CommitAuthor, Credential, RunOutcome};
use trustedform_openapi_runner::error::{
    BrowserError, BrowserResult, GitResult, PipelineError, ProcessResult,
};
use trustedform_openapi_runner::pipeline::{format_json, Capabilities, Pipeline, SpecFetcher};
use trustedform_openapi_runner::services::{
    BrowserDriver, BrowserSession, CommandRunner, Download, GitClient, ProcessOutcome,
};

const LIBRARY: &str = "Acme.Widgets.OpenApiClient";
const RAW_SPEC: &str = r#"{"openapi":"3.0.1","info":{"title":"Widgets","version":"1"},"paths":{"/widgets":{"get":{}}}}"#;

/// Ordered record of every capability call
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn contains(&self, event: &str) -> bool {
        self.events().iter().any(|e| e == event)
    }
}

#[derive(Clone, Copy)]
enum Navigation {
    Idle,
    TimesOut,
    Hangs,
}

struct FakeBrowser {
    journal: Journal,
    navigation: Navigation,
    /// Downloaded content, `None` when the click starts no download
    payload: Option<String>,
    downloads: TempDir,
}

impl FakeBrowser {
    fn new(journal: Journal, navigation: Navigation, payload: Option<&str>) -> Self {
        Self {
            journal,
            navigation,
            payload: payload.map(str::to_string),
            downloads: TempDir::new().unwrap(),
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn ensure_installed(&self) -> BrowserResult<()> {
        self.journal.record("browser install");
        Ok(())
    }

    async fn launch_stealth(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        self.journal.record("browser launch");
        Ok(Box::new(FakeSession {
            journal: self.journal.clone(),
            navigation: self.navigation,
            payload: self.payload.clone(),
            download_path: self.downloads.path().join("download"),
        }))
    }
}

struct FakeSession {
    journal: Journal,
    navigation: Navigation,
    payload: Option<String>,
    download_path: PathBuf,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str, idle_timeout: Duration) -> BrowserResult<()> {
        self.journal.record("navigate");
        match self.navigation {
            Navigation::Idle => Ok(()),
            Navigation::TimesOut => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: idle_timeout.as_secs(),
            }),
            Navigation::Hangs => std::future::pending().await,
        }
    }

    async fn click(&mut self, _selector: &str) -> BrowserResult<()> {
        self.journal.record("click");
        Ok(())
    }

    async fn await_download(&mut self, _timeout: Duration) -> BrowserResult<Download> {
        self.journal.record("await download");
        let payload = self.payload.clone().ok_or_else(|| {
            BrowserError::DownloadNotTriggered("no download within 30000ms".to_string())
        })?;
        std::fs::write(&self.download_path, payload)?;
        Ok(Download {
            suggested_filename: "swagger.json".to_string(),
            path: self.download_path.clone(),
        })
    }

    /// Closing discards the browser's copy of any download, as Playwright does
    async fn close(self: Box<Self>) -> BrowserResult<()> {
        self.journal.record("browser close");
        if self.download_path.exists() {
            std::fs::remove_file(&self.download_path)?;
        }
        Ok(())
    }
}

struct FakeGit {
    journal: Journal,
    cloned: Mutex<Option<PathBuf>>,
}

impl FakeGit {
    fn new(journal: Journal) -> Self {
        Self {
            journal,
            cloned: Mutex::new(None),
        }
    }

    fn clone_dir(&self) -> Option<PathBuf> {
        self.cloned.lock().unwrap().clone()
    }
}

impl Drop for FakeGit {
    fn drop(&mut self) {
        if let Some(dir) = self.clone_dir() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

#[async_trait]
impl GitClient for FakeGit {
    async fn clone_repo(&self, url: &str, dir: &Path) -> GitResult<()> {
        self.journal.record(format!("clone {}", url));
        let src = dir.join("src");
        std::fs::create_dir_all(src.join("Models/Old"))?;
        std::fs::write(dir.join("swagger.json"), "{\"stale\":true}")?;
        std::fs::write(src.join(format!("{}.csproj", LIBRARY)), "<Project />")?;
        std::fs::write(src.join("Client.cs"), "// stale")?;
        std::fs::write(src.join("Models/Old/Widget.cs"), "// stale")?;
        *self.cloned.lock().unwrap() = Some(dir.to_path_buf());
        Ok(())
    }

    async fn commit(&self, _repo: &Path, message: &str, author: &CommitAuthor) -> GitResult<bool> {
        self.journal
            .record(format!("commit {} by {}", message, author.signature()));
        Ok(true)
    }

    async fn push(&self, _repo: &Path, credential: &Credential) -> GitResult<()> {
        self.journal.record(format!("push {}", credential.expose()));
        Ok(())
    }
}

struct FakeRunner {
    journal: Journal,
    tool_exit: i32,
    generate_exit: i32,
    restore_exit: i32,
    build_exit: i32,
}

impl FakeRunner {
    fn passing(journal: Journal) -> Self {
        Self {
            journal,
            tool_exit: 0,
            generate_exit: 0,
            restore_exit: 0,
            build_exit: 0,
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn execute(
        &self,
        program: &str,
        working_dir: Option<&Path>,
        args: &[String],
    ) -> ProcessResult<ProcessOutcome> {
        let verb = args.first().cloned().unwrap_or_default();
        self.journal.record(format!("{} {}", program, verb));

        let exit_code = match (program, verb.as_str()) {
            ("dotnet", "tool") => self.tool_exit,
            ("dotnet", "restore") => self.restore_exit,
            ("dotnet", "build") => self.build_exit,
            ("kiota", "generate") => {
                if self.generate_exit == 0 {
                    let src = working_dir.unwrap().join("src");
                    std::fs::create_dir_all(src.join("Widgets"))?;
                    std::fs::write(src.join("WidgetsClient.cs"), "// generated")?;
                    std::fs::write(src.join("Widgets/WidgetsRequestBuilder.cs"), "// generated")?;
                }
                self.generate_exit
            }
            _ => 0,
        };
        Ok(ProcessOutcome::with_code(exit_code))
    }
}

fn config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    config.target.library = LIBRARY.to_string();
    config.target.repository_owner = "acme".to_string();
    config
}

struct Harness {
    journal: Journal,
    git: Arc<FakeGit>,
    pipeline: Pipeline,
}

fn harness(
    navigation: Navigation,
    payload: Option<&str>,
    runner: impl FnOnce(Journal) -> FakeRunner,
    credential: Option<&str>,
) -> Harness {
    let journal = Journal::default();
    let git = Arc::new(FakeGit::new(journal.clone()));
    let capabilities = Capabilities {
        browser: Arc::new(FakeBrowser::new(journal.clone(), navigation, payload)),
        git: git.clone(),
        runner: Arc::new(runner(journal.clone())),
    };
    let pipeline = Pipeline::new(config(), capabilities, credential.map(Credential::new));
    Harness {
        journal,
        git,
        pipeline,
    }
}

#[tokio::test]
async fn test_successful_run_publishes_regenerated_client() {
    let h = harness(Navigation::Idle, Some(RAW_SPEC), FakeRunner::passing, Some("tok"));

    let outcome = h.pipeline.run().await.unwrap();
    assert_eq!(outcome, RunOutcome::Published);

    assert_eq!(
        h.journal.events(),
        vec![
            "browser install",
            "browser launch",
            "navigate",
            "click",
            "await download",
            "browser close",
            "clone https://github.com/acme/acme.widgets.openapiclient",
            "dotnet tool",
            "kiota generate",
            "dotnet restore",
            "dotnet build",
            "commit Automated Update by Jake Soenneker <jake@soenneker.com>",
            "push tok",
        ]
    );

    let root = h.git.clone_dir().unwrap();
    let src = root.join("src");
    assert!(src.join(format!("{}.csproj", LIBRARY)).exists());
    assert!(src.join("WidgetsClient.cs").exists());
    assert!(!src.join("Client.cs").exists());
    assert!(!src.join("Models").exists());
}

#[tokio::test]
async fn test_fetched_spec_outlives_the_browser_session() {
    let journal = Journal::default();
    let browser = FakeBrowser::new(journal.clone(), Navigation::Idle, Some(RAW_SPEC));
    let config = config();

    let document = SpecFetcher::new(&browser, &config.target, &config.browser)
        .fetch()
        .await
        .unwrap();

    assert!(journal.contains("browser close"));
    assert!(!browser.downloads.path().join("download").exists());
    assert_eq!(std::fs::read_to_string(&document.path).unwrap(), RAW_SPEC);
    assert_eq!(document.content, RAW_SPEC);
    std::fs::remove_file(document.path).unwrap();
}

#[tokio::test]
async fn test_staged_spec_matches_normalized_content() {
    let h = harness(Navigation::Idle, Some(RAW_SPEC), FakeRunner::passing, Some("tok"));
    h.pipeline.run().await.unwrap();

    let staged = std::fs::read_to_string(h.git.clone_dir().unwrap().join("swagger.json")).unwrap();
    assert_eq!(staged, format_json(RAW_SPEC).unwrap());
    assert_eq!(format_json(&staged).unwrap(), staged);
}

#[tokio::test]
async fn test_failed_build_never_publishes() {
    let h = harness(
        Navigation::Idle,
        Some(RAW_SPEC),
        |journal| FakeRunner {
            build_exit: 1,
            ..FakeRunner::passing(journal)
        },
        Some("tok"),
    );

    let outcome = h.pipeline.run().await.unwrap();
    assert_eq!(outcome, RunOutcome::BuildFailed);
    assert!(!outcome.is_success());
    assert!(h.journal.contains("dotnet build"));
    assert!(!h.journal.events().iter().any(|e| e.starts_with("commit")));
    assert!(!h.journal.events().iter().any(|e| e.starts_with("push")));
}

#[tokio::test]
async fn test_missing_credential_aborts_before_push() {
    let h = harness(Navigation::Idle, Some(RAW_SPEC), FakeRunner::passing, None);

    let err = h.pipeline.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingCredential(ref var) if var == "GH__TOKEN"));
    assert!(h.journal.contains("dotnet build"));
    assert!(!h.journal.events().iter().any(|e| e.starts_with("push")));
}

#[tokio::test]
async fn test_navigation_timeout_stops_the_run() {
    let h = harness(Navigation::TimesOut, Some(RAW_SPEC), FakeRunner::passing, Some("tok"));

    let err = h.pipeline.run().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::NavigationTimeout { timeout_secs: 60, .. }
    ));
    assert_eq!(
        h.journal.events(),
        vec!["browser install", "browser launch", "navigate", "browser close"]
    );
    assert!(h.git.clone_dir().is_none());
}

#[tokio::test]
async fn test_missing_download_is_reported() {
    let h = harness(Navigation::Idle, None, FakeRunner::passing, Some("tok"));

    let err = h.pipeline.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::DownloadNotTriggered(_)));
    assert!(h.journal.contains("browser close"));
    assert!(h.git.clone_dir().is_none());
}

#[tokio::test]
async fn test_malformed_spec_is_format_error() {
    let h = harness(
        Navigation::Idle,
        Some("<html>Access denied</html>"),
        FakeRunner::passing,
        Some("tok"),
    );

    let err = h.pipeline.run().await.unwrap_err();
    match err {
        PipelineError::FormatError { path, .. } => assert!(path.exists()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(h.git.clone_dir().is_none());
}

#[tokio::test]
async fn test_generator_failure_skips_build() {
    let h = harness(
        Navigation::Idle,
        Some(RAW_SPEC),
        |journal| FakeRunner {
            generate_exit: 1,
            ..FakeRunner::passing(journal)
        },
        Some("tok"),
    );

    let err = h.pipeline.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationFailed(_)));
    assert!(!h.journal.contains("dotnet restore"));
}

#[tokio::test]
async fn test_tool_update_failure_is_generation_failure() {
    let h = harness(
        Navigation::Idle,
        Some(RAW_SPEC),
        |journal| FakeRunner {
            tool_exit: 1,
            ..FakeRunner::passing(journal)
        },
        Some("tok"),
    );

    let err = h.pipeline.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationFailed(_)));
    assert!(!h.journal.contains("kiota generate"));
}

#[tokio::test]
async fn test_restore_failure_is_fatal() {
    let h = harness(
        Navigation::Idle,
        Some(RAW_SPEC),
        |journal| FakeRunner {
            restore_exit: 1,
            ..FakeRunner::passing(journal)
        },
        Some("tok"),
    );

    let err = h.pipeline.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::RestoreFailed(_)));
    assert!(!h.journal.contains("dotnet build"));
}

#[tokio::test]
async fn test_shutdown_cancels_the_run() {
    let h = harness(Navigation::Hangs, Some(RAW_SPEC), FakeRunner::passing, Some("tok"));

    let err = h
        .pipeline
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
    assert!(h.journal.contains("navigate"));
    assert!(h.git.clone_dir().is_none());
}
