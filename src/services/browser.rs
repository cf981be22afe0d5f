//! Headless browser capability for scraping the spec download.
//!
//! `PlaywrightDriver` runs an embedded Node sidecar (Playwright with the
//! stealth plugin) and talks JSON-RPC 2.0 to it over stdio.

use crate::error::{BrowserError, BrowserResult};
use crate::services::process::{args, CommandRunner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// JSON-RPC 2.0 version string
const JSONRPC_VERSION: &str = "2.0";

/// Sidecar script, written into the driver directory on install
const DRIVER_SCRIPT: &str = include_str!("../../assets/playwright-driver.mjs");
const DRIVER_SCRIPT_NAME: &str = "playwright-driver.mjs";

/// npm packages the sidecar imports
const DRIVER_PACKAGES: [&str; 3] = ["playwright", "playwright-extra", "puppeteer-extra-plugin-stealth"];

/// Slack added on top of in-page timeouts before the client gives up on the sidecar
const RESPONSE_GRACE: Duration = Duration::from_secs(10);

/// Upper bound for requests without their own timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A finished download, saved by the browser to a path it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name the site suggested
    pub suggested_filename: String,
    /// Location of the downloaded bytes
    pub path: PathBuf,
}

/// Capability to install and launch a browser
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Make sure the automation runtime is available; safe to call repeatedly
    async fn ensure_installed(&self) -> BrowserResult<()>;

    /// Start a browser with fingerprinting countermeasures and open a page
    async fn launch_stealth(&self) -> BrowserResult<Box<dyn BrowserSession>>;
}

/// One browser process with a single page
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and wait for network idle, failing after `idle_timeout`
    async fn navigate(&mut self, url: &str, idle_timeout: Duration) -> BrowserResult<()>;

    /// Click the element matching `selector`
    async fn click(&mut self, selector: &str) -> BrowserResult<()>;

    /// Wait for the next download to start and finish
    async fn await_download(&mut self, timeout: Duration) -> BrowserResult<Download>;

    /// Shut the browser down
    async fn close(self: Box<Self>) -> BrowserResult<()>;
}

/// JSON-RPC Request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Get the result or error
    pub fn into_result(self) -> BrowserResult<Value> {
        match self.error {
            Some(error) => Err(BrowserError::Driver {
                code: error.code,
                message: error.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// JSON-RPC Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Error codes the sidecar emits
pub mod error_codes {
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const TIMEOUT: i32 = -32001;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadResult {
    path: PathBuf,
    suggested_filename: String,
}

/// Playwright sidecar driver
pub struct PlaywrightDriver {
    /// Directory holding the sidecar script and its node_modules
    driver_dir: PathBuf,
    /// Runs npm/npx during installation
    runner: Arc<dyn CommandRunner>,
}

impl PlaywrightDriver {
    pub fn new(driver_dir: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self { driver_dir, runner }
    }

    fn script_path(&self) -> PathBuf {
        self.driver_dir.join(DRIVER_SCRIPT_NAME)
    }

    async fn run_install_step(&self, program: &str, step_args: Vec<String>) -> BrowserResult<()> {
        let outcome = self
            .runner
            .execute(program, Some(&self.driver_dir), &step_args)
            .await
            .map_err(|e| BrowserError::InstallFailed(e.to_string()))?;

        if !outcome.success() {
            return Err(BrowserError::InstallFailed(format!(
                "{} {} exited with {}: {}",
                program,
                step_args.join(" "),
                outcome.exit_code,
                outcome.tail(5)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightDriver {
    async fn ensure_installed(&self) -> BrowserResult<()> {
        tokio::fs::create_dir_all(&self.driver_dir).await?;
        tokio::fs::write(self.script_path(), DRIVER_SCRIPT).await?;

        let manifest = self.driver_dir.join("package.json");
        if !manifest.exists() {
            let package = serde_json::json!({
                "name": "trustedform-openapi-runner-driver",
                "private": true,
                "type": "module"
            });
            tokio::fs::write(&manifest, serde_json::to_string_pretty(&package)?).await?;
        }

        let mut npm_args = args(["install", "--no-audit", "--no-fund"]);
        npm_args.extend(args(DRIVER_PACKAGES));
        self.run_install_step("npm", npm_args).await?;
        self.run_install_step("npx", args(["playwright", "install", "chromium"]))
            .await?;

        tracing::info!(dir = %self.driver_dir.display(), "Browser runtime ready");
        Ok(())
    }

    async fn launch_stealth(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        let mut session = PlaywrightSession::spawn(&self.script_path(), &self.driver_dir)?;
        session
            .request("launch", None, DEFAULT_REQUEST_TIMEOUT)
            .await?;
        tracing::info!("Launched stealth browser");
        Ok(Box::new(session))
    }
}

/// Connection to a running sidecar
pub struct PlaywrightSession {
    /// Child process, killed on drop
    process: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl PlaywrightSession {
    fn spawn(script: &Path, driver_dir: &Path) -> BrowserResult<Self> {
        let mut child = Command::new("node")
            .arg(script)
            .current_dir(driver_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::SpawnFailed(e.to_string()))?;

        let stdin = child.stdin.take().ok_or(BrowserError::NotConnected)?;
        let stdout = child.stdout.take().ok_or(BrowserError::NotConnected)?;

        // Forward sidecar diagnostics into the log
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "browser_driver", "{}", line);
                }
            });
        }

        Ok(Self {
            process: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
        })
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Send a request and wait up to `deadline` for its response
    async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
        deadline: Duration,
    ) -> BrowserResult<Value> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);
        let id = request.id;

        let msg = serde_json::to_string(&request)?;
        self.stdin.write_all(msg.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let response = tokio::time::timeout(deadline, self.read_response(id))
            .await
            .map_err(|_| BrowserError::Driver {
                code: error_codes::TIMEOUT,
                message: format!("{} got no response within {}s", method, deadline.as_secs()),
            })??;

        response.into_result()
    }

    /// Read stdout until the response for `id` arrives
    async fn read_response(&mut self, id: u64) -> BrowserResult<JsonRpcResponse> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| BrowserError::Protocol("driver closed stdout".to_string()))?;

            match serde_json::from_str::<JsonRpcResponse>(&line) {
                Ok(response) if response.id == Some(id) => return Ok(response),
                Ok(other) => tracing::debug!(id = ?other.id, "Ignoring unrelated driver message"),
                Err(_) => tracing::debug!(target: "browser_driver", "{}", line),
            }
        }
    }
}

/// Map a sidecar timeout to the operation-specific error
fn on_timeout(err: BrowserError, mapped: impl FnOnce(String) -> BrowserError) -> BrowserError {
    match err {
        BrowserError::Driver { code, message } if code == error_codes::TIMEOUT => mapped(message),
        other => other,
    }
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn navigate(&mut self, url: &str, idle_timeout: Duration) -> BrowserResult<()> {
        let params = serde_json::json!({
            "url": url,
            "timeoutMs": idle_timeout.as_millis() as u64,
        });
        self.request("navigate", Some(params), idle_timeout + RESPONSE_GRACE)
            .await
            .map_err(|e| {
                on_timeout(e, |_| BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_secs: idle_timeout.as_secs(),
                })
            })?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        let params = serde_json::json!({ "selector": selector });
        self.request("click", Some(params), DEFAULT_REQUEST_TIMEOUT)
            .await
            .map_err(|e| match e {
                BrowserError::Driver { message, .. } => {
                    BrowserError::DownloadNotTriggered(format!("click on {}: {}", selector, message))
                }
                other => other,
            })?;
        Ok(())
    }

    async fn await_download(&mut self, timeout: Duration) -> BrowserResult<Download> {
        let params = serde_json::json!({ "timeoutMs": timeout.as_millis() as u64 });
        let value = self
            .request("awaitDownload", Some(params), timeout + RESPONSE_GRACE)
            .await
            .map_err(|e| on_timeout(e, BrowserError::DownloadNotTriggered))?;

        let result: DownloadResult = serde_json::from_value(value)?;
        Ok(Download {
            suggested_filename: result.suggested_filename,
            path: result.path,
        })
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        let mut session = self;
        let closed = session
            .request("close", None, DEFAULT_REQUEST_TIMEOUT)
            .await;
        let _ = session.process.wait().await;
        closed.map(|_| ())
    }
}
