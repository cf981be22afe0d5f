//! Configuration management for the runner.
//!
//! Supports layered configuration: embedded defaults → user → env

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the normalized spec at the repository root
pub const SPEC_FILE_NAME: &str = "swagger.json";

/// Subdirectory holding the generated sources and the project descriptor
pub const SOURCE_DIR_NAME: &str = "src";

/// Extension of the build-system project file that survives cleaning
pub const DESCRIPTOR_EXTENSION: &str = "csproj";

/// Environment variable naming an explicit config file to use instead of the user file
pub const CONFIG_FILE_VAR: &str = "RUNNER_CONFIG_FILE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl RunnerConfig {
    /// Load configuration with hierarchy: defaults → user → env
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_FILE_VAR).map(PathBuf::from);
        Self::load_from(explicit.as_deref())
    }

    /// Load configuration, reading `explicit` in place of the user file
    ///
    /// An explicit file must exist; the user file is optional.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Explicit file, or user config (~/.config/trustedform-openapi-runner/config.toml)
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path).required(true));
        } else if let Some(dirs) = project_dirs() {
            let user_config = dirs.config_dir().join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 3. Environment variables (RUNNER_*)
        builder = builder.add_source(
            Environment::with_prefix("RUNNER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.library.trim().is_empty() {
            return Err(ConfigError::Invalid("target.library is empty".to_string()));
        }
        if self.target.docs_url.trim().is_empty() {
            return Err(ConfigError::Invalid("target.docs_url is empty".to_string()));
        }
        if self.publish.token_variable.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "publish.token_variable is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform directories for user config and the browser driver cache
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "soenneker", "trustedform-openapi-runner")
}

/// What is being refreshed and where it comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Documentation page that offers the swagger download
    #[serde(default = "default_docs_url")]
    pub docs_url: String,
    /// Selector of the in-page download link
    #[serde(default = "default_download_selector")]
    pub download_selector: String,
    /// Library (and root namespace) name of the generated client
    #[serde(default = "default_library")]
    pub library: String,
    /// GitHub account owning the client repository
    #[serde(default = "default_repository_owner")]
    pub repository_owner: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            docs_url: default_docs_url(),
            download_selector: default_download_selector(),
            library: default_library(),
            repository_owner: default_repository_owner(),
        }
    }
}

impl TargetConfig {
    /// Clone URL of the client repository, named after the lower-cased library
    pub fn repository_url(&self) -> String {
        format!(
            "https://github.com/{}/{}",
            self.repository_owner,
            self.library.to_lowercase()
        )
    }

    /// Project descriptor file name, e.g. `Foo.Bar.csproj`
    pub fn descriptor_file_name(&self) -> String {
        format!("{}.{}", self.library, DESCRIPTOR_EXTENSION)
    }
}

fn default_docs_url() -> String {
    "https://activeprospect.redoc.ly/docs/trustedform/api/v4.0/overview/".to_string()
}

fn default_download_selector() -> String {
    "a[download='swagger.json']".to_string()
}

fn default_library() -> String {
    "Soenneker.TrustedForm.Certificates.OpenApiClient".to_string()
}

fn default_repository_owner() -> String {
    "soenneker".to_string()
}

/// Code generator invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Target language passed to the generator
    #[serde(default = "default_language")]
    pub language: String,
    /// Generated client class name
    #[serde(default = "default_client_class")]
    pub client_class: String,
    /// dotnet tool package providing the generator
    #[serde(default = "default_tool_package")]
    pub tool_package: String,
    /// Generate exception-based error handling (`--ebc`)
    #[serde(default = "default_true")]
    pub exception_based_errors: bool,
    /// Generate backing store / change tracking (`--cc`)
    #[serde(default = "default_true")]
    pub backing_store: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            client_class: default_client_class(),
            tool_package: default_tool_package(),
            exception_based_errors: true,
            backing_store: true,
        }
    }
}

fn default_language() -> String {
    "CSharp".to_string()
}

fn default_client_class() -> String {
    "TrustedFormCertificatesOpenApiClient".to_string()
}

fn default_tool_package() -> String {
    "Microsoft.OpenApi.Kiota".to_string()
}

fn default_true() -> bool {
    true
}

/// Build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build configuration name
    #[serde(default = "default_build_configuration")]
    pub configuration: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            configuration: default_build_configuration(),
        }
    }
}

fn default_build_configuration() -> String {
    "Release".to_string()
}

/// Commit metadata and credential lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
    /// Environment variable holding the push credential
    #[serde(default = "default_token_variable")]
    pub token_variable: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            token_variable: default_token_variable(),
        }
    }
}

fn default_commit_message() -> String {
    "Automated Update".to_string()
}

fn default_author_name() -> String {
    "Jake Soenneker".to_string()
}

fn default_author_email() -> String {
    "jake@soenneker.com".to_string()
}

fn default_token_variable() -> String {
    "GH__TOKEN".to_string()
}

/// Headless browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Upper bound for the page to reach network idle
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// How long to wait for the download after clicking
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Where the Playwright sidecar is installed (defaults to the cache dir)
    #[serde(default)]
    pub driver_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            driver_dir: None,
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Resolve the sidecar install directory
    pub fn resolve_driver_dir(&self) -> PathBuf {
        if let Some(dir) = &self.driver_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|d| d.cache_dir().join("browser-driver"))
            .unwrap_or_else(|| std::env::temp_dir().join("trustedform-openapi-runner-driver"))
    }
}

fn default_navigation_timeout_secs() -> u64 {
    60
}

fn default_download_timeout_secs() -> u64 {
    30
}
