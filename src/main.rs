//! trustedform-openapi-runner: one refresh of the generated client per invocation.

use anyhow::Result;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trustedform_openapi_runner::{AppError, Pipeline, RunnerConfig};

/// Initialize logging with RUST_LOG environment variable support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();

    let config = RunnerConfig::load().map_err(AppError::from)?;
    tracing::info!(library = %config.target.library, "Starting refresh");

    let pipeline = Pipeline::from_environment(config);

    // Ctrl+C drops the run at its next await point
    match pipeline.run_until(tokio::signal::ctrl_c()).await {
        Ok(outcome) if outcome.is_success() => Ok(ExitCode::SUCCESS),
        Ok(_) => Ok(ExitCode::FAILURE),
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!("Refresh failed: {}", err);
            Err(err.into())
        }
    }
}
