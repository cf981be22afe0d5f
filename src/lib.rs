//! trustedform-openapi-runner: refreshes the generated TrustedForm client
//!
//! Scrapes the latest swagger document from the documentation site,
//! normalizes it, regenerates the client in a fresh clone of its repository,
//! builds it and pushes the result.

pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod services;

pub use config::RunnerConfig;
pub use error::{AppError, PipelineError, Result};
pub use pipeline::{Capabilities, Pipeline};
