//! Domain entities for the refresh pipeline.
//!
//! This module contains:
//! - SpecDocument: the OpenAPI document in a temp file
//! - WorkingRepository: the fresh clone being regenerated
//! - Outcomes: build result, run result, cleaning report
//! - Credential / CommitAuthor: publish identity

mod credential;
mod document;
mod outcome;
mod repository;

pub use credential::{CommitAuthor, Credential};
pub use document::SpecDocument;
pub use outcome::{BuildOutcome, CleanReport, RunOutcome};
pub use repository::WorkingRepository;
