#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    unreachable_pub,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

//! Backhaul application wiring.
//!
//! Layout: `bootstrap.rs` (logging, run span, and runner setup),
//! `orchestrator.rs` (per-job fetch then purge), `report.rs` (run outcomes).

/// Process-level setup for a run or a configuration check.
pub mod bootstrap;
/// Application error type.
pub mod error;
/// Sequential job orchestration.
pub mod orchestrator;
/// Outcomes of runs and checks.
pub mod report;

pub use bootstrap::{AppSettings, JobSources, check_app, run_app};
pub use error::{AppError, AppResult, error_chain};
pub use orchestrator::RunOrchestrator;
pub use report::{JobCheck, JobFailure, JobReport, JobStage, RunReport};
