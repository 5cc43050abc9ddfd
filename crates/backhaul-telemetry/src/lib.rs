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

//! Logging primitives shared across the Backhaul workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (run span guard),
//! `error.rs` (telemetry errors).

pub mod context;
pub mod error;
pub mod init;

pub use context::RunContextGuard;
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogDestination, LogFormat, LoggingConfig, init_logging};
