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

//! File-backed configuration for backup jobs.
//!
//! Layout: `properties.rs` (key/value file parsing), `validate.rs` (token
//! parsing and field validation), `model.rs` (typed job and retriever
//! settings), `loader.rs` (job and backup-list loading).

pub mod error;
pub mod loader;
pub mod model;
pub mod properties;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{collect_sources, load_backup_list, load_job};
pub use model::{JobConfig, RetrieverSettings, SecureCopySettings, TransportKind};
pub use properties::Properties;
