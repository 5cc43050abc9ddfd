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

//! Local archive maintenance: age-based purging of dated backup copies.
//!
//! Layout: `purge.rs` (matching and deletion), `report.rs` (pass outcome).

pub mod error;
pub mod purge;
pub mod report;

pub use error::{FsOpsError, FsOpsResult};
pub use purge::{ArchivePurger, age_in_days};
pub use report::{PurgeReport, PurgeWarning};
