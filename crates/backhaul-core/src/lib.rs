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

//! Transport-agnostic backup models shared across the Backhaul workspace.
//!
//! Layout: `model.rs` (instructions and retention policy), `naming.rs`
//! (dated filenames and purge patterns), `clock.rs` (time source).

pub mod clock;
pub mod model;
pub mod naming;

pub use clock::{Clock, FixedClock, SystemClock};
pub use model::{EOF_SENTINEL, Instruction, RetentionPolicy};
pub use naming::{
    DATE_STAMP_FORMAT, WILDCARD_MARKER, dated_filename, purge_pattern_prefix, staged_base_name,
};
