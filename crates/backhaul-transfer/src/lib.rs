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

//! Remote file retrieval over external transport commands.
//!
//! Layout: `command.rs` (process execution and the stderr failure policy),
//! `retriever.rs` (`FileRetriever` trait and transport dispatch), `scp.rs`
//! (secure-copy retriever with guaranteed remote cleanup).

pub mod command;
pub mod error;
pub mod retriever;
pub mod scp;

pub use command::{CommandLine, CommandRunner, ExecutionResult, SystemCommandRunner};
pub use error::{ExecResult, ExecutionError, RetrievalError, RetrievalResult};
pub use retriever::{FileRetriever, build_retriever};
pub use scp::SecureCopyRetriever;
