//! Run-level span propagation.
//!
//! # Design
//! - One `run` span per process invocation, carrying a random run identifier.
//! - The guard owns the entered span, so every log line of the run is tagged until it drops.

use tracing::span::EnteredSpan;
use uuid::Uuid;

/// Guard that keeps the run span entered for its lifetime.
pub struct RunContextGuard {
    run_id: Uuid,
    _span: EnteredSpan,
}

impl RunContextGuard {
    /// Enter a new `run` span tagged with a fresh run identifier and the invoked command.
    #[must_use]
    pub fn new(command: &str) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", run_id = %run_id, command = %command).entered();
        Self {
            run_id,
            _span: span,
        }
    }

    /// Identifier recorded on the run span.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_receive_distinct_run_ids() {
        let first = RunContextGuard::new("check");
        let first_id = first.run_id();
        drop(first);
        let second = RunContextGuard::new("check");
        assert_ne!(first_id, second.run_id());
    }
}
