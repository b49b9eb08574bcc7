//! Reporter trait for dependency injection
//!
//! The sync executor reports progress through this trait so the engine is
//! not coupled to a particular terminal renderer.

use crate::sync::SyncOutcome;

/// Receives progress events from the engine.
pub trait Reporter: Send + Sync {
    /// A new phase has started (e.g. "Syncing").
    fn section(&self, title: &str);

    /// One file was processed by the sync executor.
    fn file_outcome(&self, outcome: &SyncOutcome);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn file_outcome(&self, outcome: &SyncOutcome) {
        (**self).file_outcome(outcome);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// Reporter that discards everything. Used by tests and `--quiet`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _title: &str) {}
    fn file_outcome(&self, _outcome: &SyncOutcome) {}
    fn info(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
}
