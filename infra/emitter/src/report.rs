//! Re-entrancy guard for the listener-error channel.
//!
//! ```text
//!   Idle ──begin()──► Reporting ──guard dropped──► Idle
//!                         │
//!                         └─begin()──► None (nested report suppressed)
//! ```
//!
//! The state is tracked per thread. While a thread delivers a failure to listener-error hooks,
//! any failure raised from inside that delivery is not routed back to the hooks. This bounds
//! the chain to the original failure plus one report. Failures on other threads are routed
//! normally.

use fxhash::FxHashSet;
use parking_lot::Mutex;
use std::thread::{self, ThreadId};

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ReportState {
    #[default]
    Idle,
    Reporting,
}

#[derive(Debug, Default)]
pub(crate) struct ErrorReporter {
    reporting: Mutex<FxHashSet<ThreadId>>,
}

impl ErrorReporter {
    /// Enters `Reporting` for the calling thread. Returns `None` when this thread is already
    /// reporting.
    pub(crate) fn begin(&self) -> Option<ReportGuard<'_>> {
        let thread = thread::current().id();
        let entered = self.reporting.lock().insert(thread);
        entered.then(|| ReportGuard { reporter: self, thread })
    }

    #[cfg(test)]
    fn state(&self) -> ReportState {
        if self.reporting.lock().contains(&thread::current().id()) {
            ReportState::Reporting
        } else {
            ReportState::Idle
        }
    }
}

/// Returns its thread to `Idle` when dropped, including on unwind.
#[derive(Debug)]
pub(crate) struct ReportGuard<'a> {
    reporter: &'a ErrorReporter,
    thread: ThreadId,
}

impl Drop for ReportGuard<'_> {
    fn drop(&mut self) {
        self.reporter.reporting.lock().remove(&self.thread);
    }
}
