//! Diagnostic sinks for listener failures.
//!
//! The emitter never prints directly. When `log_errors` is enabled, every contained failure is
//! handed to the configured [`DiagnosticSink`]; the default [`TracingSink`] forwards it to
//! `tracing`.

use crate::error::ListenerError;
use crate::key::MetaChannel;
use parking_lot::Mutex;
use std::fmt;
use tracing::error;

/// Where a reported failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSite {
    /// A user listener failed during `emit`.
    Listener,
    /// A lifecycle hook subscribed to the given meta channel failed.
    Hook(MetaChannel),
}

impl fmt::Display for FailureSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener => f.write_str("listener"),
            Self::Hook(channel) => write!(f, "hook {channel}"),
        }
    }
}

/// A borrowed view of one failure, handed to a [`DiagnosticSink`].
#[derive(Debug, Clone, Copy)]
pub struct Diagnostic<'a> {
    /// Where the failure happened.
    pub site: FailureSite,
    /// The event the failing callback was handling.
    pub event: &'a dyn fmt::Debug,
    /// Emitted arguments; `None` for hook failures.
    pub args: Option<&'a dyn fmt::Debug>,
    /// The failure itself.
    pub error: &'a ListenerError,
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for event {:?}", self.site, self.event)?;
        if let Some(args) = self.args {
            write!(f, " with args {args:?}")?;
        }
        write!(f, ": {}", self.error)
    }
}

/// Receives failures that the emitter contained.
pub trait DiagnosticSink: fmt::Debug + Send + Sync {
    /// Records one failure. Must not panic.
    fn report(&self, diagnostic: &Diagnostic<'_>);
}

/// Default sink: reports through `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic<'_>) {
        error!(
            site = %diagnostic.site,
            event = ?diagnostic.event,
            args = ?diagnostic.args,
            label = diagnostic.error.as_label(),
            error = %diagnostic.error,
            "Event listener failed"
        );
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&self, _diagnostic: &Diagnostic<'_>) {}
}

/// Sink that keeps rendered diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded line, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &Diagnostic<'_>) {
        self.entries.lock().push(diagnostic.to_string());
    }
}
