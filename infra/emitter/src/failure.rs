use crate::error::ListenerError;
use crate::key::MetaChannel;
use crate::sink::{Diagnostic, FailureSite};
use std::fmt;
use std::sync::Arc;

/// What was running when a failure happened.
pub enum FailureOrigin<A> {
    /// A user listener, invoked with these arguments.
    Listener { args: Arc<A> },
    /// A lifecycle hook on the given meta channel.
    Hook(MetaChannel),
}

impl<A> Clone for FailureOrigin<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Listener { args } => Self::Listener { args: Arc::clone(args) },
            Self::Hook(channel) => Self::Hook(*channel),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for FailureOrigin<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener { args } => f.debug_struct("Listener").field("args", args).finish(),
            Self::Hook(channel) => f.debug_tuple("Hook").field(channel).finish(),
        }
    }
}

/// A contained failure, as delivered to listener-error hooks.
pub struct ListenerFailure<K, A> {
    error: Arc<ListenerError>,
    event: K,
    origin: FailureOrigin<A>,
}

impl<K, A> ListenerFailure<K, A> {
    pub(crate) fn listener(error: ListenerError, event: K, args: Arc<A>) -> Self {
        Self { error: Arc::new(error), event, origin: FailureOrigin::Listener { args } }
    }

    pub(crate) fn hook(error: ListenerError, event: K, channel: MetaChannel) -> Self {
        Self { error: Arc::new(error), event, origin: FailureOrigin::Hook(channel) }
    }

    #[must_use]
    pub fn error(&self) -> &ListenerError {
        &self.error
    }

    /// The event being handled. For hook failures, the event the notification was about.
    #[must_use]
    pub const fn event(&self) -> &K {
        &self.event
    }

    /// The emitted arguments, when a user listener failed.
    #[must_use]
    pub fn args(&self) -> Option<&A> {
        match &self.origin {
            FailureOrigin::Listener { args } => Some(&**args),
            FailureOrigin::Hook(_) => None,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> &FailureOrigin<A> {
        &self.origin
    }

    #[must_use]
    pub fn site(&self) -> FailureSite {
        match self.origin {
            FailureOrigin::Listener { .. } => FailureSite::Listener,
            FailureOrigin::Hook(channel) => FailureSite::Hook(channel),
        }
    }
}

impl<K: fmt::Debug, A: fmt::Debug> ListenerFailure<K, A> {
    pub(crate) fn diagnostic(&self) -> Diagnostic<'_> {
        Diagnostic {
            site: self.site(),
            event: &self.event,
            args: self.args().map(|args| args as &dyn fmt::Debug),
            error: &self.error,
        }
    }
}

impl<K: Clone, A> Clone for ListenerFailure<K, A> {
    fn clone(&self) -> Self {
        Self {
            error: Arc::clone(&self.error),
            event: self.event.clone(),
            origin: self.origin.clone(),
        }
    }
}

impl<K: fmt::Debug, A: fmt::Debug> fmt::Debug for ListenerFailure<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerFailure")
            .field("error", &self.error)
            .field("event", &self.event)
            .field("origin", &self.origin)
            .finish()
    }
}
