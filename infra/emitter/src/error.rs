use std::borrow::Cow;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error type accepted from listeners that fail with a foreign error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Outcome of a single listener or hook invocation.
pub type ListenerResult = Result<(), ListenerError>;

/// Errors returned by emitter operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmitterError {
    /// A subscribing operation was called after [`destroy`](crate::Emitter::destroy).
    #[error("Emitter destroyed{}: {message}", format_context(.context))]
    Destroyed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl EmitterError {
    pub(crate) fn destroyed(operation: &'static str) -> Self {
        Self::Destroyed {
            message: Cow::Owned(format!("cannot call `{operation}` on a destroyed emitter")),
            context: None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Destroyed { .. } => "emitter_destroyed",
        }
    }
}

/// Adds a context string to the error carried by a `Result`.
pub trait EmitterErrorExt<T> {
    /// Attaches `context` to the error, replacing any previous context.
    ///
    /// # Errors
    /// Returns the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, EmitterError>;
}

impl<T> EmitterErrorExt<T> for Result<T, EmitterError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                EmitterError::Destroyed { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

/// Failure raised by a listener or a lifecycle hook.
///
/// Listeners report failure by returning `Err`; panics are caught and converted into
/// [`ListenerError::Panicked`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listener returned an error message.
    #[error("Listener failed: {message}")]
    Failed { message: Cow<'static, str> },

    /// The listener panicked.
    #[error("Listener panicked: {message}")]
    Panicked { message: Cow<'static, str> },

    /// The listener returned a foreign error.
    #[error("Listener error: {source}")]
    Other {
        #[source]
        source: BoxError,
    },
}

impl ListenerError {
    /// Wraps any error type as [`ListenerError::Other`].
    pub fn other(source: impl Into<BoxError>) -> Self {
        Self::Other { source: source.into() }
    }

    /// Returns the bare failure message, without the variant prefix.
    #[must_use]
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            Self::Failed { message } | Self::Panicked { message } => Cow::Borrowed(message),
            Self::Other { source } => Cow::Owned(source.to_string()),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "listener_failed",
            Self::Panicked { .. } => "listener_panicked",
            Self::Other { .. } => "listener_error",
        }
    }

    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            Cow::Borrowed(*msg)
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            Cow::Owned(msg.clone())
        } else {
            Cow::Borrowed("unknown panic")
        };
        Self::Panicked { message }
    }
}

impl From<&'static str> for ListenerError {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::Failed { message: Cow::Borrowed(s) }
    }
}

impl From<String> for ListenerError {
    #[inline]
    fn from(s: String) -> Self {
        Self::Failed { message: Cow::Owned(s) }
    }
}

impl From<BoxError> for ListenerError {
    #[inline]
    fn from(source: BoxError) -> Self {
        Self::Other { source }
    }
}

/// Return types a listener closure may produce.
///
/// Implemented for `()` (infallible listeners) and [`ListenerResult`].
pub trait IntoListenerResult {
    /// Converts the closure output into a [`ListenerResult`].
    ///
    /// # Errors
    /// Returns the listener's failure, if any.
    fn into_listener_result(self) -> ListenerResult;
}

impl IntoListenerResult for () {
    #[inline]
    fn into_listener_result(self) -> ListenerResult {
        Ok(())
    }
}

impl IntoListenerResult for ListenerResult {
    #[inline]
    fn into_listener_result(self) -> ListenerResult {
        self
    }
}

#[allow(clippy::ref_option)]
fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroyed_error_renders_context() {
        let err: Result<(), EmitterError> = Err(EmitterError::destroyed("on"));
        let err = err.context("registering ready listener").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Emitter destroyed (registering ready listener): cannot call `on` on a destroyed emitter"
        );
        assert_eq!(err.as_label(), "emitter_destroyed");
    }

    #[test]
    fn panic_payloads_become_messages() {
        let err = ListenerError::from_panic(&"static boom");
        assert_eq!(err.message(), "static boom");

        let err = ListenerError::from_panic(&String::from("owned boom"));
        assert_eq!(err.message(), "owned boom");
        assert_eq!(err.as_label(), "listener_panicked");

        let err = ListenerError::from_panic(&42_u8);
        assert_eq!(err.message(), "unknown panic");
    }

    #[test]
    fn foreign_errors_keep_their_source() {
        let io = std::io::Error::other("disk gone");
        let err = ListenerError::other(io);
        assert_eq!(err.message(), "disk gone");
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Listener error: disk gone");
    }
}
