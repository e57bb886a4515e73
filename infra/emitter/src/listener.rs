use crate::error::{IntoListenerResult, ListenerError, ListenerResult};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Listener`], shared by all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Type-erased callback signature used for user listeners.
pub type ListenerFn<A> = dyn Fn(&A) -> ListenerResult + Send + Sync;

/// A callable registered on an event.
///
/// Cloning is cheap and preserves identity: [`Emitter::off`](crate::Emitter::off) removes a
/// registration made with any clone of the same listener.
pub struct Listener<A> {
    id: ListenerId,
    callback: Arc<ListenerFn<A>>,
}

impl<A> Listener<A> {
    /// Wraps a closure as a listener with a fresh identity.
    ///
    /// The closure may return `()` or a [`ListenerResult`]. Panics are caught at dispatch time
    /// and reported as [`ListenerError::Panicked`].
    ///
    /// # Examples
    /// ```rust
    /// use herald_emitter::{Listener, ListenerResult};
    ///
    /// let log = Listener::new(|n: &u32| println!("got {n}"));
    /// let strict = Listener::new(|n: &u32| -> ListenerResult {
    ///     if *n == 0 { Err("zero is not allowed".into()) } else { Ok(()) }
    /// });
    /// assert_ne!(log.id(), strict.id());
    /// ```
    pub fn new<F, R>(callback: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        let callback: Arc<ListenerFn<A>> =
            Arc::new(move |args: &A| callback(args).into_listener_result());
        Self { id: ListenerId::next(), callback }
    }

    /// Returns the identity shared by this listener and its clones.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Runs the listener, converting a panic into a [`ListenerError`].
    pub(crate) fn invoke(&self, args: &A) -> ListenerResult {
        guarded(|| (self.callback)(args))
    }
}

impl<A> Clone for Listener<A> {
    fn clone(&self) -> Self {
        Self { id: self.id, callback: Arc::clone(&self.callback) }
    }
}

impl<A> PartialEq for Listener<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A> Eq for Listener<A> {}

impl<A> fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Runs a callback with panic isolation.
pub(crate) fn guarded(call: impl FnOnce() -> ListenerResult) -> ListenerResult {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(ListenerError::from_panic(&*payload)),
    }
}
