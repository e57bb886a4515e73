use crate::config::{EmitterBuilder, EmitterConfig};
use crate::error::{EmitterError, IntoListenerResult};
use crate::failure::ListenerFailure;
use crate::key::{EventKey, MetaChannel, Payload};
use crate::listener::{Listener, guarded};
use crate::meta::{ErrorHook, EventHook, Lifecycle, MetaChannels};
use crate::registry::{Registration, RegistrationId, Registry, Removal};
use crate::report::ErrorReporter;
use crate::sink::DiagnosticSink;
use crate::unsubscribe::Unsubscriber;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Live,
    Destroyed,
}

struct State<K, A> {
    phase: Phase,
    events: Registry<K, A>,
    meta: MetaChannels<K, A>,
}

impl<K, A> State<K, A> {
    fn is_destroyed(&self) -> bool {
        self.phase == Phase::Destroyed
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), EmitterError> {
        if self.is_destroyed() { Err(EmitterError::destroyed(operation)) } else { Ok(()) }
    }
}

struct Inner<K, A> {
    state: Mutex<State<K, A>>,
    config: EmitterConfig,
    sink: Arc<dyn DiagnosticSink>,
    reporter: ErrorReporter,
}

/// An in-process event emitter.
///
/// `K` is the event key type and `A` the payload handed to listeners. Cloning is cheap and every
/// clone drives the same registry.
///
/// Emission is synchronous: [`emit`](Self::emit) invokes every listener registered at the time
/// of the call, in insertion order, before returning. The internal lock is never held while user
/// code runs, so listeners may subscribe, unsubscribe, emit or destroy re-entrantly.
///
/// # Example
/// ```rust
/// use herald_emitter::{Emitter, Listener};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// # fn main() -> Result<(), herald_emitter::EmitterError> {
/// let emitter: Emitter<&str, u32> = Emitter::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let sum = Arc::clone(&total);
/// let unsubscribe = emitter.on("tick", Listener::new(move |n: &u32| {
///     sum.fetch_add(*n as usize, Ordering::SeqCst);
/// }))?;
///
/// emitter.emit(&"tick", 2);
/// unsubscribe.unsubscribe();
/// emitter.emit(&"tick", 40);
///
/// assert_eq!(total.load(Ordering::SeqCst), 2);
/// # Ok(())
/// # }
/// ```
pub struct Emitter<K = String, A = ()> {
    inner: Arc<Inner<K, A>>,
}

impl Emitter {
    /// Returns a new [`EmitterBuilder`].
    ///
    /// # Example
    /// ```rust
    /// use herald_emitter::{Emitter, MemorySink};
    /// use std::sync::Arc;
    ///
    /// let sink = Arc::new(MemorySink::new());
    /// let emitter: Emitter<&str, ()> = Emitter::builder().log_errors(true).sink(sink).build();
    /// assert!(emitter.log_errors());
    /// ```
    #[must_use = "The builder must be configured before it can be used to build the emitter."]
    pub fn builder() -> EmitterBuilder {
        EmitterBuilder::default()
    }
}

impl<K: EventKey, A: Payload> Emitter<K, A> {
    /// Creates a live emitter with default settings.
    #[must_use]
    pub fn new() -> Self {
        EmitterBuilder::default().build()
    }

    pub(crate) fn from_parts(config: EmitterConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let state = State {
            phase: Phase::Live,
            events: Registry::default(),
            meta: MetaChannels::default(),
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                config,
                sink,
                reporter: ErrorReporter::default(),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Subscription
    // ---------------------------------------------------------------------

    /// Registers `listener` for `event`.
    ///
    /// The same listener may be registered several times; it then runs once per registration.
    /// When this is the first listener of `event`, has-listeners hooks are notified.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn on(&self, event: K, listener: Listener<A>) -> Result<Unsubscriber, EmitterError> {
        self.subscribe(event, Registration::persistent(listener), "on")
    }

    /// Registers `listener` for the next emission of `event` only.
    ///
    /// The registration is removed before the listener runs. [`off`](Self::off) with the same
    /// listener removes it too.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn once(&self, event: K, listener: Listener<A>) -> Result<Unsubscriber, EmitterError> {
        self.subscribe(event, Registration::once(listener), "once")
    }

    fn subscribe(
        &self,
        event: K,
        registration: Registration<A>,
        operation: &'static str,
    ) -> Result<Unsubscriber, EmitterError> {
        let id = registration.id();
        let listener = registration.listener().id();
        let first = {
            let mut state = self.inner.state.lock();
            state.ensure_live(operation)?;
            state.events.insert(event.clone(), Arc::new(registration))
        };
        trace!(event = ?event, %listener, first, "Listener registered");

        if first {
            self.notify_lifecycle(Lifecycle::HasListeners, &event);
        }
        Ok(self.registration_unsubscriber(event, id))
    }

    fn registration_unsubscriber(&self, event: K, id: RegistrationId) -> Unsubscriber {
        let inner = Arc::downgrade(&self.inner);
        Unsubscriber::new(move || {
            if let Some(emitter) = Self::upgrade(&inner) {
                emitter.remove_registration(&event, id);
            }
        })
    }

    fn upgrade(inner: &Weak<Inner<K, A>>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    // ---------------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------------

    /// Removes the first registration of `listener` under `event`.
    ///
    /// Returns `true` when something was removed. Removing an unknown listener, or calling this
    /// after destruction, is a silent no-op. When the removal leaves `event` without listeners,
    /// no-listeners hooks are notified.
    pub fn off(&self, event: &K, listener: &Listener<A>) -> bool {
        let removal = {
            let mut state = self.inner.state.lock();
            if state.is_destroyed() {
                return false;
            }
            state.events.remove_listener(event, listener.id())
        };
        self.finish_removal(event, removal)
    }

    /// Alias of [`off`](Self::off).
    pub fn remove_listener(&self, event: &K, listener: &Listener<A>) -> bool {
        self.off(event, listener)
    }

    pub(crate) fn remove_registration(&self, event: &K, id: RegistrationId) -> bool {
        let removal = {
            let mut state = self.inner.state.lock();
            if state.is_destroyed() {
                return false;
            }
            state.events.remove_registration(event, id)
        };
        self.finish_removal(event, removal)
    }

    fn finish_removal(&self, event: &K, removal: Removal<A>) -> bool {
        match removal {
            Removal::Missing => false,
            Removal::Removed { registration, emptied } => {
                let listener = registration.listener().id();
                trace!(event = ?event, %listener, emptied, "Listener removed");
                drop(registration);
                if emptied {
                    self.notify_lifecycle(Lifecycle::NoListeners, event);
                }
                true
            },
        }
    }

    /// Removes every listener of `event`.
    ///
    /// Notifies no-listeners hooks exactly once if anything was registered. Returns the number of
    /// removed registrations; no-op after destruction.
    pub fn clear_event_listeners(&self, event: &K) -> usize {
        let taken = {
            let mut state = self.inner.state.lock();
            if state.is_destroyed() {
                return 0;
            }
            state.events.take(event)
        };
        let Some(registrations) = taken else {
            return 0;
        };

        let count = registrations.len();
        drop(registrations);
        trace!(event = ?event, count, "Event listeners cleared");
        self.notify_lifecycle(Lifecycle::NoListeners, event);
        count
    }

    /// Removes every listener of every event.
    ///
    /// Notifies no-listeners hooks once per event that had listeners, in the registry's
    /// enumeration order. Returns the number of cleared events; no-op after destruction.
    pub fn clear(&self) -> usize {
        let drained = {
            let mut state = self.inner.state.lock();
            if state.is_destroyed() {
                return 0;
            }
            state.events.drain()
        };

        let count = drained.len();
        for (event, registrations) in drained {
            drop(registrations);
            self.notify_lifecycle(Lifecycle::NoListeners, &event);
        }
        if count > 0 {
            debug!(events = count, "All event listeners cleared");
        }
        count
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Tears the emitter down. Idempotent.
    ///
    /// The first call clears every event (no-listeners hooks still run), then marks the emitter
    /// destroyed and discards all hooks, along with anything a hook registered during teardown.
    /// Afterwards `emit` and the removal operations are no-ops and subscribing operations fail
    /// with [`EmitterError::Destroyed`].
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.clear();

        let discarded = {
            let mut state = self.inner.state.lock();
            if state.is_destroyed() {
                return;
            }
            state.phase = Phase::Destroyed;
            (std::mem::take(&mut state.events), std::mem::take(&mut state.meta))
        };
        drop(discarded);
        debug!("Emitter destroyed");
    }

    /// Whether [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.state.lock().is_destroyed()
    }

    /// Whether contained failures are reported to the diagnostic sink.
    #[must_use]
    pub fn log_errors(&self) -> bool {
        self.inner.config.log_errors
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// Number of registrations for `event`; zero after destruction.
    #[must_use]
    pub fn listener_count(&self, event: &K) -> usize {
        self.inner.state.lock().events.listener_count(event)
    }

    /// Whether `event` has at least one registration.
    #[must_use]
    pub fn has_listeners(&self, event: &K) -> bool {
        self.inner.state.lock().events.contains(event)
    }

    /// Keys that currently have at least one listener.
    #[must_use]
    pub fn event_keys(&self) -> Vec<K> {
        self.inner.state.lock().events.keys()
    }

    /// Number of events with at least one listener.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.inner.state.lock().events.event_count()
    }

    /// Number of hooks subscribed to `channel`.
    #[must_use]
    pub fn hook_count(&self, channel: MetaChannel) -> usize {
        self.inner.state.lock().meta.hook_count(channel)
    }

    // ---------------------------------------------------------------------
    // Emission
    // ---------------------------------------------------------------------

    /// Invokes every listener of `event` with `args` and returns how many ran.
    ///
    /// The listener sequence is snapshotted first: listeners added during this call run from the
    /// next emission on, and listeners removed during it still run if they were snapshotted.
    /// Failures are contained. They never reach the caller and never stop sibling listeners;
    /// they go to listener-error hooks and, when `log_errors` is set, to the diagnostic sink.
    ///
    /// Silent no-op after destruction.
    pub fn emit(&self, event: &K, args: A) -> usize {
        let snapshot = {
            let state = self.inner.state.lock();
            if state.is_destroyed() {
                return 0;
            }
            state.events.snapshot(event)
        };
        if snapshot.is_empty() {
            return 0;
        }

        let args = Arc::new(args);
        let mut invoked = 0;
        for registration in &snapshot {
            if !registration.claim() {
                continue;
            }
            if registration.is_once() {
                self.remove_registration(event, registration.id());
            }

            invoked += 1;
            if let Err(error) = registration.listener().invoke(&args) {
                let failure = ListenerFailure::listener(error, event.clone(), Arc::clone(&args));
                self.route_failure(&failure);
            }
        }

        trace!(event = ?event, invoked, "Event dispatched");
        invoked
    }

    // ---------------------------------------------------------------------
    // Meta channels
    // ---------------------------------------------------------------------

    /// Subscribes `hook` to has-listeners: called with the event key whenever an event gains its
    /// first listener.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn on_has_event_listeners<F, R>(&self, hook: F) -> Result<Unsubscriber, EmitterError>
    where
        F: Fn(&K) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        let hook: Arc<EventHook<K>> = Arc::new(move |event: &K| hook(event).into_listener_result());
        self.add_hook(MetaChannel::HasListeners, "on_has_event_listeners", |meta, id| {
            meta.has_listeners.push(id, hook);
        })
    }

    /// Subscribes `hook` to no-listeners: called with the event key whenever an event loses its
    /// last listener.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn on_no_event_listeners<F, R>(&self, hook: F) -> Result<Unsubscriber, EmitterError>
    where
        F: Fn(&K) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        let hook: Arc<EventHook<K>> = Arc::new(move |event: &K| hook(event).into_listener_result());
        self.add_hook(MetaChannel::NoListeners, "on_no_event_listeners", |meta, id| {
            meta.no_listeners.push(id, hook);
        })
    }

    /// Subscribes `hook` to listener-error: called for every failure contained by the emitter.
    ///
    /// A failure raised by a listener-error hook itself is only logged, never routed back.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn on_listener_error<F, R>(&self, hook: F) -> Result<Unsubscriber, EmitterError>
    where
        F: Fn(&ListenerFailure<K, A>) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        let hook: Arc<ErrorHook<K, A>> =
            Arc::new(move |failure: &ListenerFailure<K, A>| hook(failure).into_listener_result());
        self.add_hook(MetaChannel::ListenerError, "on_listener_error", |meta, id| {
            meta.listener_error.push(id, hook);
        })
    }

    fn add_hook(
        &self,
        channel: MetaChannel,
        operation: &'static str,
        insert: impl FnOnce(&mut MetaChannels<K, A>, RegistrationId),
    ) -> Result<Unsubscriber, EmitterError> {
        let id = RegistrationId::next();
        {
            let mut state = self.inner.state.lock();
            state.ensure_live(operation)?;
            insert(&mut state.meta, id);
        }
        trace!(%channel, "Hook registered");

        let inner = Arc::downgrade(&self.inner);
        Ok(Unsubscriber::new(move || {
            if let Some(inner) = inner.upgrade() {
                let removed = inner.state.lock().meta.remove(channel, id);
                drop(removed);
            }
        }))
    }

    fn notify_lifecycle(&self, kind: Lifecycle, event: &K) {
        let hooks = self.inner.state.lock().meta.lifecycle(&kind).snapshot();
        let channel = MetaChannel::from(kind);
        trace!(%channel, event = ?event, hooks = hooks.len(), "Lifecycle notification");

        for hook in hooks {
            if let Err(error) = guarded(|| hook(event)) {
                let failure = ListenerFailure::hook(error, event.clone(), channel);
                self.route_failure(&failure);
            }
        }
    }

    /// Delivers `failure` to listener-error hooks, then to the sink.
    ///
    /// A failure raised while the calling thread is already reporting is not routed again;
    /// neither is a failure of a listener-error hook. Both only reach the sink. Reports on
    /// other threads do not suppress each other.
    fn route_failure(&self, failure: &ListenerFailure<K, A>) {
        match self.inner.reporter.begin() {
            Some(_report) => {
                let hooks = self.inner.state.lock().meta.listener_error.snapshot();
                for hook in hooks {
                    if let Err(error) = guarded(|| hook(failure)) {
                        if self.inner.config.log_errors {
                            warn!(
                                event = ?failure.event(),
                                error = %error,
                                "Listener-error hook failed; failure swallowed"
                            );
                        }
                        let secondary = ListenerFailure::<K, A>::hook(
                            error,
                            failure.event().clone(),
                            MetaChannel::ListenerError,
                        );
                        self.log_failure(&secondary);
                    }
                }
            },
            None if self.inner.config.log_errors => {
                warn!(
                    event = ?failure.event(),
                    site = %failure.site(),
                    "Nested failure while reporting; not routed to hooks"
                );
            },
            None => {},
        }
        self.log_failure(failure);
    }

    fn log_failure(&self, failure: &ListenerFailure<K, A>) {
        if self.inner.config.log_errors {
            self.inner.sink.report(&failure.diagnostic());
        }
    }
}

impl<K: EventKey, A: Payload> Default for Emitter<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> Clone for Emitter<K, A> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K: EventKey, A: Payload> fmt::Debug for Emitter<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Emitter")
            .field("phase", &state.phase)
            .field("events", &state.events.event_count())
            .field("log_errors", &self.inner.config.log_errors)
            .field("sink", &self.inner.sink)
            .finish_non_exhaustive()
    }
}
