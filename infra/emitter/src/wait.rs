//! Futures that resolve when an event is emitted.
//!
//! Each wait joins two cancellable parts behind a resolve-once latch: the listener
//! registrations (released through their [`Unsubscriber`]s) and an optional timer. Whichever
//! completes first releases the other. Dropping an unresolved [`EventWait`] releases everything.

use crate::emitter::Emitter;
use crate::error::{EmitterError, EmitterErrorExt};
use crate::key::{EventKey, Payload};
use crate::listener::Listener;
use crate::unsubscribe::Unsubscriber;
use fxhash::FxHashSet;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, Sleep};
use tracing::trace;

/// Resolve-once signal shared by the listeners of one wait.
///
/// Only listener closures hold it, so once every registration is gone the sender drops and the
/// waiting side observes a closed channel.
struct Latch {
    tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl Latch {
    fn new() -> (Arc<Self>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Arc::new(Self { tx: Mutex::new(Some(tx)) }), rx)
    }

    /// Returns `true` for the call that resolved the wait.
    fn fire(&self) -> bool {
        let tx = self.tx.lock().take();
        tx.is_some_and(|tx| tx.send(()).is_ok())
    }

    fn is_fired(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Unsubscribers still owed by a wait.
#[derive(Clone, Default)]
struct Release {
    pending: Arc<Mutex<Vec<Unsubscriber>>>,
}

impl Release {
    fn push(&self, unsubscriber: Unsubscriber) {
        self.pending.lock().push(unsubscriber);
    }

    fn release(&self) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for unsubscriber in pending {
            unsubscriber.unsubscribe();
        }
    }
}

/// Future returned by [`Emitter::wait_for_event`] and [`Emitter::wait_for_any_event`].
///
/// Resolves to `true` when a watched event fires, `false` when the timeout elapses or every
/// watched listener was removed without firing. Must be polled inside a Tokio runtime when a
/// timeout is set.
#[must_use = "futures do nothing unless polled"]
pub struct EventWait {
    rx: oneshot::Receiver<()>,
    deadline: Option<Instant>,
    sleep: Option<Pin<Box<Sleep>>>,
    release: Release,
    outcome: Option<bool>,
}

impl EventWait {
    fn new(rx: oneshot::Receiver<()>, max_wait: Duration, release: Release) -> Self {
        let deadline = (!max_wait.is_zero()).then(|| Instant::now() + max_wait);
        Self { rx, deadline, sleep: None, release, outcome: None }
    }

    fn finish(&mut self, fired: bool) -> bool {
        self.release.release();
        self.sleep = None;
        self.outcome = Some(fired);
        trace!(fired, "Event wait resolved");
        fired
    }
}

impl Future for EventWait {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let this = &mut *self;
        if let Some(outcome) = this.outcome {
            return Poll::Ready(outcome);
        }

        if let Poll::Ready(result) = Pin::new(&mut this.rx).poll(cx) {
            return Poll::Ready(this.finish(result.is_ok()));
        }

        if let Some(deadline) = this.deadline {
            let sleep =
                this.sleep.get_or_insert_with(|| Box::pin(tokio::time::sleep_until(deadline)));
            if sleep.as_mut().poll(cx).is_ready() {
                return Poll::Ready(this.finish(false));
            }
        }

        Poll::Pending
    }
}

impl Drop for EventWait {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            self.release.release();
        }
    }
}

impl fmt::Debug for EventWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWait")
            .field("deadline", &self.deadline)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl<K: EventKey, A: Payload> Emitter<K, A> {
    /// Returns a future that resolves when `event` is next emitted.
    ///
    /// The listener is registered before this returns, so an emission right after the call is
    /// observed even if the future has not been polled yet. `max_wait` bounds the wait;
    /// [`Duration::ZERO`] waits indefinitely.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    ///
    /// # Example
    /// ```rust
    /// use herald_emitter::Emitter;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), herald_emitter::EmitterError> {
    /// let emitter: Emitter<&str, ()> = Emitter::new();
    /// let ready = emitter.wait_for_event("ready", Duration::from_secs(1))?;
    /// emitter.emit(&"ready", ());
    /// assert!(ready.await);
    /// # Ok(())
    /// # }
    /// ```
    pub fn wait_for_event(&self, event: K, max_wait: Duration) -> Result<EventWait, EmitterError> {
        let (latch, rx) = Latch::new();
        let listener = Listener::new(move |_: &A| {
            latch.fire();
        });

        let release = Release::default();
        release.push(self.once(event, listener).context("wait_for_event")?);
        Ok(EventWait::new(rx, max_wait, release))
    }

    /// Returns a future that resolves when any of `events` is next emitted.
    ///
    /// Duplicate keys are ignored. The first event to fire removes the listeners of all the
    /// others. An empty set resolves `false` immediately.
    ///
    /// # Errors
    /// Returns [`EmitterError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn wait_for_any_event(
        &self,
        events: impl IntoIterator<Item = K>,
        max_wait: Duration,
    ) -> Result<EventWait, EmitterError> {
        let mut seen = FxHashSet::default();
        let events: Vec<K> =
            events.into_iter().filter(|event| seen.insert(event.clone())).collect();

        let (latch, rx) = Latch::new();
        let release = Release::default();
        for event in events {
            let fired = Arc::clone(&latch);
            let others = release.clone();
            let listener = Listener::new(move |_: &A| {
                if fired.fire() {
                    others.release();
                }
            });

            match self.on(event, listener).context("wait_for_any_event") {
                Ok(unsubscriber) => release.push(unsubscriber),
                Err(e) => {
                    release.release();
                    return Err(e);
                },
            }
        }

        // A lifecycle hook may have emitted one of the events while later keys were still
        // being registered.
        if latch.is_fired() {
            release.release();
        }
        drop(latch);

        Ok(EventWait::new(rx, max_wait, release))
    }
}
