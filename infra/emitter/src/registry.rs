//! Event key to listener mapping.
//!
//! The registry is a plain data structure; locking and notifications live in
//! [`Emitter`](crate::Emitter). A key present in the map always has at least one registration.

use crate::key::EventKey;
use crate::listener::{Listener, ListenerId};
use fxhash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a single `on`/`once` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RegistrationId(u64);

impl RegistrationId {
    pub(crate) fn next() -> Self {
        Self(NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
enum Mode {
    Persistent,
    Once { fired: AtomicBool },
}

/// One entry in an event's listener sequence.
///
/// A `once` registration keeps the original listener, so identity-based removal finds it.
#[derive(Debug)]
pub(crate) struct Registration<A> {
    id: RegistrationId,
    listener: Listener<A>,
    mode: Mode,
}

impl<A> Registration<A> {
    pub(crate) fn persistent(listener: Listener<A>) -> Self {
        Self { id: RegistrationId::next(), listener, mode: Mode::Persistent }
    }

    pub(crate) fn once(listener: Listener<A>) -> Self {
        Self {
            id: RegistrationId::next(),
            listener,
            mode: Mode::Once { fired: AtomicBool::new(false) },
        }
    }

    pub(crate) const fn id(&self) -> RegistrationId {
        self.id
    }

    pub(crate) const fn listener(&self) -> &Listener<A> {
        &self.listener
    }

    pub(crate) const fn is_once(&self) -> bool {
        matches!(self.mode, Mode::Once { .. })
    }

    /// Claims the right to run. Always succeeds for persistent registrations; succeeds exactly
    /// once for `once` registrations.
    pub(crate) fn claim(&self) -> bool {
        match &self.mode {
            Mode::Persistent => true,
            Mode::Once { fired } => !fired.swap(true, Ordering::AcqRel),
        }
    }
}

/// Result of a removal attempt.
#[derive(Debug)]
pub(crate) enum Removal<A> {
    /// Nothing matched.
    Missing,
    /// A registration was removed; `emptied` is true when it was the last one for the key.
    Removed { registration: Arc<Registration<A>>, emptied: bool },
}

pub(crate) type Snapshot<A> = Vec<Arc<Registration<A>>>;

#[derive(Debug)]
pub(crate) struct Registry<K, A> {
    events: FxHashMap<K, Vec<Arc<Registration<A>>>>,
}

impl<K, A> Default for Registry<K, A> {
    fn default() -> Self {
        Self { events: FxHashMap::default() }
    }
}

impl<K: EventKey, A> Registry<K, A> {
    /// Appends a registration. Returns `true` when it is the first one for `event`.
    pub(crate) fn insert(&mut self, event: K, registration: Arc<Registration<A>>) -> bool {
        let sequence = self.events.entry(event).or_default();
        let first = sequence.is_empty();
        sequence.push(registration);
        first
    }

    /// Removes the first registration of `listener` under `event`.
    pub(crate) fn remove_listener(&mut self, event: &K, listener: ListenerId) -> Removal<A> {
        self.remove_where(event, |r| r.listener.id() == listener)
    }

    /// Removes exactly one registration by its id.
    pub(crate) fn remove_registration(&mut self, event: &K, id: RegistrationId) -> Removal<A> {
        self.remove_where(event, |r| r.id == id)
    }

    fn remove_where(
        &mut self,
        event: &K,
        matches: impl Fn(&Registration<A>) -> bool,
    ) -> Removal<A> {
        let Some(sequence) = self.events.get_mut(event) else {
            return Removal::Missing;
        };
        let Some(index) = sequence.iter().position(|r| matches(&**r)) else {
            return Removal::Missing;
        };

        let registration = sequence.remove(index);
        let emptied = sequence.is_empty();
        if emptied {
            self.events.remove(event);
        }
        Removal::Removed { registration, emptied }
    }

    /// Copies the current sequence for `event`. Empty when nothing is registered.
    pub(crate) fn snapshot(&self, event: &K) -> Snapshot<A> {
        self.events.get(event).cloned().unwrap_or_default()
    }

    /// Removes and returns every registration of `event`.
    pub(crate) fn take(&mut self, event: &K) -> Option<Snapshot<A>> {
        self.events.remove(event)
    }

    /// Removes everything, returning the entries in enumeration order.
    pub(crate) fn drain(&mut self) -> Vec<(K, Snapshot<A>)> {
        self.events.drain().collect()
    }

    pub(crate) fn listener_count(&self, event: &K) -> usize {
        self.events.get(event).map_or(0, Vec::len)
    }

    pub(crate) fn contains(&self, event: &K) -> bool {
        self.events.contains_key(event)
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.events.keys().cloned().collect()
    }

    pub(crate) fn event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener() -> Listener<()> {
        Listener::new(|(): &()| {})
    }

    #[test]
    fn insert_reports_first_registration() {
        let mut registry = Registry::<&str, ()>::default();
        let l = listener();

        assert!(registry.insert("a", Arc::new(Registration::persistent(l.clone()))));
        assert!(!registry.insert("a", Arc::new(Registration::persistent(l.clone()))));
        assert!(registry.insert("b", Arc::new(Registration::persistent(l))));
        assert_eq!(registry.listener_count(&"a"), 2);
        assert_eq!(registry.event_count(), 2);
    }

    #[test]
    fn removing_last_registration_deletes_the_key() {
        let mut registry = Registry::<&str, ()>::default();
        let l = listener();
        registry.insert("a", Arc::new(Registration::persistent(l.clone())));
        registry.insert("a", Arc::new(Registration::persistent(l.clone())));

        assert!(matches!(
            registry.remove_listener(&"a", l.id()),
            Removal::Removed { emptied: false, .. }
        ));
        assert!(registry.contains(&"a"));
        assert!(matches!(
            registry.remove_listener(&"a", l.id()),
            Removal::Removed { emptied: true, .. }
        ));
        assert!(!registry.contains(&"a"));
        assert!(matches!(registry.remove_listener(&"a", l.id()), Removal::Missing));
    }

    #[test]
    fn remove_listener_takes_first_match_only() {
        let mut registry = Registry::<&str, ()>::default();
        let (a, b) = (listener(), listener());
        let first = Arc::new(Registration::persistent(a.clone()));
        let first_id = first.id();
        registry.insert("e", first);
        registry.insert("e", Arc::new(Registration::persistent(b)));
        registry.insert("e", Arc::new(Registration::persistent(a.clone())));

        let Removal::Removed { registration, .. } = registry.remove_listener(&"e", a.id()) else {
            panic!("expected a removal");
        };
        assert_eq!(registration.id(), first_id);
        assert_eq!(registry.listener_count(&"e"), 2);
    }

    #[test]
    fn once_registrations_match_original_identity() {
        let mut registry = Registry::<&str, ()>::default();
        let l = listener();
        registry.insert("e", Arc::new(Registration::once(l.clone())));

        assert!(matches!(registry.remove_listener(&"e", l.id()), Removal::Removed { .. }));
        assert_eq!(registry.event_count(), 0);
    }

    #[test]
    fn once_claim_succeeds_a_single_time() {
        let once = Registration::once(listener());
        assert!(once.is_once());
        assert!(once.claim());
        assert!(!once.claim());

        let persistent = Registration::persistent(listener());
        assert!(persistent.claim());
        assert!(persistent.claim());
    }

    #[test]
    fn snapshot_is_detached_from_the_registry() {
        let mut registry = Registry::<&str, ()>::default();
        registry.insert("e", Arc::new(Registration::persistent(listener())));

        let snapshot = registry.snapshot(&"e");
        registry.insert("e", Arc::new(Registration::persistent(listener())));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.listener_count(&"e"), 2);
        assert!(registry.snapshot(&"missing").is_empty());
    }

    #[test]
    fn take_and_drain_leave_no_keys() {
        let mut registry = Registry::<&str, ()>::default();
        registry.insert("a", Arc::new(Registration::persistent(listener())));
        registry.insert("b", Arc::new(Registration::persistent(listener())));

        assert_eq!(registry.take(&"a").map(|s| s.len()), Some(1));
        assert!(registry.take(&"a").is_none());

        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, "b");
        assert!(registry.keys().is_empty());
    }
}
