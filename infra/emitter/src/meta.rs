//! Hook storage for the three meta channels.

use crate::error::ListenerResult;
use crate::failure::ListenerFailure;
use crate::key::MetaChannel;
use crate::registry::RegistrationId;
use std::sync::Arc;

pub(crate) type EventHook<K> = dyn Fn(&K) -> ListenerResult + Send + Sync;
pub(crate) type ErrorHook<K, A> = dyn Fn(&ListenerFailure<K, A>) -> ListenerResult + Send + Sync;

/// A removed hook, handed back so it can be dropped after the state lock is released.
pub(crate) type Detached = Box<dyn Send>;

#[derive(Debug)]
pub(crate) enum Lifecycle {
    HasListeners,
    NoListeners,
}

impl From<Lifecycle> for MetaChannel {
    fn from(value: Lifecycle) -> Self {
        match value {
            Lifecycle::HasListeners => Self::HasListeners,
            Lifecycle::NoListeners => Self::NoListeners,
        }
    }
}

pub(crate) struct Hooks<T: ?Sized> {
    entries: Vec<(RegistrationId, Arc<T>)>,
}

impl<T: ?Sized> Default for Hooks<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: ?Sized> Hooks<T> {
    pub(crate) fn push(&mut self, id: RegistrationId, hook: Arc<T>) {
        self.entries.push((id, hook));
    }

    fn remove(&mut self, id: RegistrationId) -> Option<Arc<T>> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.iter().map(|(_, hook)| Arc::clone(hook)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) struct MetaChannels<K, A> {
    pub(crate) has_listeners: Hooks<EventHook<K>>,
    pub(crate) no_listeners: Hooks<EventHook<K>>,
    pub(crate) listener_error: Hooks<ErrorHook<K, A>>,
}

impl<K, A> Default for MetaChannels<K, A> {
    fn default() -> Self {
        Self {
            has_listeners: Hooks::default(),
            no_listeners: Hooks::default(),
            listener_error: Hooks::default(),
        }
    }
}

impl<K: 'static, A: 'static> MetaChannels<K, A> {
    pub(crate) const fn lifecycle(&self, kind: &Lifecycle) -> &Hooks<EventHook<K>> {
        match kind {
            Lifecycle::HasListeners => &self.has_listeners,
            Lifecycle::NoListeners => &self.no_listeners,
        }
    }

    pub(crate) fn remove(&mut self, channel: MetaChannel, id: RegistrationId) -> Option<Detached> {
        match channel {
            MetaChannel::HasListeners => {
                self.has_listeners.remove(id).map(|hook| Box::new(hook) as Detached)
            },
            MetaChannel::NoListeners => {
                self.no_listeners.remove(id).map(|hook| Box::new(hook) as Detached)
            },
            MetaChannel::ListenerError => {
                self.listener_error.remove(id).map(|hook| Box::new(hook) as Detached)
            },
        }
    }

    pub(crate) fn hook_count(&self, channel: MetaChannel) -> usize {
        match channel {
            MetaChannel::HasListeners => self.has_listeners.len(),
            MetaChannel::NoListeners => self.no_listeners.len(),
            MetaChannel::ListenerError => self.listener_error.len(),
        }
    }
}
