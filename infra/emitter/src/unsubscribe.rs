use std::fmt;
use std::sync::Arc;

/// Removes the single registration it was created for.
///
/// Returned by every subscribing operation. Calling [`unsubscribe`](Self::unsubscribe) more than
/// once is a no-op, and so is calling it after the emitter was destroyed or dropped. Dropping an
/// `Unsubscriber` does not remove anything.
#[derive(Clone)]
pub struct Unsubscriber {
    remove: Arc<dyn Fn() + Send + Sync>,
}

impl Unsubscriber {
    pub(crate) fn new(remove: impl Fn() + Send + Sync + 'static) -> Self {
        Self { remove: Arc::new(remove) }
    }

    /// Removes the registration, if it is still present.
    pub fn unsubscribe(&self) {
        (self.remove)();
    }
}

impl fmt::Debug for Unsubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscriber").finish_non_exhaustive()
    }
}
