use std::fmt;
use std::hash::Hash;

/// Marker trait for types usable as event keys.
///
/// Keys are matched exactly; there is no wildcard or namespace matching. Any type that is
/// `Clone + Eq + Hash + Debug + Send + Sync + 'static` implements this trait, so `&'static str`,
/// `String` and plain enums all work.
pub trait EventKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}
impl<T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static> EventKey for T {}

/// Marker trait for event payload types.
///
/// Payloads are shared between listeners by reference and kept alive for the listener-error
/// channel, hence the `Send + Sync + 'static` bound. `Debug` is needed for diagnostics.
pub trait Payload: fmt::Debug + Send + Sync + 'static {}
impl<T: fmt::Debug + Send + Sync + 'static> Payload for T {}

/// The reserved internal channels.
///
/// They live in a registry separate from user event keys, so no user key can ever address them.
/// The string names are used only for diagnostics and are reserved: using them as user event
/// names is allowed by the type system but makes logs ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaChannel {
    /// An event went from zero listeners to one.
    HasListeners,
    /// An event went from one or more listeners to zero.
    NoListeners,
    /// A listener or lifecycle hook failed.
    ListenerError,
}

impl MetaChannel {
    /// All meta channels in declaration order.
    pub const ALL: [Self; 3] = [Self::HasListeners, Self::NoListeners, Self::ListenerError];

    /// Returns the reserved diagnostic name of the channel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HasListeners => "@@herald/has-listeners",
            Self::NoListeners => "@@herald/no-listeners",
            Self::ListenerError => "@@herald/listener-error",
        }
    }
}

impl fmt::Display for MetaChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
