//! # Herald Emitter
//!
//! An in-process event emitter with lifecycle hooks, listener error isolation and async waits.
//!
//! ## Overview
//!
//! Components register listeners under event keys and emit events with a payload. Every
//! listener registered for a key is invoked synchronously, in registration order. On top of the
//! plain registry the emitter offers:
//!
//! * **Lifecycle hooks**: be told when an event gains its first listener or loses its last one.
//! * **Error isolation**: a listener that returns `Err` or panics never affects its siblings or
//!   the caller of `emit`. Failures are routed to listener-error hooks and a [`DiagnosticSink`].
//! * **Async waits**: turn the next occurrence of one or several events into a future, with an
//!   optional timeout.
//! * **Teardown**: [`Emitter::destroy`] removes everything and rejects later subscriptions.
//!
//! Shared state lives behind a `parking_lot::Mutex` in an `FxHashMap`; the lock is never held
//! while listeners or hooks run.
//!
//! # Example
//!
//! ```rust
//! use herald_emitter::{Emitter, EmitterError, Listener, ListenerError};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! fn main() -> Result<(), EmitterError> {
//!     let emitter: Emitter<&str, String> = Emitter::new();
//!     let reported = Arc::new(AtomicBool::new(false));
//!
//!     let flag = Arc::clone(&reported);
//!     emitter.on_listener_error(move |failure| {
//!         assert_eq!(failure.event(), &"save");
//!         flag.store(true, Ordering::SeqCst);
//!     })?;
//!
//!     emitter.on("save", Listener::new(|path: &String| -> Result<(), ListenerError> {
//!         Err(format!("disk full while writing {path}").into())
//!     }))?;
//!
//!     // The failure is contained; `emit` still reports one invoked listener.
//!     assert_eq!(emitter.emit(&"save", "notes.txt".to_owned()), 1);
//!     assert!(reported.load(Ordering::SeqCst));
//!
//!     emitter.destroy();
//!     Ok(())
//! }
//! ```

mod config;
mod emitter;
mod error;
mod failure;
mod key;
mod listener;
mod meta;
mod registry;
mod report;
mod sink;
mod unsubscribe;
mod wait;

pub use config::{EmitterBuilder, EmitterConfig};
pub use emitter::Emitter;
pub use error::{
    BoxError, EmitterError, EmitterErrorExt, IntoListenerResult, ListenerError, ListenerResult,
};
pub use failure::{FailureOrigin, ListenerFailure};
pub use key::{EventKey, MetaChannel, Payload};
pub use listener::{Listener, ListenerFn, ListenerId};
pub use sink::{Diagnostic, DiagnosticSink, FailureSite, MemorySink, NoopSink, TracingSink};
pub use unsubscribe::Unsubscriber;
pub use wait::EventWait;
