use herald_emitter::{Emitter, Listener, ListenerResult, MemorySink};
use parking_lot::Mutex;
use std::sync::Arc;

pub type TestEmitter = Emitter<&'static str, u32>;

/// Builds an emitter that reports contained failures to the returned in-memory sink.
#[must_use]
pub fn setup_emitter() -> (TestEmitter, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let emitter = Emitter::builder().sink(sink.clone()).build();
    (emitter, sink)
}

/// Shared, ordered log of listener and hook calls.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.calls.lock().push(entry.into());
    }

    /// A listener that records `"{name}:{args}"`.
    #[must_use]
    pub fn listener(&self, name: &'static str) -> Listener<u32> {
        let recorder = self.clone();
        Listener::new(move |n: &u32| recorder.record(format!("{name}:{n}")))
    }

    /// A listener that records its call and then fails with `message`.
    #[must_use]
    pub fn failing(&self, name: &'static str, message: &'static str) -> Listener<u32> {
        let recorder = self.clone();
        Listener::new(move |n: &u32| -> ListenerResult {
            recorder.record(format!("{name}:{n}"));
            Err(message.into())
        })
    }

    /// A lifecycle hook that records `"{name}:{event}"`.
    pub fn hook(&self, name: &'static str) -> impl Fn(&&'static str) + Send + Sync + 'static {
        let recorder = self.clone();
        move |event: &&'static str| recorder.record(format!("{name}:{event}"))
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }
}
