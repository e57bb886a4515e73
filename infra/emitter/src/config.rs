use crate::emitter::Emitter;
use crate::key::{EventKey, Payload};
use crate::sink::{DiagnosticSink, TracingSink};
use serde::Deserialize;
use std::sync::Arc;

/// Emitter settings that can be loaded from an application config file.
///
/// # Example
/// ```rust
/// use herald_emitter::EmitterConfig;
///
/// let cfg = EmitterConfig::default();
/// assert!(cfg.log_errors);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Report contained listener failures to the diagnostic sink.
    pub log_errors: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self { log_errors: true }
    }
}

/// A builder for [`Emitter`].
pub struct EmitterBuilder {
    config: EmitterConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for EmitterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("config", &self.config)
            .field("sink", &self.sink)
            .finish()
    }
}

impl Default for EmitterBuilder {
    fn default() -> Self {
        Self { config: EmitterConfig::default(), sink: Arc::new(TracingSink) }
    }
}

impl EmitterBuilder {
    /// Replaces all settings with `config`.
    #[must_use = "The builder must be configured before it can be used to build the emitter."]
    pub const fn config(mut self, config: EmitterConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables or disables reporting of contained failures to the sink.
    #[must_use = "The builder must be configured before it can be used to build the emitter."]
    pub const fn log_errors(mut self, enabled: bool) -> Self {
        self.config.log_errors = enabled;
        self
    }

    /// Sets the diagnostic sink. Defaults to [`TracingSink`].
    #[must_use = "The builder must be configured before it can be used to build the emitter."]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds a live emitter.
    #[must_use]
    pub fn build<K: EventKey, A: Payload>(self) -> Emitter<K, A> {
        Emitter::from_parts(self.config, self.sink)
    }
}
