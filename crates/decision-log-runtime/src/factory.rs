//! Sink factories for building sinks from configuration.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = SinkRegistry::with_defaults();
//! registry.register(Arc::new(MyKafkaSinkFactory));
//!
//! let sink = registry.create("console", &serde_json::json!({}))?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::sink::{ConsoleSink, DecisionSink, MemorySink, SinkError};

/// Creates sinks of one type from JSON configuration.
pub trait SinkFactory: Send + Sync {
    /// Unique identifier for this sink type (e.g. "console").
    fn sink_type(&self) -> &'static str;

    /// Create a sink from its configuration block.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn DecisionSink>, SinkError>;

    /// Human-readable description of this sink.
    fn description(&self) -> &'static str {
        "Decision log sink"
    }
}

/// Factory for [`ConsoleSink`]. Takes no configuration.
pub struct ConsoleSinkFactory;

impl SinkFactory for ConsoleSinkFactory {
    fn sink_type(&self) -> &'static str {
        "console"
    }

    fn create(&self, _config: &JsonValue) -> Result<Arc<dyn DecisionSink>, SinkError> {
        Ok(Arc::new(ConsoleSink::new()))
    }

    fn description(&self) -> &'static str {
        "Writes records as tracing events"
    }
}

/// Factory for [`MemorySink`]. Accepts an optional `capacity`.
pub struct MemorySinkFactory;

impl SinkFactory for MemorySinkFactory {
    fn sink_type(&self) -> &'static str {
        "memory"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn DecisionSink>, SinkError> {
        match config.get("capacity") {
            None | Some(JsonValue::Null) => Ok(Arc::new(MemorySink::new())),
            Some(capacity) => {
                let capacity = capacity
                    .as_u64()
                    .and_then(|c| usize::try_from(c).ok())
                    .ok_or_else(|| {
                        SinkError::Config(format!(
                            "memory sink capacity must be a non-negative integer, got {capacity}"
                        ))
                    })?;
                Ok(Arc::new(MemorySink::with_capacity(capacity)))
            }
        }
    }

    fn description(&self) -> &'static str {
        "Keeps records in memory"
    }
}

/// Registry of available sink factories.
#[derive(Default)]
pub struct SinkRegistry {
    factories: BTreeMap<String, Arc<dyn SinkFactory>>,
}

impl SinkRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `console` and `memory` sinks.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ConsoleSinkFactory));
        registry.register(Arc::new(MemorySinkFactory));
        registry
    }

    /// Register a factory, replacing any with the same type.
    pub fn register(&mut self, factory: Arc<dyn SinkFactory>) {
        self.factories
            .insert(factory.sink_type().to_string(), factory);
    }

    /// Build the sink registered under `sink_type` from its config block.
    pub fn create(
        &self,
        sink_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn DecisionSink>, SinkError> {
        let Some(factory) = self.factories.get(sink_type) else {
            return Err(SinkError::Config(format!(
                "no decision sink registered for type '{sink_type}' (known: {})",
                self.available_types().join(", ")
            )));
        };
        tracing::debug!(sink_type, "Creating decision sink");
        factory.create(config)
    }

    /// Registered sink types, sorted.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.available_types())
            .finish()
    }
}
