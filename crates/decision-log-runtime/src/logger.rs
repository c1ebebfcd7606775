//! Build-and-deliver entry point for decision logging.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use decision_log_core::{DecisionRecord, EvalError, EvalOutcome};

use crate::config::LoggerConfig;
use crate::factory::SinkRegistry;
use crate::sink::{DecisionSink, SinkError};

/// Errors from delivering a record to its sink.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Decision log sink '{sink}' failed: {source}")]
    Sink {
        sink: String,
        #[source]
        source: SinkError,
    },

    #[error("Decision log delivery to '{sink}' timed out after {after:?}")]
    Timeout { sink: String, after: Duration },
}

/// Shapes decision records and hands them to an optional sink.
///
/// Logging is optional: without a sink every call succeeds and leaves the
/// record untouched. Delivery is attempted once; failures are returned to
/// the caller as-is.
#[derive(Clone, Default)]
pub struct DecisionLogger {
    sink: Option<Arc<dyn DecisionSink>>,
    delivery_timeout: Option<Duration>,
}

impl DecisionLogger {
    pub fn new(sink: Option<Arc<dyn DecisionSink>>) -> Self {
        Self {
            sink,
            delivery_timeout: None,
        }
    }

    /// Logger with no sink.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<dyn DecisionSink>) -> Self {
        Self::new(Some(sink))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = Some(timeout);
        self
    }

    /// Build a logger from configuration, creating its sink through `registry`.
    pub fn from_config(config: &LoggerConfig, registry: &SinkRegistry) -> Result<Self, SinkError> {
        let sink = match &config.sink {
            Some(sink) => Some(registry.create(&sink.sink_type, &sink.config)?),
            None => None,
        };

        Ok(Self {
            sink,
            delivery_timeout: config.delivery_timeout,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Fill `record` from `outcome` (and `error`, when present) and deliver it.
    pub async fn log_decision(
        &self,
        record: &mut DecisionRecord,
        outcome: &EvalOutcome,
        error: Option<EvalError>,
    ) -> Result<(), DeliveryError> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };

        record.populate(outcome, error);
        tracing::debug!(
            decision_id = %record.decision_id,
            sink = sink.name(),
            has_error = record.error.is_some(),
            "Delivering decision record"
        );

        let delivery = sink.log(record);
        let result = match self.delivery_timeout {
            Some(after) => match tokio::time::timeout(after, delivery).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        decision_id = %record.decision_id,
                        sink = sink.name(),
                        timeout = ?after,
                        "Decision log delivery timed out"
                    );
                    return Err(DeliveryError::Timeout {
                        sink: sink.name().to_string(),
                        after,
                    });
                }
            },
            None => delivery.await,
        };

        result.map_err(|source| {
            tracing::warn!(
                decision_id = %record.decision_id,
                sink = sink.name(),
                error = %source,
                "Decision log delivery failed"
            );
            DeliveryError::Sink {
                sink: sink.name().to_string(),
                source,
            }
        })
    }
}

impl std::fmt::Debug for DecisionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionLogger")
            .field("sink", &self.sink.as_ref().map(|s| s.name()))
            .field("delivery_timeout", &self.delivery_timeout)
            .finish()
    }
}
