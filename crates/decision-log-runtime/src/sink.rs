//! Decision log sinks.
//!
//! A sink receives finished decision records and persists or forwards them.
//! Sinks are shared across concurrent evaluations, so implementations must be
//! `Send + Sync` and handle their own synchronization.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use decision_log_core::codec::{self, EncodeError};
use decision_log_core::DecisionRecord;

/// Errors raised by a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink rejected record: {0}")]
    Rejected(String),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] EncodeError),

    #[error("Sink not configured: {0}")]
    Config(String),
}

/// Destination for decision records.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    /// Name used in logs and delivery errors.
    fn name(&self) -> &str;

    /// Deliver one record.
    ///
    /// Dropping the returned future abandons the delivery.
    async fn log(&self, record: &DecisionRecord) -> Result<(), SinkError>;
}

/// Writes each record as a JSON `tracing` event on the `decision_logs` target.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DecisionSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn log(&self, record: &DecisionRecord) -> Result<(), SinkError> {
        let bytes = codec::marshal_json(record)?;
        let event = String::from_utf8_lossy(&bytes);
        tracing::info!(
            target: "decision_logs",
            decision_id = %record.decision_id,
            event = %event,
            "Decision Log"
        );
        Ok(())
    }
}

/// Keeps delivered records in memory.
///
/// With a capacity set, the oldest record is dropped once the sink is full.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<VecDeque<DecisionRecord>>,
    capacity: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: Some(capacity),
        }
    }

    /// Copy of every record held, oldest first.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[async_trait]
impl DecisionSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn log(&self, record: &DecisionRecord) -> Result<(), SinkError> {
        let mut records = self.records.write();
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Ok(());
            }
            while records.len() >= capacity {
                records.pop_front();
            }
        }
        records.push_back(record.clone());
        Ok(())
    }
}
