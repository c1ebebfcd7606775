//! # decision-log-runtime
//!
//! Async delivery of decision records.
//!
//! `decision-log-core` decides *how* a record is shaped. This crate hands the
//! finished record to a sink:
//! - [`DecisionSink`]: async destination trait, with console and in-memory sinks
//! - [`SinkRegistry`]: builds sinks by type name from configuration
//! - [`DecisionLogger`]: the build-and-deliver operation
//!
//! ## Example
//!
//! ```rust,ignore
//! use decision_log_runtime::{DecisionLogger, LoggerConfig, SinkRegistry};
//!
//! let config = LoggerConfig::from_file("decision-log.yaml")?;
//! let logger = DecisionLogger::from_config(&config, &SinkRegistry::with_defaults())?;
//!
//! let mut record = DecisionRecord::new(&outcome.decision_id).with_path("envoy/authz/allow");
//! logger.log_decision(&mut record, &outcome, eval_error).await?;
//! ```

pub mod config;
pub mod factory;
pub mod logger;
pub mod sink;

pub use config::{ConfigError, LoggerConfig, SinkConfig};
pub use factory::{ConsoleSinkFactory, MemorySinkFactory, SinkFactory, SinkRegistry};
pub use logger::{DecisionLogger, DeliveryError};
pub use sink::{ConsoleSink, DecisionSink, MemorySink, SinkError};
