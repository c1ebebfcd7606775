//! # decision-log-core
//!
//! Builds audit records for policy decisions.
//!
//! This crate turns an evaluation outcome into a JSON-safe decision record:
//! - Identifying fields (decision id, revisions, metrics) are copied from the outcome
//! - Evaluation errors are classified into stable, serializable shapes
//! - JSON numbers keep their exact digits through decode and encode
//!
//! ## Key Guarantees
//!
//! 1. **Exclusive slots**: a record carries either a result or an error, never both
//! 2. **Total classification**: every error maps to some logged shape
//! 3. **Stable cancellation**: cancelled queries always log the same code and message
//! 4. **Lossless numbers**: `12345678901234567890.000001` stays exactly that
//!
//! ## Example
//!
//! ```rust,ignore
//! use decision_log_core::{DecisionRecord, EvalError, EvalOutcome};
//!
//! let outcome = EvalOutcome::new("abc")
//!     .with_revision("r1")
//!     .with_bundle("authz", "r2")
//!     .with_decision(serde_json::json!({"allow": true}));
//!
//! let record = DecisionRecord::build(&outcome, None);
//! let line = decision_log_core::codec::marshal_json(&record)?;
//! ```

pub mod classify;
pub mod codec;
pub mod error;
pub mod metrics;
pub mod record;
pub mod yaml;

// Re-export main types at crate root
pub use classify::{classify, ClassifiedError, InternalError, StructuredError, CANCEL_MESSAGE};
pub use codec::{
    decode, marshal_json, parse_parameter, round_trip, to_structural, unmarshal_json,
    DecodeError, DecodeErrorKind, EncodeError, ParameterError, Reference, RoundTripError,
};
pub use error::{
    CompileError, CompileErrorCode, CompileErrors, EngineError, EngineErrorCode, EvalError,
    Interruption, Location, StorageError, StorageErrorCode,
};
pub use metrics::Metrics;
pub use record::{BundleInfo, DecisionRecord, EvalOutcome, TxnId};
pub use yaml::{NormalizeError, NormalizeErrorKind};
