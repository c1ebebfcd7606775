//! Error classification for decision records.
//!
//! Classification is total and applies these rules in order:
//! 1. Storage and compile errors pass through unchanged.
//! 2. Engine errors caused by cancellation are replaced by a fixed
//!    cancellation error; other engine errors pass through.
//! 3. Everything else is wrapped as `{"message": <error text>}`.
//!
//! A cancelled engine error must never reach rule 3, and structured errors
//! must never be wrapped.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::{CompileError, CompileErrors, EngineError, EngineErrorCode, EvalError, StorageError};

/// Message reported for every cancelled query, whatever the original cause.
pub const CANCEL_MESSAGE: &str = "context deadline reached during query execution";

/// Replacement for errors whose structure cannot be trusted to serialize.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct InternalError {
    pub message: String,
}

/// An error that already serializes to a stable shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredError {
    Storage(StorageError),
    Compile(CompileError),
    CompileErrors(CompileErrors),
    Engine(EngineError),
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredError::Storage(e) => fmt::Display::fmt(e, f),
            StructuredError::Compile(e) => fmt::Display::fmt(e, f),
            StructuredError::CompileErrors(e) => fmt::Display::fmt(e, f),
            StructuredError::Engine(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// The error slot of a decision record.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedError {
    /// Kept verbatim.
    Passthrough(StructuredError),
    /// Cancelled engine error rewritten to the fixed cancellation shape.
    CancellationRemap(EngineError),
    /// Unknown error reduced to its message.
    OpaqueWrap(InternalError),
}

impl ClassifiedError {
    /// Human-readable message of the logged error.
    pub fn message(&self) -> String {
        match self {
            ClassifiedError::Passthrough(StructuredError::Storage(e)) => e.message.clone(),
            ClassifiedError::Passthrough(StructuredError::Compile(e)) => e.message.clone(),
            ClassifiedError::Passthrough(StructuredError::CompileErrors(e)) => e.to_string(),
            ClassifiedError::Passthrough(StructuredError::Engine(e)) => e.message.clone(),
            ClassifiedError::CancellationRemap(e) => e.message.clone(),
            ClassifiedError::OpaqueWrap(e) => e.message.clone(),
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedError::Passthrough(e) => fmt::Display::fmt(e, f),
            ClassifiedError::CancellationRemap(e) => fmt::Display::fmt(e, f),
            ClassifiedError::OpaqueWrap(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl Serialize for ClassifiedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClassifiedError::Passthrough(e) => e.serialize(serializer),
            ClassifiedError::CancellationRemap(e) => e.serialize(serializer),
            ClassifiedError::OpaqueWrap(e) => e.serialize(serializer),
        }
    }
}

/// Sort an evaluation error into its logged shape.
pub fn classify(err: EvalError) -> ClassifiedError {
    match err {
        EvalError::Storage(e) => ClassifiedError::Passthrough(StructuredError::Storage(e)),
        EvalError::Compile(e) => ClassifiedError::Passthrough(StructuredError::Compile(e)),
        EvalError::CompileErrors(e) => {
            ClassifiedError::Passthrough(StructuredError::CompileErrors(e))
        }
        EvalError::Engine(e) if e.is_cancel() => {
            tracing::debug!(original = %e, "Remapping cancelled query error");
            ClassifiedError::CancellationRemap(EngineError::new(
                EngineErrorCode::Cancel,
                CANCEL_MESSAGE,
            ))
        }
        EvalError::Engine(e) => ClassifiedError::Passthrough(StructuredError::Engine(e)),
        EvalError::Opaque(e) => ClassifiedError::OpaqueWrap(InternalError {
            message: e.to_string(),
        }),
    }
}
