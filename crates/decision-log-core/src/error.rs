//! Error families surfaced by policy evaluation.
//!
//! The structured families (`StorageError`, `CompileError`, `CompileErrors`,
//! `EngineError`) serialize to stable JSON shapes and are safe to log as-is.
//! Anything else is carried as [`EvalError::Opaque`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source position inside a policy module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub row: u32,
    pub col: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}:{}", self.row, self.col)
        } else {
            write!(f, "{}:{}", self.file, self.row)
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageErrorCode {
    #[serde(rename = "storage_internal_error")]
    Internal,
    #[serde(rename = "storage_not_found_error")]
    NotFound,
    #[serde(rename = "storage_write_conflict_error")]
    WriteConflict,
    #[serde(rename = "storage_invalid_patch_error")]
    InvalidPatch,
    #[serde(rename = "storage_invalid_txn_error")]
    InvalidTransaction,
    #[serde(rename = "storage_not_supported_error")]
    NotSupported,
}

impl StorageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageErrorCode::Internal => "storage_internal_error",
            StorageErrorCode::NotFound => "storage_not_found_error",
            StorageErrorCode::WriteConflict => "storage_write_conflict_error",
            StorageErrorCode::InvalidPatch => "storage_invalid_patch_error",
            StorageErrorCode::InvalidTransaction => "storage_invalid_txn_error",
            StorageErrorCode::NotSupported => "storage_not_supported_error",
        }
    }
}

/// Error raised by the policy data store.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{}: {message}", .code.as_str())]
pub struct StorageError {
    pub code: StorageErrorCode,
    pub message: String,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// ============================================================================
// Compile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompileErrorCode {
    #[serde(rename = "rego_parse_error")]
    Parse,
    #[serde(rename = "rego_compile_error")]
    Compile,
    #[serde(rename = "rego_type_error")]
    Type,
    #[serde(rename = "rego_unsafe_var_error")]
    UnsafeVar,
    #[serde(rename = "rego_recursion_error")]
    Recursion,
}

impl CompileErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileErrorCode::Parse => "rego_parse_error",
            CompileErrorCode::Compile => "rego_compile_error",
            CompileErrorCode::Type => "rego_type_error",
            CompileErrorCode::UnsafeVar => "rego_unsafe_var_error",
            CompileErrorCode::Recursion => "rego_recursion_error",
        }
    }
}

/// Syntax or compile error in a policy module.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileError {
    pub code: CompileErrorCode,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Extra diagnostic payload, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CompileError {
    pub fn new(code: CompileErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
            details: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}: {}", loc, self.code.as_str(), self.message),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

/// A batch of compile errors reported together.
#[derive(Error, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompileErrors(pub Vec<CompileError>);

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no error(s)"),
            [only] => write!(f, "1 error occurred: {only}"),
            errors => {
                write!(f, "{} errors occurred:", errors.len())?;
                for err in errors {
                    write!(f, "\n{err}")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineErrorCode {
    #[serde(rename = "eval_internal_error")]
    Internal,
    #[serde(rename = "eval_cancel_error")]
    Cancel,
    #[serde(rename = "eval_conflict_error")]
    Conflict,
    #[serde(rename = "eval_type_error")]
    Type,
    #[serde(rename = "eval_builtin_error")]
    Builtin,
    #[serde(rename = "eval_with_merge_error")]
    WithMerge,
}

impl EngineErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineErrorCode::Internal => "eval_internal_error",
            EngineErrorCode::Cancel => "eval_cancel_error",
            EngineErrorCode::Conflict => "eval_conflict_error",
            EngineErrorCode::Type => "eval_type_error",
            EngineErrorCode::Builtin => "eval_builtin_error",
            EngineErrorCode::WithMerge => "eval_with_merge_error",
        }
    }
}

/// Signal that stopped a query before it finished.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error raised while evaluating a query.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineError {
    pub code: EngineErrorCode,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(skip)]
    #[source]
    pub interruption: Option<Interruption>,
}

impl EngineError {
    pub fn new(code: EngineErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
            interruption: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Error for a query stopped by `interruption`. The message is the
    /// interruption's own wording.
    pub fn interrupted_by(interruption: Interruption) -> Self {
        Self {
            code: EngineErrorCode::Cancel,
            message: interruption.to_string(),
            location: None,
            interruption: Some(interruption),
        }
    }

    /// True when the query was cancelled or hit its deadline.
    pub fn is_cancel(&self) -> bool {
        self.code == EngineErrorCode::Cancel || self.interruption.is_some()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}: {}", loc, self.code.as_str(), self.message),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

// ============================================================================
// EvalError
// ============================================================================

/// Any error that can accompany an evaluation outcome.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    CompileErrors(#[from] CompileErrors),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Errors from lower layers whose structure is unknown.
    #[error("{0}")]
    Opaque(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl EvalError {
    /// Wrap an arbitrary error.
    pub fn opaque(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        EvalError::Opaque(err.into())
    }

    /// Opaque error carrying only `message`.
    pub fn msg(message: impl fmt::Display) -> Self {
        EvalError::Opaque(message.to_string().into())
    }
}
