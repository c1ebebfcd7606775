//! YAML-to-JSON normalization.
//!
//! Configuration and input documents may be written in YAML or JSON. Both are
//! converted to JSON text first and then decoded by [`crate::codec`], so there
//! is a single decode path for the two formats.
//!
//! A document that already parses as JSON is re-encoded by the codec rather
//! than passed through YAML scalars, so its numbers keep their exact digits.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::codec::{self, DecodeError};

/// Broad category of a normalization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeErrorKind {
    /// The document could not be converted from YAML to JSON.
    YamlConversion,
    /// The converted JSON failed to decode.
    Decode,
}

/// Errors from YAML normalization.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("yamlToJson error: {0}")]
    YamlConversion(#[from] serde_yaml::Error),

    #[error("yamlToJson error: {0}")]
    JsonConversion(#[source] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl NormalizeError {
    pub fn kind(&self) -> NormalizeErrorKind {
        match self {
            NormalizeError::YamlConversion(_) | NormalizeError::JsonConversion(_) => {
                NormalizeErrorKind::YamlConversion
            }
            NormalizeError::Decode(_) => NormalizeErrorKind::Decode,
        }
    }
}

/// Convert a YAML (or JSON) document into JSON text.
///
/// An empty document converts to `null`.
pub fn yaml_to_json(bytes: &[u8]) -> Result<Vec<u8>, NormalizeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(b"null".to_vec());
    }
    if let Ok(value) = codec::decode(bytes) {
        return serde_json::to_vec(&value).map_err(NormalizeError::JsonConversion);
    }
    let document: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    serde_json::to_vec(&document).map_err(NormalizeError::JsonConversion)
}

/// Decode a YAML or JSON document into a structural value.
pub fn unmarshal(bytes: &[u8]) -> Result<Value, NormalizeError> {
    unmarshal_as(bytes)
}

/// Decode a YAML or JSON document into `T`.
pub fn unmarshal_as<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NormalizeError> {
    let json = yaml_to_json(bytes)?;
    Ok(codec::unmarshal_json(&json)?)
}
