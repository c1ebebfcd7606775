//! Logger configuration.
//!
//! Loaded from YAML or JSON:
//!
//! ```yaml
//! sink:
//!   type: memory
//!   config:
//!     capacity: 1000
//! delivery_timeout: 250ms
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use decision_log_core::yaml::{self, NormalizeError};

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Which sink to build and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Registered sink type (e.g. "console").
    #[serde(rename = "type")]
    pub sink_type: String,

    /// Sink-specific settings, passed to its factory.
    #[serde(default)]
    pub config: JsonValue,
}

/// Configuration for [`crate::DecisionLogger`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Sink to deliver to; decision logging is disabled when absent.
    #[serde(default)]
    pub sink: Option<SinkConfig>,

    /// Upper bound on a single delivery.
    #[serde(default, with = "duration_opt", skip_serializing_if = "Option::is_none")]
    pub delivery_timeout: Option<Duration>,
}

mod duration_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => humantime::parse_duration(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

impl LoggerConfig {
    /// Parse configuration from a YAML or JSON string.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: LoggerConfig = yaml::unmarshal_as(text.as_bytes())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sink) = &self.sink {
            if sink.sink_type.trim().is_empty() {
                return Err(ConfigError::Invalid("sink.type must not be empty".to_string()));
            }
        }

        if self.delivery_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "delivery_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_config() {
        let config = LoggerConfig::from_yaml(
            r#"
sink:
  type: memory
  config:
    capacity: 1000
delivery_timeout: 250ms
"#,
        )
        .unwrap();

        let sink = config.sink.unwrap();
        assert_eq!(sink.sink_type, "memory");
        assert_eq!(sink.config["capacity"].as_u64(), Some(1000));
        assert_eq!(config.delivery_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_parse_json_config() {
        let config =
            LoggerConfig::from_yaml(r#"{"sink": {"type": "console"}, "delivery_timeout": "2s"}"#)
                .unwrap();
        assert_eq!(config.sink.unwrap().config, JsonValue::Null);
        assert_eq!(config.delivery_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_empty_config_disables_logging() {
        let config = LoggerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn test_bad_duration() {
        let result = LoggerConfig::from_yaml("delivery_timeout: soon");
        assert!(matches!(result, Err(ConfigError::Normalize(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = LoggerConfig::from_yaml("delivery_timeout: 0s");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_sink_type_rejected() {
        let result = LoggerConfig::from_yaml("sink:\n  type: ''\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
