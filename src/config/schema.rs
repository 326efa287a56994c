//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::serializer::{json, jsonp};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Response serializer settings.
    pub serializer: SerializerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Serializer chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SerializerConfig {
    pub json: JsonConfig,
    pub jsonp: JsonpConfig,
}

/// Plain JSON serializer settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JsonConfig {
    /// Content types handled by the JSON serializer.
    pub mime_types: Vec<String>,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            mime_types: json::DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// JSONP serializer settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JsonpConfig {
    /// Request header carrying the callback function name.
    pub callback_header: String,

    /// Content types handled by the JSONP serializer.
    pub mime_types: Vec<String>,
}

impl Default for JsonpConfig {
    fn default() -> Self {
        Self {
            callback_header: jsonp::DEFAULT_CALLBACK_HEADER.to_string(),
            mime_types: jsonp::DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.serializer.jsonp.callback_header, "X-Callback");
        assert_eq!(
            config.serializer.jsonp.mime_types,
            vec!["application/javascript", "text/javascript"]
        );
    }

    #[test]
    fn test_partial_section() {
        let config: ServerConfig = toml::from_str(
            r#"
            [serializer.jsonp]
            callback_header = "X-Jsonp"
            "#,
        )
        .unwrap();
        assert_eq!(config.serializer.jsonp.callback_header, "X-Jsonp");
        assert_eq!(config.serializer.jsonp.mime_types.len(), 2);
        assert_eq!(config.serializer.json.mime_types, vec!["application/json"]);
    }
}
