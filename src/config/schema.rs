//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the audit
//! pipeline. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::record::LogLevel;

/// Root configuration for the audit pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuditConfig {
    /// Application identity stamped onto every record.
    pub application: ApplicationConfig,

    /// Local console sink.
    pub console: ConsoleConfig,

    /// Document-index collector (`{uri}/{index}/_doc`).
    pub index_collector: IndexCollectorConfig,

    /// Event collector accepting compact JSON events.
    pub event_collector: EventCollectorConfig,

    /// Body-capture middleware behaviour.
    pub middleware: MiddlewareConfig,

    /// Provider queue settings.
    pub dispatch: DispatchConfig,

    /// Diagnostics of the pipeline itself.
    pub observability: ObservabilityConfig,

    /// Demo server settings.
    pub server: ServerConfig,
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub environment: Option<String>,
}

/// Console sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,

    /// Minimum level written to the console.
    pub min_level: LogLevel,

    /// ANSI colours on/off.
    pub colored: bool,

    /// Categories never written by this sink.
    pub ignore_categories: Vec<String>,

    /// Category whose lines are printed without a timestamp.
    pub lifecycle_category: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_level: LogLevel::Info,
            colored: true,
            ignore_categories: Vec::new(),
            lifecycle_category: "traffic_audit::lifecycle".to_string(),
        }
    }
}

/// Document-index collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexCollectorConfig {
    pub enabled: bool,

    /// Collector base URI (e.g., "http://localhost:9200").
    pub uri: Option<String>,

    /// Target index name.
    pub index: Option<String>,

    pub min_level: LogLevel,

    pub ignore_categories: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IndexCollectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: None,
            index: None,
            min_level: LogLevel::Info,
            ignore_categories: Vec::new(),
            timeout_secs: 10,
        }
    }
}

/// Event collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventCollectorConfig {
    pub enabled: bool,

    /// Collector base URI (e.g., "http://localhost:5341").
    pub uri: Option<String>,

    /// Sent as `X-Seq-ApiKey` when present.
    pub api_key: Option<String>,

    pub min_level: LogLevel,

    pub ignore_categories: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EventCollectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: None,
            api_key: None,
            min_level: LogLevel::Info,
            ignore_categories: Vec::new(),
            timeout_secs: 10,
        }
    }
}

/// A `(method, path)` pair matched against inbound calls.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActionRule {
    /// HTTP verb, or `RPC` for interceptor calls.
    pub method: String,

    /// Request path, or the fully qualified RPC method.
    pub path: String,
}

impl ActionRule {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// Body-capture middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub log_request: bool,

    pub log_response: bool,

    /// Bodies larger than this are not buffered.
    pub max_capture_bytes: usize,

    /// Render the body inside the record text.
    pub summary_includes_body: bool,

    /// Calls that produce no records.
    pub ignore_actions: Vec<ActionRule>,

    /// Calls whose bodies are replaced by the redaction sentinel.
    pub security_actions: Vec<ActionRule>,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            log_request: true,
            log_response: true,
            max_capture_bytes: 1024 * 1024,
            summary_includes_body: true,
            ignore_actions: Vec::new(),
            security_actions: Vec::new(),
        }
    }
}

/// Provider queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on draining queued records at shutdown.
    pub drain_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            drain_timeout_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level for the crate's own diagnostics (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}
