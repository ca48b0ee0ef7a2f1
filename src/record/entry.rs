//! The structured log record.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::OnceLock;

use crate::record::event::EventId;
use crate::record::exception::ExceptionInfo;
use crate::record::level::LogLevel;

/// Authenticated subject attached to a record, captured best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    subject: String,
    token: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            token: token.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// One emitted log call.
///
/// Built through [`LogRecordBuilder`]; immutable once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    timestamp: DateTime<Utc>,
    category: String,
    level: LogLevel,
    text: String,
    event_id: EventId,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<ExceptionInfo>,
    #[serde(serialize_with = "serialize_scopes")]
    scopes: Vec<(String, String)>,
    #[serde(rename = "applicationUser", skip_serializing_if = "Option::is_none")]
    identity: Option<Identity>,
    host_name: String,
    system_user: String,
}

impl LogRecord {
    /// Start a record; the timestamp is fixed here.
    pub fn builder(category: impl Into<String>, level: LogLevel) -> LogRecordBuilder {
        LogRecordBuilder {
            record: LogRecord {
                timestamp: Utc::now(),
                category: category.into(),
                level,
                text: String::new(),
                event_id: EventId::default(),
                exception: None,
                scopes: Vec::new(),
                identity: None,
                host_name: host_name().to_string(),
                system_user: system_user().to_string(),
            },
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    /// Flattened scope entries, outermost first.
    pub fn scopes(&self) -> &[(String, String)] {
        &self.scopes
    }

    /// Look up a single scope value.
    pub fn scope(&self, key: &str) -> Option<&str> {
        self.scopes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn system_user(&self) -> &str {
        &self.system_user
    }
}

/// Append-only builder used during the emission call.
#[derive(Debug)]
pub struct LogRecordBuilder {
    record: LogRecord,
}

impl LogRecordBuilder {
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.record.text = text.into();
        self
    }

    pub fn event_id(&mut self, event_id: EventId) -> &mut Self {
        self.record.event_id = event_id;
        self
    }

    pub fn exception(&mut self, exception: ExceptionInfo) -> &mut Self {
        self.record.exception = Some(exception);
        self
    }

    pub fn identity(&mut self, identity: Identity) -> &mut Self {
        self.record.identity = Some(identity);
        self
    }

    /// Add a scope entry. A later entry with the same key replaces the
    /// earlier value in place, so inner scopes win over outer ones.
    pub fn scope(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.record.scopes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.record.scopes.push((key, value)),
        }
        self
    }

    pub fn build(self) -> LogRecord {
        self.record
    }
}

fn serialize_scopes<S: Serializer>(scopes: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(scopes.iter().map(|(k, v)| (k, v)))
}

fn host_name() -> &'static str {
    static HOST_NAME: OnceLock<String> = OnceLock::new();
    HOST_NAME.get_or_init(|| {
        std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    })
}

fn system_user() -> &'static str {
    static SYSTEM_USER: OnceLock<String> = OnceLock::new();
    SYSTEM_USER.get_or_init(|| {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    })
}
