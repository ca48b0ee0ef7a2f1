//! Event collector sink.
//!
//! # Responsibilities
//! - Render records as compact log event format (CLEF) JSON objects
//! - POST them to `{uri}/api/events/raw?clef`, with `X-Seq-ApiKey` when set
//!
//! Reserved fields: `@t` timestamp, `@m` message, `@l` level, `@i` event id,
//! `@x` stack trace. Scopes become top-level fields and never replace a
//! reserved one. Empty values are written as `null`.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::EventCollectorConfig;
use crate::record::{LogLevel, LogRecord};
use crate::sinks::terminal::{Terminal, MARGIN};
use crate::sinks::{Sink, SinkError};

const API_KEY_HEADER: &str = "X-Seq-ApiKey";

struct EventState {
    config: EventCollectorConfig,
    endpoint: Option<Url>,
}

pub struct EventCollectorSink {
    state: ArcSwap<EventState>,
    client: reqwest::Client,
    terminal: Terminal,
}

impl EventCollectorSink {
    pub fn new(config: EventCollectorConfig, terminal: Terminal) -> Self {
        let state = resolve(config, &terminal);
        Self {
            state: ArcSwap::from_pointee(state),
            client: reqwest::Client::new(),
            terminal,
        }
    }

    /// Swap settings; the next dispatch uses them.
    pub fn apply(&self, config: EventCollectorConfig) {
        self.state.store(Arc::new(resolve(config, &self.terminal)));
    }

    pub fn endpoint(&self) -> Option<Url> {
        self.state.load().endpoint.clone()
    }
}

fn resolve(config: EventCollectorConfig, terminal: &Terminal) -> EventState {
    if !config.enabled {
        return EventState { config, endpoint: None };
    }

    let endpoint = config
        .uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .and_then(|uri| Url::parse(&format!("{}/api/events/raw?clef", uri.trim_end_matches('/'))).ok());

    if endpoint.is_none() {
        terminal.report(
            module_path!(),
            LogLevel::Warn,
            &format!("Event collector 'uri' configuration not found or invalid.\n{MARGIN}Logger not work"),
            None,
        );
    }
    if config.api_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
        terminal.report(
            module_path!(),
            LogLevel::Warn,
            &format!("Event collector 'api_key' configuration not found or invalid.\n{MARGIN}Logger maybe not work"),
            None,
        );
    }

    EventState { config, endpoint }
}

/// Render a record as a single-line CLEF object.
pub fn to_clef(record: &LogRecord) -> Result<String, serde_json::Error> {
    let mut event = Map::new();

    put(
        &mut event,
        "@t",
        &record.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    put(&mut event, "@m", record.text());
    put(&mut event, "@l", record.level().display_name());

    if let Some(exception) = record.exception() {
        put(&mut event, "Exception_HResult", &exception.native_code().to_string());
        put(&mut event, "Exception_Source", exception.source());
        put(&mut event, "Exception_Type", exception.kind());
        put(&mut event, "@x", exception.stack_trace());
    }

    put(&mut event, "@i", &record.event_id().id.to_string());
    put(&mut event, "SystemUser", record.system_user());
    if let Some(identity) = record.identity() {
        put(&mut event, "ApplicationUser", identity.subject());
    }
    put(&mut event, "HostName", record.host_name());
    put(&mut event, "Category", record.category());

    for (key, value) in record.scopes() {
        if !event.contains_key(key) {
            put(&mut event, key, value);
        }
    }

    serde_json::to_string(&Value::Object(event))
}

fn put(event: &mut Map<String, Value>, key: &str, value: &str) {
    event.insert(key.to_string(), text_or_null(value));
}

fn text_or_null(value: &str) -> Value {
    if value.trim().is_empty() || value == "null" {
        Value::Null
    } else {
        Value::String(value.to_string())
    }
}

#[async_trait]
impl Sink for EventCollectorSink {
    fn name(&self) -> &'static str {
        module_path!()
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        let state = self.state.load();
        state.endpoint.is_some() && level.passes(state.config.min_level)
    }

    fn ignores(&self, category: &str) -> bool {
        self.state
            .load()
            .config
            .ignore_categories
            .iter()
            .any(|c| c == category)
    }

    async fn dispatch(&self, record: &LogRecord) -> Result<(), SinkError> {
        let state = self.state.load_full();
        let Some(endpoint) = state.endpoint.clone() else {
            return Ok(());
        };

        let payload = to_clef(record)?;
        let mut request = self
            .client
            .post(endpoint)
            .timeout(Duration::from_secs(state.config.timeout_secs.max(1)))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.clone());
        if let Some(key) = state.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: format!("{body} | {payload}"),
            });
        }
        Ok(())
    }
}
