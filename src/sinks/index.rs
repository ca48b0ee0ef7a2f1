//! Document-index collector sink.
//!
//! Each record is posted as one camelCase JSON document to
//! `{uri}/{index}/_doc`.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::IndexCollectorConfig;
use crate::record::{LogLevel, LogRecord};
use crate::sinks::terminal::{Terminal, MARGIN};
use crate::sinks::{Sink, SinkError};

struct IndexState {
    config: IndexCollectorConfig,
    /// `None` when the sink is disabled or misconfigured.
    endpoint: Option<Url>,
}

pub struct IndexCollectorSink {
    state: ArcSwap<IndexState>,
    client: reqwest::Client,
    terminal: Terminal,
}

impl IndexCollectorSink {
    pub fn new(config: IndexCollectorConfig, terminal: Terminal) -> Self {
        let state = resolve(config, &terminal);
        Self {
            state: ArcSwap::from_pointee(state),
            client: reqwest::Client::new(),
            terminal,
        }
    }

    /// Swap settings; the next dispatch uses them.
    pub fn apply(&self, config: IndexCollectorConfig) {
        self.state.store(Arc::new(resolve(config, &self.terminal)));
    }

    /// Resolved document endpoint, if the sink is active.
    pub fn endpoint(&self) -> Option<Url> {
        self.state.load().endpoint.clone()
    }
}

fn resolve(config: IndexCollectorConfig, terminal: &Terminal) -> IndexState {
    if !config.enabled {
        return IndexState { config, endpoint: None };
    }

    let base = config
        .uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .and_then(|uri| Url::parse(uri).ok());
    let index = config.index.as_deref().map(str::trim).filter(|i| !i.is_empty());

    if base.is_none() {
        warn_misconfigured(terminal, "uri");
    }
    if index.is_none() {
        warn_misconfigured(terminal, "index");
    }

    let endpoint = match (base, index) {
        (Some(base), Some(index)) => {
            let raw = format!("{}/{}/_doc", base.as_str().trim_end_matches('/'), index);
            match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(_) => {
                    warn_misconfigured(terminal, "index");
                    None
                }
            }
        }
        _ => None,
    };

    IndexState { config, endpoint }
}

fn warn_misconfigured(terminal: &Terminal, key: &str) {
    terminal.report(
        module_path!(),
        LogLevel::Warn,
        &format!("Index collector '{key}' configuration not found or invalid.\n{MARGIN}Logger not work"),
        None,
    );
}

#[async_trait]
impl Sink for IndexCollectorSink {
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

        let response = self
            .client
            .post(endpoint)
            .timeout(Duration::from_secs(state.config.timeout_secs.max(1)))
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(uri: Option<&str>, index: Option<&str>) -> IndexCollectorConfig {
        IndexCollectorConfig {
            enabled: true,
            uri: uri.map(String::from),
            index: index.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        let terminal = Terminal::captured();
        let sink = IndexCollectorSink::new(config(Some("http://localhost:9200/"), Some("audit")), terminal.clone());
        assert_eq!(
            sink.endpoint().map(|u| u.to_string()),
            Some("http://localhost:9200/audit/_doc".to_string())
        );
        assert!(sink.is_enabled(LogLevel::Info));
        assert!(terminal.contents().is_empty());
    }

    #[test]
    fn test_missing_index_disables_with_single_warning() {
        let terminal = Terminal::captured();
        let sink = IndexCollectorSink::new(config(Some("http://localhost:9200"), None), terminal.clone());
        assert!(sink.endpoint().is_none());
        assert!(!sink.is_enabled(LogLevel::Critical));

        let contents = terminal.contents();
        assert_eq!(contents.matches("WRN: ").count(), 1);
        assert!(contents.contains("'index' configuration not found"));
    }

    #[test]
    fn test_disabled_sink_stays_quiet() {
        let terminal = Terminal::captured();
        let sink = IndexCollectorSink::new(IndexCollectorConfig::default(), terminal.clone());
        assert!(!sink.is_enabled(LogLevel::Error));
        assert!(terminal.contents().is_empty());
    }

    #[test]
    fn test_apply_enables_sink() {
        let terminal = Terminal::captured();
        let sink = IndexCollectorSink::new(IndexCollectorConfig::default(), terminal);
        sink.apply(config(Some("http://collector:9200"), Some("logs")));
        assert!(sink.is_enabled(LogLevel::Info));
        assert!(!sink.is_enabled(LogLevel::Debug));
    }
}
