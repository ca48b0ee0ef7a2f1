//! Pipeline assembly and reload.
//!
//! # Responsibilities
//! - Build the built-in sinks from config and start one provider per sink
//! - Accept extra sinks from the host
//! - Hand out category loggers sharing the same providers
//! - Apply reloaded settings and shut every provider down

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApplicationConfig, AuditConfig};
use crate::dispatch::SinkProvider;
use crate::logger::Logger;
use crate::sinks::{ConsoleSink, EventCollectorSink, IndexCollectorSink, Sink, Terminal};

pub(crate) struct PipelineInner {
    pub providers: Vec<Arc<SinkProvider>>,
    pub application: ArcSwap<ApplicationConfig>,
    console: Arc<ConsoleSink>,
    index: Arc<IndexCollectorSink>,
    event: Arc<EventCollectorSink>,
}

/// Shared handle to the providers. Cloning is cheap.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) inner: Arc<PipelineInner>,
}

impl Pipeline {
    /// Pipeline writing console output to stdout. Must be called inside a
    /// Tokio runtime.
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: &AuditConfig) -> PipelineBuilder {
        PipelineBuilder {
            config: config.clone(),
            terminal: Terminal::stdout(),
            extra: Vec::new(),
        }
    }

    /// Logger for one category.
    pub fn logger(&self, category: impl Into<String>) -> Logger {
        Logger::new(category.into(), self.clone())
    }

    pub fn providers(&self) -> &[Arc<SinkProvider>] {
        &self.inner.providers
    }

    /// Swap sink settings and application identity. Records already queued
    /// are delivered with the new settings.
    pub fn apply(&self, config: &AuditConfig) {
        self.inner.console.apply(config.console.clone());
        self.inner.index.apply(config.index_collector.clone());
        self.inner.event.apply(config.event_collector.clone());
        self.inner.application.store(Arc::new(config.application.clone()));
        tracing::info!("Audit pipeline settings reloaded");
    }

    /// Drain and stop every provider.
    pub async fn shutdown(&self) {
        let drains = self.inner.providers.iter().map(|provider| provider.shutdown());
        futures_util::future::join_all(drains).await;
        tracing::info!("Audit pipeline stopped");
    }
}

pub struct PipelineBuilder {
    config: AuditConfig,
    terminal: Terminal,
    extra: Vec<Arc<dyn Sink>>,
}

impl PipelineBuilder {
    /// Terminal used by the console sink and for failure reports.
    pub fn terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = terminal;
        self
    }

    /// Add a host-provided sink next to the built-in ones.
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.extra.push(sink);
        self
    }

    pub fn build(self) -> Pipeline {
        let drain_timeout = Duration::from_millis(self.config.dispatch.drain_timeout_ms);
        let terminal = self.terminal;

        let console = Arc::new(ConsoleSink::new(self.config.console.clone(), terminal.clone()));
        let index = Arc::new(IndexCollectorSink::new(
            self.config.index_collector.clone(),
            terminal.clone(),
        ));
        let event = Arc::new(EventCollectorSink::new(
            self.config.event_collector.clone(),
            terminal.clone(),
        ));

        let sinks: Vec<Arc<dyn Sink>> = [
            console.clone() as Arc<dyn Sink>,
            index.clone() as Arc<dyn Sink>,
            event.clone() as Arc<dyn Sink>,
        ]
        .into_iter()
        .chain(self.extra)
        .collect();

        let providers = sinks
            .into_iter()
            .map(|sink| SinkProvider::spawn(sink, terminal.clone(), drain_timeout))
            .collect();

        Pipeline {
            inner: Arc::new(PipelineInner {
                providers,
                application: ArcSwap::from_pointee(self.config.application),
                console,
                index,
                event,
            }),
        }
    }
}
