//! Sink provider: one sink, one queue, one worker.
//!
//! # States
//! ```text
//! Running  → Draining: shutdown() called (or every sender dropped)
//! Draining → Stopped:  queue empty or drain timeout elapsed
//! ```
//!
//! Records enqueued while `Running` or `Draining` are delivered in order.
//! After `Stopped` they are dropped and counted.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dispatch::worker::Worker;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::record::{LogLevel, LogRecord};
use crate::sinks::{Sink, Terminal};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Running = 0,
    Draining = 1,
    Stopped = 2,
}

impl From<u8> for ProviderState {
    fn from(val: u8) -> Self {
        match val {
            0 => ProviderState::Running,
            1 => ProviderState::Draining,
            _ => ProviderState::Stopped,
        }
    }
}

pub struct SinkProvider {
    sink: Arc<dyn Sink>,
    tx: mpsc::UnboundedSender<Arc<LogRecord>>,
    state: Arc<AtomicU8>,
    shutdown: Shutdown,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SinkProvider {
    /// Start a provider and its worker task. Must be called inside a Tokio
    /// runtime.
    pub fn spawn(sink: Arc<dyn Sink>, terminal: Terminal, drain_timeout: Duration) -> Arc<Self> {
        let (tx, queue) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(ProviderState::Running as u8));
        let shutdown = Shutdown::new();

        let worker = Worker {
            sink: sink.clone(),
            terminal,
            queue,
            stop: shutdown.subscribe(),
            state: state.clone(),
            drain_timeout,
        };
        let handle = tokio::spawn(worker.run());

        Arc::new(Self {
            sink,
            tx,
            state,
            shutdown,
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    pub fn name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.state() != ProviderState::Stopped && self.sink.is_enabled(level)
    }

    pub fn state(&self) -> ProviderState {
        ProviderState::from(self.state.load(Ordering::Acquire))
    }

    /// Queue a record for the worker. Never blocks, never fails.
    pub fn enqueue(&self, record: Arc<LogRecord>) {
        let name = self.sink.name();
        if self.state() == ProviderState::Stopped {
            metrics::record_dropped(name, 1);
            return;
        }
        match self.tx.send(record) {
            Ok(()) => metrics::record_enqueued(name),
            Err(_) => metrics::record_dropped(name, 1),
        }
    }

    /// Stop accepting work, deliver what is queued (bounded by the drain
    /// timeout), and wait for the worker to exit. Idempotent.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(sink = self.name(), error = %e, "Dispatch worker panicked");
                self.state.store(ProviderState::Stopped as u8, Ordering::Release);
            }
        }
    }
}

impl Drop for SinkProvider {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::SinkError;
    use async_trait::async_trait;

    struct Collecting {
        seen: Mutex<Vec<String>>,
        delay: Duration,
    }

    #[async_trait]
    impl Sink for Collecting {
        fn name(&self) -> &'static str {
            "collecting"
        }

        fn is_enabled(&self, level: LogLevel) -> bool {
            level.passes(LogLevel::Info)
        }

        fn ignores(&self, category: &str) -> bool {
            category == "noisy"
        }

        async fn dispatch(&self, record: &LogRecord) -> Result<(), SinkError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.seen.lock().unwrap().push(record.text().to_string());
            Ok(())
        }
    }

    fn record(category: &str, text: &str) -> Arc<LogRecord> {
        let mut builder = LogRecord::builder(category, LogLevel::Info);
        builder.text(text);
        Arc::new(builder.build())
    }

    fn collecting(delay: Duration) -> Arc<Collecting> {
        Arc::new(Collecting {
            seen: Mutex::new(Vec::new()),
            delay,
        })
    }

    #[tokio::test]
    async fn test_fifo_delivery_and_drain() {
        let sink = collecting(Duration::ZERO);
        let provider = SinkProvider::spawn(sink.clone(), Terminal::captured(), Duration::from_secs(5));

        for i in 0..50 {
            provider.enqueue(record("app", &format!("r{i}")));
        }
        provider.shutdown().await;

        let seen = sink.seen.lock().unwrap().clone();
        let expected: Vec<String> = (0..50).map(|i| format!("r{i}")).collect();
        assert_eq!(seen, expected);
        assert_eq!(provider.state(), ProviderState::Stopped);
    }

    #[tokio::test]
    async fn test_ignored_category_skipped() {
        let sink = collecting(Duration::ZERO);
        let provider = SinkProvider::spawn(sink.clone(), Terminal::captured(), Duration::from_secs(5));

        provider.enqueue(record("noisy", "hidden"));
        provider.enqueue(record("app", "shown"));
        provider.shutdown().await;

        assert_eq!(*sink.seen.lock().unwrap(), vec!["shown".to_string()]);
    }

    #[tokio::test]
    async fn test_enqueue_after_stop_is_dropped() {
        let sink = collecting(Duration::ZERO);
        let provider = SinkProvider::spawn(sink.clone(), Terminal::captured(), Duration::from_secs(5));
        provider.shutdown().await;
        provider.shutdown().await;

        provider.enqueue(record("app", "late"));
        assert!(!provider.is_enabled(LogLevel::Critical));
        tokio::task::yield_now().await;
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drain_is_bounded_by_timeout() {
        let sink = collecting(Duration::from_millis(200));
        let provider = SinkProvider::spawn(sink.clone(), Terminal::captured(), Duration::from_millis(50));

        for i in 0..10 {
            provider.enqueue(record("app", &format!("r{i}")));
        }
        let started = std::time::Instant::now();
        provider.shutdown().await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(sink.seen.lock().unwrap().len() < 10);
        assert_eq!(provider.state(), ProviderState::Stopped);
    }

    #[test]
    fn test_state_from_u8() {
        assert_eq!(ProviderState::from(0), ProviderState::Running);
        assert_eq!(ProviderState::from(1), ProviderState::Draining);
        assert_eq!(ProviderState::from(9), ProviderState::Stopped);
    }
}
