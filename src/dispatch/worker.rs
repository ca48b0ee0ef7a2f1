//! Provider background worker.
//!
//! # Responsibilities
//! - Consume the provider queue in FIFO order
//! - Hand each record to the sink, skipping ignored categories
//! - Report each failed delivery exactly once on the terminal
//! - Drain the queue at shutdown within the configured timeout

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use crate::dispatch::provider::ProviderState;
use crate::observability::metrics;
use crate::record::{ExceptionInfo, LogLevel, LogRecord};
use crate::sinks::{Sink, SinkError, Terminal};

pub(crate) struct Worker {
    pub sink: Arc<dyn Sink>,
    pub terminal: Terminal,
    pub queue: mpsc::UnboundedReceiver<Arc<LogRecord>>,
    pub stop: broadcast::Receiver<()>,
    pub state: Arc<AtomicU8>,
    pub drain_timeout: Duration,
}

impl Worker {
    pub async fn run(mut self) {
        let sink_name = self.sink.name();
        tracing::debug!(sink = sink_name, "Dispatch worker started");

        loop {
            tokio::select! {
                biased;
                _ = self.stop.recv() => break,
                next = self.queue.recv() => match next {
                    Some(record) => self.deliver(&record).await,
                    None => break,
                },
            }
        }

        self.state.store(ProviderState::Draining as u8, Ordering::Release);
        let drain_timeout = self.drain_timeout;
        let drained = tokio::time::timeout(drain_timeout, self.drain()).await;
        if drained.is_err() {
            tracing::warn!(
                sink = sink_name,
                timeout_ms = drain_timeout.as_millis() as u64,
                "Drain timed out, discarding remaining records"
            );
        }

        self.state.store(ProviderState::Stopped as u8, Ordering::Release);
        self.queue.close();
        let mut discarded = 0u64;
        while self.queue.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            metrics::record_dropped(sink_name, discarded);
        }

        tracing::debug!(sink = sink_name, discarded, "Dispatch worker stopped");
    }

    async fn drain(&mut self) {
        while let Ok(record) = self.queue.try_recv() {
            self.deliver(&record).await;
        }
    }

    async fn deliver(&self, record: &LogRecord) {
        let sink_name = self.sink.name();
        if self.sink.ignores(record.category()) {
            return;
        }

        let outcome = AssertUnwindSafe(self.sink.dispatch(record)).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => metrics::record_dispatched(sink_name),
            Ok(Err(error)) => {
                metrics::record_dispatch_failure(sink_name, reason(&error));
                self.report(&error);
            }
            Err(payload) => {
                metrics::record_dispatch_failure(sink_name, "panic");
                let exception = ExceptionInfo::from_panic(payload.as_ref());
                self.terminal
                    .report(sink_name, LogLevel::Error, "Fail to logging", Some(&exception));
            }
        }
    }

    fn report(&self, error: &SinkError) {
        let sink_name = self.sink.name();
        match error {
            SinkError::Rejected { body, .. } => {
                self.terminal.report(sink_name, LogLevel::Error, body, None);
            }
            SinkError::Transport(e) => {
                let exception = ExceptionInfo::from_error(e);
                self.terminal
                    .report(sink_name, LogLevel::Error, &error.to_string(), Some(&exception));
            }
            SinkError::Encode(e) => {
                let exception = ExceptionInfo::from_error(e);
                self.terminal
                    .report(sink_name, LogLevel::Error, &error.to_string(), Some(&exception));
            }
        }
    }
}

fn reason(error: &SinkError) -> &'static str {
    match error {
        SinkError::Transport(_) => "transport",
        SinkError::Rejected { .. } => "rejected",
        SinkError::Encode(_) => "encode",
    }
}
