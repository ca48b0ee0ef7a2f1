//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use traffic_audit::config::AuditConfig;
use traffic_audit::record::{LogLevel, LogRecord};
use traffic_audit::sinks::{Sink, SinkError, Terminal};
use traffic_audit::Pipeline;

/// Sink that keeps every record it receives.
#[derive(Default)]
pub struct Recording {
    records: Mutex<Vec<LogRecord>>,
}

impl Recording {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn is_enabled(&self, _level: LogLevel) -> bool {
        true
    }

    async fn dispatch(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Pipeline with a recording sink and a captured, uncoloured console.
pub fn recording_pipeline(config: &AuditConfig) -> (Pipeline, Arc<Recording>, Terminal) {
    let recording = Arc::new(Recording::default());
    let terminal = Terminal::captured();
    let pipeline = Pipeline::builder(config)
        .terminal(terminal.clone())
        .sink(recording.clone())
        .build();
    (pipeline, recording, terminal)
}

/// One request received by the mock collector.
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl Received {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone, Default)]
struct CollectorState {
    received: Arc<Mutex<Vec<Received>>>,
    status: Arc<AtomicU16>,
}

/// HTTP collector accepting any POST and answering with a configurable
/// status.
pub struct MockCollector {
    addr: SocketAddr,
    state: CollectorState,
}

impl MockCollector {
    pub async fn start() -> Self {
        let state = CollectorState::default();
        state.status.store(201, Ordering::SeqCst);

        let app = Router::new()
            .route("/{*path}", post(collect))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn respond_with(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().unwrap().clone()
    }

    /// Wait until at least `count` requests arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<Received> {
        for _ in 0..200 {
            let received = self.received();
            if received.len() >= count {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.received()
    }
}

async fn collect(State(state): State<CollectorState>, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    state.received.lock().unwrap().push(Received {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    let status = state.status.load(Ordering::SeqCst);
    StatusCode::from_u16(status).unwrap_or(StatusCode::OK)
}
