//! Log sinks.
//!
//! # Data Flow
//! ```text
//! SinkProvider worker
//!     → Sink::ignores(category)? skip
//!     → Sink::dispatch(&LogRecord)
//!         console.rs → terminal.rs → stdout
//!         index.rs   → POST {uri}/{index}/_doc      (camelCase JSON)
//!         event.rs   → POST {uri}/api/events/raw?clef (CLEF JSON)
//!     → Err(SinkError) reported once on the terminal by the worker
//! ```
//!
//! # Design Decisions
//! - Sinks are trait objects; adding a collector does not touch dispatch
//! - Settings live in `ArcSwap` and are replaced without restarting workers
//! - A misconfigured remote sink disables itself instead of failing startup
//! - No retries; delivery is best-effort

pub mod console;
pub mod event;
pub mod index;
pub mod terminal;

pub use console::ConsoleSink;
pub use event::{to_clef, EventCollectorSink};
pub use index::IndexCollectorSink;
pub use terminal::{Terminal, TerminalEntry, MARGIN};

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{LogLevel, LogRecord};

/// Failure of a single dispatch.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collector rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for log records.
///
/// Implementations own their formatting and transport. A sink is driven by
/// exactly one worker, so `dispatch` is never called concurrently on the
/// same provider.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Name used when reporting failures on the console.
    fn name(&self) -> &'static str;

    /// Level gate for this sink.
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Categories this sink never writes.
    fn ignores(&self, _category: &str) -> bool {
        false
    }

    async fn dispatch(&self, record: &LogRecord) -> Result<(), SinkError>;
}
