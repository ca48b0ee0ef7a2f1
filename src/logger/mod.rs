//! Logger facade.
//!
//! # Data Flow
//! ```text
//! Pipeline::from_config
//!     → ConsoleSink / IndexCollectorSink / EventCollectorSink (+ host sinks)
//!     → one SinkProvider per sink
//!
//! Logger::log(level, event, state, exception)
//!     → level gate (any provider enabled?)
//!     → LogRecordBuilder: state text + scopes, ambient scope frames,
//!       identity, application identity
//!     → Arc<LogRecord> enqueued on every enabled provider
//! ```
//!
//! # Design Decisions
//! - Loggers are cheap clones; no per-category cache
//! - Scope frames come from the task-local stack, so emitters never pass
//!   context explicitly

mod facade;
mod pipeline;

pub use facade::{LogState, Logger};
pub use pipeline::{Pipeline, PipelineBuilder};
