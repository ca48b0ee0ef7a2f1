//! Log record model.
//!
//! # Data Flow
//! ```text
//! call site (logger / middleware)
//!     → LogRecordBuilder (text, event id, exception, scopes, identity)
//!     → LogRecord (immutable)
//!     → Arc<LogRecord> handed to every enabled provider queue
//!     → sink formats + transports, then drops its reference
//! ```
//!
//! # Design Decisions
//! - Timestamp is taken when the builder is created, never at dispatch
//! - Exceptions are snapshots (`ExceptionInfo`), not live error handles
//! - Audit projections (`AuditRequestInfo`, `AuditResponseInfo`) are
//!   transient and never queued

pub mod audit;
pub mod entry;
pub mod event;
pub mod exception;
pub mod level;

pub use audit::{AuditRequestInfo, AuditResponseInfo, Channel};
pub use entry::{Identity, LogRecord, LogRecordBuilder};
pub use event::{EventId, INTERCEPTOR_EVENT, MIDDLEWARE_EVENT};
pub use exception::{serialize_error_sentinel, ExceptionInfo};
pub use level::LogLevel;
