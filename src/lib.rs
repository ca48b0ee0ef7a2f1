//! Traffic audit pipeline.
//!
//! Captures HTTP and RPC traffic plus application logs as structured
//! records and dispatches them, off the request path, to a console, a
//! document-index collector and a structured-event collector.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                   TRAFFIC AUDIT                      │
//!                    │                                                      │
//!   HTTP request     │  ┌────────────┐   ┌────────┐   ┌──────────────┐      │
//!   ─────────────────┼─▶│ middleware │──▶│ policy │──▶│   logger     │      │
//!   RPC call         │  │ http / rpc │   │ignore/ │   │ facade +     │      │
//!   ─────────────────┼─▶│ + body     │   │redact  │   │ pipeline     │      │
//!                    │  └─────┬──────┘   └────────┘   └──────┬───────┘      │
//!                    │        │ scope (task-local)           │ Arc<record>  │
//!                    │        ▼                              ▼              │
//!                    │  ┌────────────┐               ┌──────────────┐       │
//!                    │  │   record   │               │   dispatch   │       │
//!                    │  │ model      │               │ provider per │       │
//!                    │  └────────────┘               │ sink + worker│       │
//!                    │                               └──────┬───────┘       │
//!                    │                                      ▼               │
//!                    │                ┌─────────┬───────────┬──────────┐    │
//!                    │                │ console │  index    │  event   │────┼──▶ collectors
//!                    │                │ (stdout)│ collector │ collector│    │
//!                    │                └─────────┴───────────┴──────────┘    │
//!                    │                                                      │
//!                    │  ┌────────────────────────────────────────────────┐  │
//!                    │  │ config (TOML + hot reload) · lifecycle ·       │  │
//!                    │  │ observability (tracing + metrics)              │  │
//!                    │  └────────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

// Data model
pub mod record;
pub mod scope;

// Pipeline
pub mod dispatch;
pub mod logger;
pub mod sinks;

// Capture
pub mod middleware;
pub mod policy;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AuditConfig;
pub use lifecycle::Shutdown;
pub use logger::{LogState, Logger, Pipeline};
pub use middleware::{audit_middleware, AuditControls, AuditState, RpcInterceptor};
pub use record::{ExceptionInfo, LogLevel, LogRecord};
