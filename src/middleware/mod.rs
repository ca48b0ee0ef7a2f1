//! Body-capture middleware.
//!
//! # Data Flow
//! ```text
//! HTTP (axum from_fn_with_state):
//!     request → ignored? ─yes→ next.run (no records)
//!             → install ScopeStack {TraceId, RequestPath} + identity
//!             → body.rs: buffer + replay request body (or sentinel)
//!             → redact → request record
//!             → next.run (panics caught, UnhandledFault detected)
//!             → body.rs: buffer textual response (or sentinel)
//!             → redact → response record
//!             → fault? generic 500 JSON + one error record
//!
//! RPC (RpcInterceptor::unary):
//!     Debug(request) → redact → request record
//!     → handler → Debug(response) | fault → response record
//!     → domain status passed through, anything else → internal status
//! ```
//!
//! # Design Decisions
//! - Options and policy are read once per call from `AuditControls`
//! - Logging failures never change the status the caller sees
//! - Bodies larger than `max_capture_bytes` are never buffered

pub mod audit;
pub mod body;
pub mod http;
pub mod rpc;

pub use audit::AuditControls;
pub use body::{ContentClass, BINARY_BODY, MULTIPART_BODY};
pub use http::{
    audit_middleware, AuditState, AuthenticatedSubject, ClientCertificate, GenericErrorResponse,
    LocalAddr, UnhandledFault, REQUEST_ID_HEADER,
};
pub use rpc::{RpcCallContext, RpcCode, RpcFault, RpcInterceptor, RpcStatus, RPC_VERB};
