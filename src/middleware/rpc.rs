//! Unary RPC interceptor.
//!
//! # Responsibilities
//! - Record the request before the handler runs and the response after
//! - Capture request and response through their `Debug` representation
//! - Pass domain faults ([`RpcFault::Status`]) through unchanged
//! - Wrap every other fault, panics included, into an internal status that
//!   carries only the root-cause message
//!
//! Ignore and redaction rules match on verb `RPC` and the method name.

use futures_util::FutureExt;
use std::error::Error;
use std::fmt::{self, Debug};
use std::future::Future;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};

use crate::logger::Logger;
use crate::middleware::audit::AuditControls;
use crate::record::{
    serialize_error_sentinel, AuditRequestInfo, AuditResponseInfo, Channel, ExceptionInfo, Identity,
    INTERCEPTOR_EVENT,
};
use crate::scope::{self, ScopeFrame, ScopeStack};

/// Verb used for RPC calls in ignore and security rules.
pub const RPC_VERB: &str = "RPC";

/// Canonical RPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl RpcCode {
    pub fn name(self) -> &'static str {
        match self {
            RpcCode::Ok => "OK",
            RpcCode::Cancelled => "Cancelled",
            RpcCode::Unknown => "Unknown",
            RpcCode::InvalidArgument => "InvalidArgument",
            RpcCode::DeadlineExceeded => "DeadlineExceeded",
            RpcCode::NotFound => "NotFound",
            RpcCode::AlreadyExists => "AlreadyExists",
            RpcCode::PermissionDenied => "PermissionDenied",
            RpcCode::ResourceExhausted => "ResourceExhausted",
            RpcCode::FailedPrecondition => "FailedPrecondition",
            RpcCode::Aborted => "Aborted",
            RpcCode::OutOfRange => "OutOfRange",
            RpcCode::Unimplemented => "Unimplemented",
            RpcCode::Internal => "Internal",
            RpcCode::Unavailable => "Unavailable",
            RpcCode::DataLoss => "DataLoss",
            RpcCode::Unauthenticated => "Unauthenticated",
        }
    }

    pub fn value(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RPC-level status returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status: {code}, detail: {detail}")]
pub struct RpcStatus {
    pub code: RpcCode,
    pub detail: String,
}

impl RpcStatus {
    pub fn new(code: RpcCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, detail)
    }
}

/// Failure returned by an RPC handler.
#[derive(Debug)]
pub enum RpcFault {
    /// Well-formed fault; returned to the caller as is.
    Status(RpcStatus),
    /// Anything else; hidden behind an internal status.
    Internal(Box<dyn Error + Send + Sync>),
}

impl From<RpcStatus> for RpcFault {
    fn from(status: RpcStatus) -> Self {
        RpcFault::Status(status)
    }
}

/// Per-call metadata supplied by the RPC server.
#[derive(Debug, Clone, Default)]
pub struct RpcCallContext {
    /// Fully qualified method, e.g. `/orders.Orders/Get`.
    pub method: String,
    pub host: String,
    pub trace_id: String,
    pub scheme: String,
    pub headers: Vec<(String, String)>,
    pub trailers: Vec<(String, String)>,
    pub client_certificate: Option<String>,
    pub local_address: Option<SocketAddr>,
    pub remote_address: Option<SocketAddr>,
    pub identity: Option<Identity>,
}

impl RpcCallContext {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
            scheme: "http".to_string(),
            ..Default::default()
        }
    }
}

/// Wraps unary handlers with request/response audit records.
#[derive(Clone)]
pub struct RpcInterceptor {
    logger: Logger,
    controls: AuditControls,
}

impl RpcInterceptor {
    pub fn new(logger: Logger, controls: AuditControls) -> Self {
        Self { logger, controls }
    }

    pub async fn unary<Req, Resp, F, Fut>(&self, ctx: RpcCallContext, request: Req, handler: F) -> Result<Resp, RpcStatus>
    where
        Req: Debug,
        Resp: Debug,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Resp, RpcFault>>,
    {
        let policy = self.controls.policy();
        if policy.is_ignored(RPC_VERB, &ctx.method) {
            return match invoke(handler, request).await {
                Ok(response) => Ok(response),
                Err((status, _)) => Err(status),
            };
        }

        let options = self.controls.options();
        let stack = ScopeStack::with_identity(ctx.identity.clone());
        let _frame = stack.push(ScopeFrame::properties([
            ("TraceId", ctx.trace_id.clone()),
            ("RpcMethod", ctx.method.clone()),
        ]));

        scope::scoped(stack, async {
            if options.log_request {
                let body = policy.apply_redaction(RPC_VERB, &ctx.method, Some(describe(&request)));
                let mut info = AuditRequestInfo::new(Channel::Rpc, &ctx.trace_id, RPC_VERB, &ctx.method);
                info.scheme = ctx.scheme.clone();
                info.host = ctx.host.clone();
                info.headers = ctx.headers.clone();
                info.body = body;
                info.client_certificate = ctx.client_certificate.clone();
                info.local_address = ctx.local_address;
                info.remote_address = ctx.remote_address;
                self.logger
                    .audit_request(INTERCEPTOR_EVENT, info, options.summary_includes_body);
            }

            let outcome = invoke(handler, request).await;

            if options.log_response {
                let (code, body, exception) = match &outcome {
                    Ok(response) => (RpcCode::Ok, Some(describe(response)), None),
                    Err((status, exception)) => (status.code, None, Some(exception.clone())),
                };
                let mut info = AuditResponseInfo::new(Channel::Rpc, &ctx.trace_id, code.value(), code.name());
                info.headers = ctx.trailers.clone();
                info.body = policy.apply_redaction(RPC_VERB, &ctx.method, body);
                info.exception = exception;
                self.logger
                    .audit_response(INTERCEPTOR_EVENT, info, options.summary_includes_body);
            }

            outcome.map_err(|(status, _)| status)
        })
        .await
    }
}

/// Run the handler, converting every failure shape into the status the
/// caller sees plus the exception to record.
async fn invoke<Req, Resp, F, Fut>(handler: F, request: Req) -> Result<Resp, (RpcStatus, ExceptionInfo)>
where
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, RpcFault>>,
{
    let outcome = AssertUnwindSafe(async move { handler(request).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(RpcFault::Status(status))) => {
            let exception = ExceptionInfo::new(std::any::type_name::<RpcStatus>(), status.detail.clone());
            Err((status, exception))
        }
        Ok(Err(RpcFault::Internal(error))) => {
            let root = ExceptionInfo::from_dyn(&*error).root().clone();
            Err((RpcStatus::internal(root.message()), root))
        }
        Err(payload) => {
            let exception = ExceptionInfo::from_panic(payload.as_ref());
            Err((RpcStatus::internal(exception.message()), exception))
        }
    }
}

/// `Debug` text of a message; a panicking `Debug` impl yields the sentinel.
fn describe<T: Debug>(value: &T) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| format!("{value:?}")))
        .unwrap_or_else(|_| serialize_error_sentinel(std::any::type_name::<T>()))
}
