//! HTTP audit middleware.
//!
//! # Responsibilities
//! - Skip ignored actions entirely
//! - Install a per-request scope stack (identity, trace id, path)
//! - Capture, redact and record the request, then the response
//! - Turn handler panics and [`UnhandledFault`] responses into the generic
//!   500 JSON body with exactly one error record
//!
//! Mount with `axum::middleware::from_fn_with_state(state, audit_middleware)`.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use serde::Serialize;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;

use crate::config::MiddlewareConfig;
use crate::logger::Logger;
use crate::middleware::audit::AuditControls;
use crate::middleware::body::{capture_request, capture_response};
use crate::policy::ActionPolicy;
use crate::record::audit::merge_headers;
use crate::record::{
    AuditRequestInfo, AuditResponseInfo, Channel, ExceptionInfo, Identity, MIDDLEWARE_EVENT,
};
use crate::scope::{self, ScopeFrame, ScopeStack};

/// Header carrying the trace id, set by `SetRequestIdLayer` upstream.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State for [`audit_middleware`].
#[derive(Clone)]
pub struct AuditState {
    pub logger: Logger,
    pub controls: AuditControls,
}

impl AuditState {
    pub fn new(logger: Logger, controls: AuditControls) -> Self {
        Self { logger, controls }
    }
}

/// Handler error the middleware converts into the generic 500 body.
///
/// Return it (or any response carrying it as an extension) from a handler.
#[derive(Debug, Clone)]
pub struct UnhandledFault(pub ExceptionInfo);

impl UnhandledFault {
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        Self(ExceptionInfo::from_error(error))
    }

    pub fn message(&self) -> &str {
        self.0.message()
    }
}

impl IntoResponse for UnhandledFault {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Authenticated subject set by an upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub String);

/// Client certificate presented on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub serial_number: String,
}

/// Local socket address of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalAddr(pub SocketAddr);

/// Body written on an unhandled fault.
#[derive(Debug, Clone, Serialize)]
pub struct GenericErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(rename = "tradeId")]
    pub trade_id: String,
}

pub async fn audit_middleware(State(state): State<AuditState>, request: Request, next: Next) -> Response {
    let options = state.controls.options();
    let policy = state.controls.policy();
    let method = request.method().as_str().to_uppercase();
    let path = request.uri().path().to_string();

    if policy.is_ignored(&method, &path) {
        return next.run(request).await;
    }

    let trace_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let stack = ScopeStack::with_identity(identity_of(&request));
    let _frame = stack.push(ScopeFrame::properties([
        ("TraceId", trace_id.clone()),
        ("RequestPath", path.clone()),
    ]));

    let exchange = Exchange {
        state: &state,
        options: &options,
        policy: &policy,
        trace_id,
        method,
        path,
    };
    scope::scoped(stack, exchange.run(request, next)).await
}

struct Exchange<'a> {
    state: &'a AuditState,
    options: &'a MiddlewareConfig,
    policy: &'a ActionPolicy,
    trace_id: String,
    method: String,
    path: String,
}

impl Exchange<'_> {
    async fn run(&self, request: Request, next: Next) -> Response {
        let (parts, body) = request.into_parts();
        let (body, captured) = capture_request(&parts.headers, body, self.options.max_capture_bytes).await;

        if self.options.log_request {
            let body = self.policy.apply_redaction(&self.method, &self.path, captured);
            let info = self.request_info(&parts, body);
            self.state
                .logger
                .audit_request(MIDDLEWARE_EVENT, info, self.options.summary_includes_body);
        }

        let request = Request::from_parts(parts, body);
        let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => return self.fault(ExceptionInfo::from_panic(payload.as_ref())),
        };

        if let Some(fault) = response.extensions().get::<UnhandledFault>() {
            let exception = fault.0.clone();
            return self.fault(exception);
        }

        let (response, captured) = match capture_response(response, self.options.max_capture_bytes).await {
            Ok(captured) => captured,
            Err(e) => return self.fault(ExceptionInfo::from_error(&e)),
        };

        if self.options.log_response {
            let body = self.policy.apply_redaction(&self.method, &self.path, captured);
            let info = self.response_info(&response, body, None);
            self.state
                .logger
                .audit_response(MIDDLEWARE_EVENT, info, self.options.summary_includes_body);
        }
        response
    }

    /// Generic 500 response plus one error record.
    fn fault(&self, exception: ExceptionInfo) -> Response {
        let payload = GenericErrorResponse {
            code: "500".to_string(),
            message: exception.message().to_string(),
            trade_id: self.trace_id.clone(),
        };
        let body = serde_json::to_string(&payload).unwrap_or_else(|_| {
            format!(r#"{{"code":"500","message":"","tradeId":"{}"}}"#, self.trace_id)
        });

        let response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response();

        if self.options.log_response {
            let info = self.response_info(&response, Some(body), Some(exception));
            self.state
                .logger
                .audit_response(MIDDLEWARE_EVENT, info, self.options.summary_includes_body);
        }
        response
    }

    fn request_info(&self, parts: &Parts, body: Option<String>) -> AuditRequestInfo {
        let mut info = AuditRequestInfo::new(Channel::Http, &self.trace_id, &self.method, &self.path);
        info.scheme = parts.uri.scheme_str().unwrap_or("http").to_string();
        info.host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();
        info.query_string = parts.uri.query().map(|q| format!("?{q}"));
        info.headers = merge_headers(
            parts
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())),
        );
        info.body = body;
        info.client_certificate = parts
            .extensions
            .get::<ClientCertificate>()
            .map(|c| c.serial_number.clone());
        info.local_address = parts.extensions.get::<LocalAddr>().map(|a| a.0);
        info.remote_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        info
    }

    fn response_info(&self, response: &Response, body: Option<String>, exception: Option<ExceptionInfo>) -> AuditResponseInfo {
        let status = response.status();
        let mut info = AuditResponseInfo::new(
            Channel::Http,
            &self.trace_id,
            i32::from(status.as_u16()),
            status.canonical_reason().unwrap_or("Unknown"),
        );
        info.headers = merge_headers(
            response
                .headers()
                .iter()
                .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())),
        );
        info.body = body;
        info.exception = exception;
        info
    }
}

/// Subject from [`AuthenticatedSubject`], token from the bearer header.
fn identity_of(request: &Request) -> Option<Identity> {
    let subject = request.extensions().get::<AuthenticatedSubject>()?;
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim().to_string())
        .unwrap_or_default();
    Some(Identity::new(subject.0.clone(), token))
}
