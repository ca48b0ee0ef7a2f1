//! Captured fault snapshots.
//!
//! # Responsibilities
//! - Snapshot an error (and its `source()` chain) at log time
//! - Snapshot a panic payload caught around a handler
//! - Never let a misbehaving `Display`/`Debug` impl escape the logging call
//!
//! # Design Decisions
//! - The snapshot owns plain strings; the originating error may be dropped
//!   right after the log call
//! - Formatting runs under `catch_unwind`; a panicking formatter yields the
//!   serialize-error sentinel instead

use serde::Serialize;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};

/// Sentinel stored when a value cannot be rendered to text.
pub fn serialize_error_sentinel(type_name: &str) -> String {
    format!("*** JSON SERIALIZE ERROR => TYPE: {type_name} ***")
}

/// Snapshot of a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    kind: String,
    message: String,
    stack_trace: String,
    source: String,
    native_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    inner: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    /// Build a snapshot from parts.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            source: source_of(&kind),
            kind,
            message: message.into(),
            stack_trace: String::new(),
            native_code: 0,
            inner: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_native_code(mut self, code: i32) -> Self {
        self.native_code = code;
        self
    }

    pub fn with_inner(mut self, inner: ExceptionInfo) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    /// Capture a typed error, its source chain and (if enabled) a backtrace.
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut info = Self::capture(std::any::type_name::<E>(), error);
        info.stack_trace = capture_backtrace();
        info
    }

    /// Capture a type-erased error and its source chain.
    pub fn from_dyn(error: &(dyn Error + 'static)) -> Self {
        let kind = dyn_type_name(error);
        let mut info = Self::capture(&kind, error);
        info.stack_trace = capture_backtrace();
        info
    }

    /// Capture a panic payload returned by `catch_unwind`.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Self::new("panic", message).with_stack_trace(capture_backtrace())
    }

    fn capture(kind: &str, error: &(dyn Error + 'static)) -> Self {
        let message = guarded(kind, || error.to_string());
        let native_code = error
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::raw_os_error)
            .unwrap_or(0);
        let inner = error.source().map(|source| {
            let kind = dyn_type_name(source);
            Box::new(Self::capture(&kind, source))
        });

        Self {
            source: source_of(kind),
            kind: kind.to_string(),
            message,
            stack_trace: String::new(),
            native_code,
            inner,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn native_code(&self) -> i32 {
        self.native_code
    }

    pub fn inner(&self) -> Option<&ExceptionInfo> {
        self.inner.as_deref()
    }

    /// Innermost snapshot of the chain (the root cause).
    pub fn root(&self) -> &ExceptionInfo {
        let mut current = self;
        while let Some(inner) = current.inner() {
            current = inner;
        }
        current
    }
}

fn guarded(kind: &str, render: impl FnOnce() -> String) -> String {
    panic::catch_unwind(AssertUnwindSafe(render)).unwrap_or_else(|_| serialize_error_sentinel(kind))
}

/// Best-effort type name for a type-erased error, taken from its `Debug` output.
fn dyn_type_name(error: &(dyn Error + 'static)) -> String {
    if error.is::<std::io::Error>() {
        return "std::io::Error".to_string();
    }
    let debug = guarded("dyn std::error::Error", || format!("{error:?}"));
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if name.is_empty() {
        "dyn std::error::Error".to_string()
    } else {
        name
    }
}

fn source_of(kind: &str) -> String {
    kind.split("::").next().unwrap_or(kind).to_string()
}

fn capture_backtrace() -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => backtrace.to_string(),
        _ => String::new(),
    }
}
