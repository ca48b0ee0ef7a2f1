//! Category logger.

use serde_json::Value;
use std::sync::Arc;

use crate::logger::Pipeline;
use crate::record::{
    AuditRequestInfo, AuditResponseInfo, EventId, ExceptionInfo, LogLevel, LogRecord,
    LogRecordBuilder,
};
use crate::scope::{self, render_value, ScopeFrame, ScopeGuard};

/// Payload of one log call.
#[derive(Debug, Clone)]
pub enum LogState {
    Message(String),
    /// Message plus key/value properties stored as record scopes.
    Structured {
        message: String,
        properties: Vec<(String, Value)>,
    },
    Request {
        info: AuditRequestInfo,
        include_body: bool,
    },
    Response {
        info: AuditResponseInfo,
        include_body: bool,
    },
}

impl From<String> for LogState {
    fn from(message: String) -> Self {
        LogState::Message(message)
    }
}

impl From<&str> for LogState {
    fn from(message: &str) -> Self {
        LogState::Message(message.to_string())
    }
}

/// Emits records for one category through a shared [`Pipeline`].
#[derive(Clone)]
pub struct Logger {
    category: Arc<str>,
    pipeline: Pipeline,
}

impl Logger {
    pub(crate) fn new(category: String, pipeline: Pipeline) -> Self {
        Self {
            category: category.into(),
            pipeline,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// True when at least one provider would accept `level`.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.pipeline
            .inner
            .providers
            .iter()
            .any(|provider| provider.is_enabled(level))
    }

    /// Build one record and queue it on every provider enabled for `level`.
    pub fn log(&self, level: LogLevel, event_id: EventId, state: LogState, exception: Option<ExceptionInfo>) {
        if !self.is_enabled(level) {
            return;
        }

        let record = Arc::new(self.build(level, event_id, state, exception));
        for provider in &self.pipeline.inner.providers {
            if provider.is_enabled(level) {
                provider.enqueue(record.clone());
            }
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, EventId::default(), LogState::Message(message.into()), None);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, EventId::default(), LogState::Message(message.into()), None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, EventId::default(), LogState::Message(message.into()), None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, EventId::default(), LogState::Message(message.into()), None);
    }

    pub fn error(&self, message: impl Into<String>, exception: Option<ExceptionInfo>) {
        self.log(LogLevel::Error, EventId::default(), LogState::Message(message.into()), exception);
    }

    pub fn critical(&self, message: impl Into<String>, exception: Option<ExceptionInfo>) {
        self.log(LogLevel::Critical, EventId::default(), LogState::Message(message.into()), exception);
    }

    /// Info-level record for an inbound request.
    pub fn audit_request(&self, event_id: EventId, info: AuditRequestInfo, include_body: bool) {
        self.log(LogLevel::Info, event_id, LogState::Request { info, include_body }, None);
    }

    /// Response record; error level when the response carries an exception.
    pub fn audit_response(&self, event_id: EventId, info: AuditResponseInfo, include_body: bool) {
        let exception = info.exception.clone();
        let level = if exception.is_some() { LogLevel::Error } else { LogLevel::Info };
        self.log(level, event_id, LogState::Response { info, include_body }, exception);
    }

    /// Push a frame on the current task's scope stack. `None` outside an
    /// installed stack.
    #[must_use = "the scope ends when the guard is dropped"]
    pub fn begin_scope(&self, frame: ScopeFrame) -> Option<ScopeGuard> {
        scope::push(frame)
    }

    fn build(&self, level: LogLevel, event_id: EventId, state: LogState, exception: Option<ExceptionInfo>) -> LogRecord {
        let mut builder = LogRecord::builder(self.category.as_ref(), level);
        builder.event_id(event_id);

        match state {
            LogState::Message(message) => {
                builder.text(message);
            }
            LogState::Structured { message, properties } => {
                builder.text(message);
                for (key, value) in &properties {
                    builder.scope(key.as_str(), render_value(value));
                }
            }
            LogState::Request { info, include_body } => {
                let text = info.summary(include_body);
                info.write_scopes(&mut builder, &text);
                builder.text(text);
            }
            LogState::Response { info, include_body } => {
                let text = info.summary(include_body);
                info.write_scopes(&mut builder, &text);
                builder.text(text);
            }
        }

        if let Some(exception) = exception {
            builder.exception(exception);
        }

        if let Some(stack) = scope::current() {
            write_ambient_scopes(&mut builder, &stack);
            if let Some(identity) = stack.identity() {
                builder.identity(identity);
            }
        }

        let application = self.pipeline.inner.application.load();
        let app_scopes = [
            ("ApplicationName", &application.name),
            ("ApplicationVersion", &application.version),
            ("Environment", &application.environment),
        ];
        for (key, value) in app_scopes {
            if let Some(value) = value.as_deref() {
                builder.scope(key, value);
            }
        }

        builder.build()
    }
}

fn write_ambient_scopes(builder: &mut LogRecordBuilder, stack: &scope::ScopeStack) {
    let mut labels = Vec::new();
    stack.for_each_active(|frame| match frame {
        ScopeFrame::Label(label) => labels.push(label.clone()),
        ScopeFrame::Properties(properties) => {
            for (key, value) in properties {
                builder.scope(key.as_str(), render_value(value));
            }
        }
    });
    if !labels.is_empty() {
        builder.scope("Scope", labels.join(" => "));
    }
}
