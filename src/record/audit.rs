//! Request/response projections used to build audit records.
//!
//! These live only for the duration of one log call: the logger renders
//! their summary line and copies their fields into record scopes, then
//! drops them.

use chrono::{DateTime, Utc};
use std::net::SocketAddr;

use crate::record::entry::LogRecordBuilder;
use crate::record::exception::ExceptionInfo;

/// Which extension point produced the audit info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Http,
    Rpc,
}

/// Request side of an exchange.
#[derive(Debug, Clone)]
pub struct AuditRequestInfo {
    pub channel: Channel,
    pub trace_id: String,
    pub date: DateTime<Utc>,
    pub scheme: String,
    /// HTTP verb, or `"RPC"`.
    pub method: String,
    /// Request path, or the RPC method name.
    pub path: String,
    pub host: String,
    pub query_string: Option<String>,
    /// Duplicate header names are merged, values joined with `,`.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub client_certificate: Option<String>,
    pub local_address: Option<SocketAddr>,
    pub remote_address: Option<SocketAddr>,
}

impl AuditRequestInfo {
    pub fn new(channel: Channel, trace_id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            channel,
            trace_id: trace_id.into(),
            date: Utc::now(),
            scheme: "http".to_string(),
            method: method.into(),
            path: path.into(),
            host: String::new(),
            query_string: None,
            headers: Vec::new(),
            body: None,
            client_certificate: None,
            local_address: None,
            remote_address: None,
        }
    }

    /// Path plus query string.
    pub fn raw_url(&self) -> String {
        match self.query_string.as_deref() {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query.trim_start_matches('?')),
            _ => self.path.clone(),
        }
    }

    /// Rendered record text.
    pub fn summary(&self, include_body: bool) -> String {
        match self.channel {
            Channel::Http if include_body => format!(
                "{}(request): {} {} => {}",
                self.trace_id,
                self.method,
                self.raw_url(),
                self.body.as_deref().unwrap_or("{}")
            ),
            Channel::Http => format!("{}(request): {} {}", self.trace_id, self.method, self.raw_url()),
            Channel::Rpc => format!("REQUEST: {} {}", self.method, self.raw_url()),
        }
    }

    /// Copy fields into record scopes. The body is skipped when `text`
    /// already contains it verbatim.
    pub fn write_scopes(&self, builder: &mut LogRecordBuilder, text: &str) {
        builder
            .scope("TraceId", self.trace_id.as_str())
            .scope("Date", format_date(self.date))
            .scope("Scheme", self.scheme.as_str());
        write_headers(builder, &self.headers);
        builder
            .scope("Method", self.method.as_str())
            .scope("Host", self.host.as_str());
        if let Some(query) = self.query_string.as_deref().filter(|q| !q.trim().is_empty()) {
            builder.scope("QueryString", query);
        }
        builder
            .scope("ClientCertificate", self.client_certificate.clone().unwrap_or_default())
            .scope("LocalIpAddress", ip_of(self.local_address))
            .scope("LocalPort", port_of(self.local_address))
            .scope("RemoteIpAddress", ip_of(self.remote_address))
            .scope("RemotePort", port_of(self.remote_address))
            .scope("RawUrl", self.raw_url());
        if let Some(body) = distinct_body(self.body.as_deref(), text) {
            builder.scope("Body", body);
        }
    }
}

/// Response side of an exchange.
#[derive(Debug, Clone)]
pub struct AuditResponseInfo {
    pub channel: Channel,
    pub trace_id: String,
    pub date: DateTime<Utc>,
    pub status_code: i32,
    pub status_name: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub exception: Option<ExceptionInfo>,
}

impl AuditResponseInfo {
    pub fn new(channel: Channel, trace_id: impl Into<String>, status_code: i32, status_name: impl Into<String>) -> Self {
        Self {
            channel,
            trace_id: trace_id.into(),
            date: Utc::now(),
            status_code,
            status_name: status_name.into(),
            headers: Vec::new(),
            body: None,
            exception: None,
        }
    }

    pub fn summary(&self, include_body: bool) -> String {
        match self.channel {
            Channel::Http if include_body => format!(
                "{}(response): {}-{} => {}",
                self.trace_id,
                self.status_code,
                self.status_name,
                self.body.as_deref().unwrap_or("{}")
            ),
            Channel::Http => format!("{}(response): {}-{}", self.trace_id, self.status_code, self.status_name),
            Channel::Rpc => match &self.exception {
                Some(exception) => format!(
                    "RESPONSE: {}:{} - {}",
                    self.status_code,
                    self.status_name,
                    exception.message()
                ),
                None => format!("RESPONSE: {}:{}", self.status_code, self.status_name),
            },
        }
    }

    pub fn write_scopes(&self, builder: &mut LogRecordBuilder, text: &str) {
        builder
            .scope("TraceId", self.trace_id.as_str())
            .scope("StatusCode", self.status_code.to_string())
            .scope("Date", format_date(self.date));
        write_headers(builder, &self.headers);
        if let Some(body) = distinct_body(self.body.as_deref(), text) {
            builder.scope("Body", body);
        }
    }
}

/// Merge header pairs, joining repeated names with `,`.
pub fn merge_headers<I, K, V>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut merged: Vec<(String, String)> = Vec::new();
    for (name, value) in pairs {
        let name = name.into();
        let value = value.into();
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => {
                entry.1.push(',');
                entry.1.push_str(&value);
            }
            None => merged.push((name, value)),
        }
    }
    merged
}

fn write_headers(builder: &mut LogRecordBuilder, headers: &[(String, String)]) {
    for (name, value) in headers {
        builder.scope(format!("Headers.{name}"), value.as_str());
    }
}

fn distinct_body<'a>(body: Option<&'a str>, text: &str) -> Option<&'a str> {
    body.filter(|b| !b.trim().is_empty() && !text.contains(*b))
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%SZ").to_string()
}

fn ip_of(addr: Option<SocketAddr>) -> String {
    addr.map(|a| a.ip().to_string()).unwrap_or_default()
}

fn port_of(addr: Option<SocketAddr>) -> String {
    addr.map(|a| a.port().to_string()).unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LogLevel, LogRecord};

    fn request() -> AuditRequestInfo {
        let mut info = AuditRequestInfo::new(Channel::Http, "trace-1", "POST", "/orders");
        info.query_string = Some("?page=2".to_string());
        info.body = Some(r#"{"x":1}"#.to_string());
        info
    }

    #[test]
    fn test_request_summary_includes_body() {
        assert_eq!(
            request().summary(true),
            r#"trace-1(request): POST /orders?page=2 => {"x":1}"#
        );
    }

    #[test]
    fn test_body_scope_suppressed_when_duplicated_in_text() {
        let info = request();
        let text = info.summary(true);
        let mut builder = LogRecord::builder("audit", LogLevel::Info);
        info.write_scopes(&mut builder, &text);
        let record = builder.build();
        assert_eq!(record.scope("Body"), None);
        assert_eq!(record.scope("RawUrl"), Some("/orders?page=2"));
        assert_eq!(record.scope("QueryString"), Some("?page=2"));
    }

    #[test]
    fn test_body_scope_kept_when_text_omits_it() {
        let info = request();
        let text = info.summary(false);
        let mut builder = LogRecord::builder("audit", LogLevel::Info);
        info.write_scopes(&mut builder, &text);
        assert_eq!(builder.build().scope("Body"), Some(r#"{"x":1}"#));
    }

    #[test]
    fn test_merge_headers_concatenates_duplicates() {
        let merged = merge_headers([("accept", "a"), ("x-id", "1"), ("Accept", "b")]);
        assert_eq!(
            merged,
            vec![
                ("accept".to_string(), "a,b".to_string()),
                ("x-id".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn test_rpc_response_summary_with_fault() {
        let mut info = AuditResponseInfo::new(Channel::Rpc, "t", 13, "Internal");
        info.exception = Some(ExceptionInfo::new("io", "disk gone"));
        assert_eq!(info.summary(true), "RESPONSE: 13:Internal - disk gone");
    }
}
