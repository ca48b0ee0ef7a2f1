//! Body buffering and content classification.
//!
//! # Responsibilities
//! - Read a request body once and hand identical bytes downstream
//! - Buffer textual response bodies and rebuild the response around them
//! - Substitute sentinels for content that is never buffered
//!
//! # Design Decisions
//! - Bodies above `max_capture_bytes` are never buffered past the limit;
//!   a streamed body that outgrows it is forwarded as prefix + remainder
//! - Binary and unknown response types stream through untouched
//! - Text is decoded lossily; invalid UTF-8 never fails the request

use axum::body::{to_bytes, Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use futures_util::stream::{self, StreamExt};

pub const MULTIPART_BODY: &str = "*** MULTIPART/FORM-DATA ***";
pub const BINARY_BODY: &str = "*** BINARY CONTENT ***";

pub fn too_large(length: usize) -> String {
    format!("*** BODY TOO LARGE ({length} bytes) ***")
}

/// Sentinel for a body without `Content-Length` that outgrew the limit.
pub fn too_large_stream(limit: usize) -> String {
    format!("*** BODY TOO LARGE (over {limit} bytes) ***")
}

/// How a body may be captured, by its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// `application/json` or `text/plain`: buffered and recorded.
    Textual,
    Multipart,
    /// Any other declared type: streamed through, recorded as a sentinel.
    Binary,
    /// No content type.
    Unknown,
}

pub fn classify(headers: &HeaderMap) -> ContentClass {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return ContentClass::Unknown;
    };
    let content_type = content_type.trim().to_ascii_lowercase();
    if content_type.starts_with("multipart/form-data") {
        ContentClass::Multipart
    } else if content_type.starts_with("application/json") || content_type.starts_with("text/plain") {
        ContentClass::Textual
    } else {
        ContentClass::Binary
    }
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Capture the request body. Returns the body to forward and the text to
/// record.
pub async fn capture_request(headers: &HeaderMap, body: Body, max_bytes: usize) -> (Body, Option<String>) {
    let length = content_length(headers).unwrap_or(0);
    if length == 0 {
        return (body, None);
    }
    if classify(headers) == ContentClass::Multipart {
        return (body, Some(MULTIPART_BODY.to_string()));
    }
    if length > max_bytes {
        return (body, Some(too_large(length)));
    }

    match to_bytes(body, max_bytes).await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            (Body::from(bytes), Some(text))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body for audit");
            (Body::empty(), None)
        }
    }
}

/// Capture the response body. A textual body is buffered and the response
/// rebuilt with the same bytes; anything else is returned as is.
pub async fn capture_response(response: Response, max_bytes: usize) -> Result<(Response, Option<String>), axum::Error> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok((response, None));
    }

    match classify(response.headers()) {
        ContentClass::Unknown => Ok((response, None)),
        ContentClass::Binary | ContentClass::Multipart => Ok((response, Some(BINARY_BODY.to_string()))),
        ContentClass::Textual => {
            if let Some(length) = content_length(response.headers()).filter(|l| *l > max_bytes) {
                return Ok((response, Some(too_large(length))));
            }

            let (parts, body) = response.into_parts();
            match read_prefix(body, max_bytes).await? {
                Prefix::Complete(bytes) => {
                    let text = if bytes.iter().all(u8::is_ascii_whitespace) {
                        None
                    } else {
                        Some(String::from_utf8_lossy(&bytes).into_owned())
                    };
                    Ok((Response::from_parts(parts, Body::from(bytes)), text))
                }
                Prefix::Exceeded(body) => Ok((Response::from_parts(parts, body), Some(too_large_stream(max_bytes)))),
            }
        }
    }
}

enum Prefix {
    /// The whole body, within the limit.
    Complete(Bytes),
    /// Over the limit; the read prefix chained with the rest of the stream.
    Exceeded(Body),
}

/// Read frames until the body ends or more than `max_bytes` are buffered.
async fn read_prefix(body: Body, max_bytes: usize) -> Result<Prefix, axum::Error> {
    let mut stream = body.into_data_stream();
    let mut buffered = Vec::new();

    while buffered.len() <= max_bytes {
        match stream.next().await {
            Some(chunk) => buffered.extend_from_slice(&chunk?),
            None => return Ok(Prefix::Complete(Bytes::from(buffered))),
        }
    }

    let prefix = stream::iter([Ok::<_, axum::Error>(Bytes::from(buffered))]);
    Ok(Prefix::Exceeded(Body::from_stream(prefix.chain(stream))))
}
