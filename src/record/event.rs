//! Event identifiers.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Event emitted by the HTTP audit middleware.
pub const MIDDLEWARE_EVENT: EventId = EventId::from_static(1001, "traffic_audit::middleware");

/// Event emitted by the RPC audit interceptor.
pub const INTERCEPTOR_EVENT: EventId = EventId::from_static(1001, "traffic_audit::interceptor");

/// Numeric + symbolic tag identifying the call site or class of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct EventId {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Cow<'static, str>>,
}

impl EventId {
    pub const fn new(id: i32) -> Self {
        Self { id, name: None }
    }

    /// Const constructor for well-known event ids.
    pub const fn from_static(id: i32, name: &'static str) -> Self {
        Self {
            id,
            name: Some(Cow::Borrowed(name)),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
