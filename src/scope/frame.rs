//! Scope frames.

use serde::Serialize;
use serde_json::Value;

use crate::record::serialize_error_sentinel;

/// A contextual annotation pushed onto a scope stack.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeFrame {
    /// Plain text label.
    Label(String),
    /// Key/value annotations.
    Properties(Vec<(String, Value)>),
}

impl ScopeFrame {
    pub fn label(text: impl Into<String>) -> Self {
        ScopeFrame::Label(text.into())
    }

    pub fn properties<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        ScopeFrame::Properties(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Single property holding any serializable value. A value that fails
    /// to serialize is stored as the serialize-error sentinel.
    pub fn serialized<T: Serialize>(key: impl Into<String>, value: &T) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|_| Value::String(serialize_error_sentinel(std::any::type_name::<T>())));
        ScopeFrame::Properties(vec![(key.into(), value)])
    }
}

/// Render a scope value as record text: strings verbatim, null as empty,
/// everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
