//! Host-side message records.
//!
//! The host hands over open records whose fields may carry anything from
//! plain strings to upload-cancel callbacks. Only plain data may reach
//! storage; see [`crate::message::sanitize`].

use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A host callback attached to a message (e.g. cancel an upload).
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Any other non-serializable host object (streams, DOM handles, ...).
pub type OpaqueHandle = Arc<dyn Any + Send + Sync>;

/// Value of one field of a live message.
#[derive(Clone)]
pub enum LiveValue {
    /// Plain serializable data.
    Plain(Value),
    /// Nested open record.
    Record(LiveMessage),
    /// List that may mix plain data and handles.
    List(Vec<LiveValue>),
    Callback(Callback),
    Handle(OpaqueHandle),
}

impl LiveValue {
    /// Returns true for values that can be persisted as-is.
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            Self::Plain(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_plain().and_then(Value::as_str)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Callback(_) => "callback",
            Self::Handle(_) => "handle",
        }
    }
}

impl fmt::Debug for LiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(value) => write!(f, "Plain({})", value),
            Self::Record(record) => f.debug_tuple("Record").field(record).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            other => write!(f, "<{}>", other.kind()),
        }
    }
}

impl PartialEq for LiveValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => Arc::ptr_eq(a, b),
            (Self::Handle(a), Self::Handle(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for LiveValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for LiveValue {
    fn from(value: &str) -> Self {
        Self::Plain(Value::String(value.to_string()))
    }
}

impl From<String> for LiveValue {
    fn from(value: String) -> Self {
        Self::Plain(Value::String(value))
    }
}

impl From<LiveMessage> for LiveValue {
    fn from(record: LiveMessage) -> Self {
        Self::Record(record)
    }
}

/// An open message record as the host holds it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveMessage {
    fields: BTreeMap<String, LiveValue>,
}

impl LiveMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<LiveValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<LiveValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&LiveValue> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(LiveValue::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<LiveValue> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &LiveValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for LiveMessage {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(name, value)| (name, LiveValue::Plain(value)))
                .collect(),
        }
    }
}
