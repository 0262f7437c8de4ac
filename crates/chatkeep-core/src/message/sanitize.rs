//! Live → stored conversion.
//!
//! Scans every field by runtime kind and strips anything that is not plain
//! data, recursing into nested records and lists. A message is never
//! rejected: at worst it degrades into a partial record.

use super::live::{LiveMessage, LiveValue};
use super::stored::StoredMessage;
use serde_json::{Map, Value};

/// Result of sanitizing one live message.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub message: StoredMessage,
    /// Dotted paths of every field that was dropped.
    pub stripped: Vec<String>,
}

/// Produces a plain-data copy of `message`.
///
/// Top-level fields named in `strip_fields` are dropped even when plain.
pub fn sanitize(message: &LiveMessage, strip_fields: &[String]) -> Sanitized {
    let mut stripped = Vec::new();
    let mut fields = Map::new();

    for (name, value) in message.fields() {
        if strip_fields.iter().any(|f| f == name) {
            stripped.push(name.clone());
            continue;
        }
        if let Some(plain) = to_plain(value, name, &mut stripped) {
            fields.insert(name.clone(), plain);
        }
    }

    Sanitized {
        message: StoredMessage::new(fields),
        stripped,
    }
}

fn to_plain(value: &LiveValue, path: &str, stripped: &mut Vec<String>) -> Option<Value> {
    match value {
        LiveValue::Plain(plain) => Some(plain.clone()),
        LiveValue::Record(record) => {
            let mut object = Map::new();
            for (name, child) in record.fields() {
                let child_path = format!("{}.{}", path, name);
                if let Some(plain) = to_plain(child, &child_path, stripped) {
                    object.insert(name.clone(), plain);
                }
            }
            Some(Value::Object(object))
        }
        LiveValue::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                if let Some(plain) = to_plain(item, &item_path, stripped) {
                    array.push(plain);
                }
            }
            Some(Value::Array(array))
        }
        LiveValue::Callback(_) | LiveValue::Handle(_) => {
            stripped.push(path.to_string());
            None
        }
    }
}
