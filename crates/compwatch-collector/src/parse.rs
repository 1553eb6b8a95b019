//! Page shape validation and item mapping.
//!
//! A page is either a bare JSON array of objects or an envelope object whose
//! records live under a configured key, optionally alongside a `total` count.

use compwatch_core::RawRecord;
use serde_json::Value;

/// One validated page of API items.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    /// Total number of records the server reports, when it does.
    pub total: Option<u64>,
}

/// Validates the shape of a decoded page body.
///
/// # Errors
///
/// Returns a human-readable reason when the body is neither an array nor an
/// object carrying an array under `records_field`, or when any item is not a
/// JSON object.
pub fn parse_page(body: Value, records_field: &str) -> Result<Page, String> {
    let (items, total) = match body {
        Value::Array(items) => (items, None),
        Value::Object(mut map) => {
            let total = map.get("total").and_then(Value::as_u64);
            match map.remove(records_field) {
                Some(Value::Array(items)) => (items, total),
                Some(other) => {
                    return Err(format!(
                        "field \"{records_field}\" is {}, expected an array",
                        kind(&other)
                    ))
                }
                None => return Err(format!("object has no \"{records_field}\" field")),
            }
        }
        other => return Err(format!("top-level {} is not an array or object", kind(&other))),
    };

    if let Some(pos) = items.iter().position(|item| !item.is_object()) {
        return Err(format!("item {pos} is {}, expected an object", kind(&items[pos])));
    }

    Ok(Page { items, total })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Scalar JSON value as text. Blank strings, null and containers map to `None`.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Maps one API item onto the raw record layout.
///
/// `collected_at` is the run timestamp shared by every record of a collection.
#[must_use]
pub fn map_item(item: &Value, collected_at: &str) -> RawRecord {
    let name = scalar_text(item.get("title")).or_else(|| scalar_text(item.get("name")));
    let category = match item.get("category") {
        Some(Value::Object(obj)) => scalar_text(obj.get("name")),
        other => scalar_text(other),
    };

    RawRecord {
        id: scalar_text(item.get("id")),
        name,
        price: scalar_text(item.get("price")),
        description: scalar_text(item.get("description")),
        category,
        collected_at: Some(collected_at.to_owned()),
    }
}
