//! Small JSON predicates hosts use before handing text to the link.

use serde_json::Value;

/// Text returned by [`make_json`] for input that does not parse.
pub const NOT_JSON: &str = "Not JSON!";

/// Returns whether `text` parses as a JSON document.
#[must_use]
pub fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Returns `text` unchanged when it parses, otherwise [`NOT_JSON`].
#[must_use]
pub fn make_json(text: &str) -> String {
    if is_valid_json(text) {
        text.to_owned()
    } else {
        NOT_JSON.to_owned()
    }
}

/// Returns whether a top-level value of `json` is the string `needle`.
///
/// Object values and array elements are inspected; nested containers are not
/// searched. Scalars and unparsable text never match.
#[must_use]
pub fn json_contains_value(json: &str, needle: &str) -> bool {
    let Ok(document) = serde_json::from_str::<Value>(json) else {
        return false;
    };
    let is_needle = |value: &Value| value.as_str() == Some(needle);
    match &document {
        Value::Object(map) => map.values().any(is_needle),
        Value::Array(items) => items.iter().any(is_needle),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
    }
}
