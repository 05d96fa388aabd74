//! Slash-path accessor for JSON text.
//!
//! Hosts receive packets as text and pull individual fields out with paths
//! such as `payload/users/0/name`. The accessor never fails: a malformed path
//! or a miss yields an empty string, and a document that does not parse yields
//! the parser's message in place of a value.

use std::num::FpCategory;

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Extracts the value at `path` from the JSON document `data`.
///
/// Segments are separated by `/` and percent-decoded, so `a%2Fb` addresses
/// the key `a/b`. A single leading and a single trailing slash are ignored.
///
/// The result is rendered as text:
///
/// - `null` becomes `"null"`;
/// - a missing value becomes `""`;
/// - objects and arrays become compact JSON;
/// - strings are returned without quotes;
/// - numbers print as a JavaScript host would (`5`, `2.5`, `1e+21`);
/// - booleans print as `true` or `false`.
///
/// Arrays and strings also answer to `length`. Strings are indexed by UTF-16
/// code unit.
///
/// # Examples
///
/// ```
/// use turbolink::extract;
///
/// assert_eq!(extract("a/b", r#"{"a":{"b":5}}"#), "5");
/// assert_eq!(extract("a/b", r#"{"a":{"b":{"c":1}}}"#), r#"{"c":1}"#);
/// assert_eq!(extract("missing/path", "{}"), "");
/// ```
#[must_use]
pub fn extract(path: &str, data: &str) -> String {
    let Some(segments) = decode_segments(path) else {
        return String::new();
    };

    let root: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(error) => return error.to_string(),
    };

    let mut node = Node::Json(&root);
    for segment in &segments {
        match node.index(segment) {
            Some(next) => node = next,
            None => return String::new(),
        }
    }
    node.render()
}

/// Position reached while walking a document.
enum Node<'a> {
    /// A value inside the parsed document.
    Json(&'a Value),
    /// Text derived from a string (a single code unit).
    Text(String),
    /// A derived `length`.
    Count(usize),
}

impl<'a> Node<'a> {
    fn index(&self, segment: &str) -> Option<Self> {
        match self {
            Self::Json(Value::Object(map)) => map.get(segment).map(Node::Json),
            Self::Json(Value::Array(items)) => {
                if segment == "length" {
                    return Some(Node::Count(items.len()));
                }
                canonical_index(segment)
                    .and_then(|position| items.get(position))
                    .map(Node::Json)
            }
            Self::Json(Value::String(text)) => index_text(text, segment),
            Self::Text(text) => index_text(text, segment),
            Self::Json(Value::Null | Value::Bool(_) | Value::Number(_)) | Self::Count(_) => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Json(Value::Null) => String::from("null"),
            Self::Json(Value::String(text)) => text.clone(),
            Self::Json(Value::Number(number)) => number_text(number),
            Self::Json(Value::Bool(flag)) => flag.to_string(),
            Self::Json(composite @ (Value::Object(_) | Value::Array(_))) => composite.to_string(),
            Self::Text(text) => text.clone(),
            Self::Count(count) => count.to_string(),
        }
    }
}

/// Strings are measured and indexed in UTF-16 code units, as hosts count
/// them. Half of a surrogate pair renders as U+FFFD.
fn index_text<'a>(text: &str, segment: &str) -> Option<Node<'a>> {
    if segment == "length" {
        return Some(Node::Count(text.encode_utf16().count()));
    }
    canonical_index(segment)
        .and_then(|position| text.encode_utf16().nth(position))
        .map(|unit| Node::Text(String::from_utf16_lossy(&[unit])))
}

/// Accepts only the canonical decimal spelling of an index (`"0"`, `"12"`).
fn canonical_index(segment: &str) -> Option<usize> {
    let position: usize = segment.parse().ok()?;
    (position.to_string() == segment).then_some(position)
}

/// Renders a number the way a JavaScript host prints it: shortest
/// round-trip digits, no fraction on integral values, exponent form outside
/// `[1e-6, 1e21)` and no negative zero.
fn number_text(number: &serde_json::Number) -> String {
    number
        .as_f64()
        .map_or_else(|| number.to_string(), script_number_text)
}

fn script_number_text(float: f64) -> String {
    if float.classify() == FpCategory::Zero {
        return String::from("0");
    }
    let magnitude = float.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return float.to_string();
    }
    let scientific = format!("{float:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => scientific,
    }
}

/// Splits and percent-decodes `path`; `None` when an escape is malformed.
fn decode_segments(path: &str) -> Option<Vec<String>> {
    let mut segments = path
        .split('/')
        .map(decode_segment)
        .collect::<Option<Vec<_>>>()?;

    if segments.first().is_some_and(String::is_empty) {
        segments.remove(0);
    }
    if segments.last().is_some_and(String::is_empty) {
        segments.pop();
    }
    Some(segments)
}

fn decode_segment(segment: &str) -> Option<String> {
    if !escapes_are_well_formed(segment) {
        return None;
    }
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn escapes_are_well_formed(segment: &str) -> bool {
    let mut bytes = segment.bytes();
    while let Some(byte) = bytes.next() {
        if byte != b'%' {
            continue;
        }
        let is_hex = |digit: Option<u8>| digit.is_some_and(|value| value.is_ascii_hexdigit());
        if !(is_hex(bytes.next()) && is_hex(bytes.next())) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const FRUIT: &str = r#"{"fruit": {"apples": 2, "bananas": 3}, "total_fruit": 5}"#;

    #[rstest]
    #[case("a/b", r#"{"a":{"b":5}}"#, "5")]
    #[case("a/b", r#"{"a":{"b":{"c":1}}}"#, r#"{"c":1}"#)]
    #[case("fruit/apples", FRUIT, "2")]
    #[case("fruit", FRUIT, r#"{"apples":2,"bananas":3}"#)]
    #[case("/total_fruit/", FRUIT, "5")]
    #[case("a", r#"{"a":null}"#, "null")]
    #[case("a", r#"{"a":"text"}"#, "text")]
    #[case("a", r#"{"a":true}"#, "true")]
    #[case("a", r#"{"a":2.5}"#, "2.5")]
    #[case("a", r#"{"a":5.0}"#, "5")]
    #[case("a/1", r#"{"a":[10,20,30]}"#, "20")]
    #[case("a/length", r#"{"a":[10,20,30]}"#, "3")]
    #[case("a/1", r#"{"a":"xyz"}"#, "y")]
    #[case("a/length", r#"{"a":"xyz"}"#, "3")]
    #[case("a/length", r#"{"a":"😀"}"#, "2")]
    #[case("a/3", r#"{"a":"x😀y"}"#, "y")]
    #[case("a/1", r#"{"a":"x😀y"}"#, "\u{FFFD}")]
    #[case("a", r#"{"a":1e21}"#, "1e+21")]
    #[case("a", r#"{"a":1.5e300}"#, "1.5e+300")]
    #[case("a", r#"{"a":1e20}"#, "100000000000000000000")]
    #[case("a", r#"{"a":1e-7}"#, "1e-7")]
    #[case("a", r#"{"a":0.000001}"#, "0.000001")]
    #[case("a", r#"{"a":-0.0}"#, "0")]
    #[case("a", r#"{"a":-12}"#, "-12")]
    #[case("a%2Fb", r#"{"a/b":"slashed"}"#, "slashed")]
    #[case("caf%C3%A9", r#"{"café":1}"#, "1")]
    fn extracts_values(#[case] path: &str, #[case] data: &str, #[case] expected: &str) {
        assert_eq!(extract(path, data), expected);
    }

    #[rstest]
    #[case("missing/path", "{}")]
    #[case("a/b/c", r#"{"a":{"b":5}}"#)]
    #[case("a/01", r#"{"a":[1,2]}"#)]
    #[case("a/9", r#"{"a":[1,2]}"#)]
    #[case("a/b", r#"{"a":null}"#)]
    #[case("a/%zz", r#"{"a":{}}"#)]
    #[case("a/%", r#"{"a":{}}"#)]
    #[case("%FF", r#"{"a":{}}"#)]
    fn misses_render_empty(#[case] path: &str, #[case] data: &str) {
        assert_eq!(extract(path, data), "");
    }

    #[rstest]
    fn empty_path_renders_whole_document() {
        assert_eq!(extract("", r#"{"a": [1, 2]}"#), r#"{"a":[1,2]}"#);
        assert_eq!(extract("/", "3"), "3");
    }

    #[rstest]
    fn parse_failure_returns_parser_message() {
        let result = extract("a", "not json");

        assert!(!result.is_empty());
        assert!(result.contains("line 1"), "unexpected message: {result}");
    }
}
