//! Helpers for reading loosely shaped JSON.
//!
//! Upstream payloads may omit any field or change its type (a title can be
//! a string or a one-element list, a year a number or a string). Nothing is
//! trusted beyond what these helpers check.

use crate::keywords::Candidate;
use crate::scan::entry_keyword;
use serde_json::Value;

/// Scalar as non-empty text. Numbers are rendered, everything else is `None`.
pub fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`text`], but a list yields its first element.
pub fn first_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Array(items) => text(items.first()),
        other => text(Some(other)),
    }
}

/// First four characters of a date-ish value.
pub fn year_prefix(v: Option<&Value>) -> Option<String> {
    text(v).map(|s| s.chars().take(4).collect())
}

/// Array elements, empty slice for anything else.
pub fn items(v: Option<&Value>) -> &[Value] {
    v.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// A field as a keyword candidate: strings are split later, lists are not.
///
/// List elements may be plain strings or `subitem_keyword`-style entries.
pub fn candidate(v: Option<&Value>) -> Candidate {
    match v {
        Some(Value::String(s)) => Candidate::Text(s.clone()),
        Some(Value::Array(list)) => Candidate::List(
            list.iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => entry_keyword(other).map(str::to_string),
                })
                .collect(),
        ),
        _ => Candidate::Missing,
    }
}
