//! Deep keyword scan over schema-less metadata.
//!
//! Repository exports name their keyword fields inconsistently
//! (`item_keyword`, `item_1617186609386`, `subitem_subject`, ...), so the
//! scanner walks the whole tree and harvests anything filed under a
//! keyword-ish key.

use serde_json::Value;

/// Key fragments that mark a keyword-bearing field.
pub const KEYWORD_KEY_TERMS: &[&str] = &["keyword", "subject", "件名", "キーワード", "タグ", "テーマ"];

/// Fields exposing the keyword text inside a repeated-entry list.
pub const ENTRY_KEYWORD_FIELDS: &[&str] = &["subitem_keyword", "subitem_subject"];

/// Keyword text of one `attribute_value_mlt`-style entry.
pub fn entry_keyword(entry: &Value) -> Option<&str> {
    ENTRY_KEYWORD_FIELDS
        .iter()
        .filter_map(|f| entry.get(*f).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

fn is_keyword_key(key: &str) -> bool {
    let key = key.to_lowercase();
    KEYWORD_KEY_TERMS.iter().any(|t| key.contains(t))
}

/// Collect every keyword-like string found anywhere under `node`.
pub fn scan(node: &Value) -> Vec<String> {
    let mut out = Vec::new();
    walk(node, &mut out);
    out
}

fn walk(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                if is_keyword_key(key) {
                    harvest(value, out);
                }
                walk(value, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
        _ => {}
    }
}

fn harvest(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => spread(items, out),
        Value::Object(map) => {
            if let Some(Value::Array(entries)) = map.get("attribute_value_mlt") {
                spread(entries, out);
            } else {
                for v in map.values() {
                    match v {
                        Value::String(s) => out.push(s.clone()),
                        Value::Array(items) => spread(items, out),
                        _ => {}
                    }
                }
            }
        }
        _ => {}
    }
}

fn spread(items: &[Value], out: &mut Vec<String>) {
    for item in items {
        match item {
            Value::String(s) => out.push(s.clone()),
            other => {
                if let Some(kw) = entry_keyword(other) {
                    out.push(kw.to_string());
                }
            }
        }
    }
}
