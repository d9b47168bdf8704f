//! Configuration value merging
//!
//! Implements the asymmetric merge rule used everywhere two config values of
//! the same shape must be combined: structural merge only when both sides are
//! arrays or both are objects, otherwise the incoming value replaces the
//! current one outright. Mode-config overlay and `modify_user_config` with
//! deep merge enabled both go through here.

use serde_json::Value;

/// Merge two loosely typed config values.
///
/// - both arrays: element-wise recursive merge, extra incoming elements are
///   appended
/// - both objects: recursive deep merge, incoming leaves win on conflicts
/// - anything else: the incoming value wins
pub fn merge_values(current: &Value, incoming: &Value) -> Value {
    match (current, incoming) {
        (Value::Array(current), Value::Array(incoming)) => {
            let mut merged = Vec::with_capacity(current.len().max(incoming.len()));
            for i in 0..current.len().max(incoming.len()) {
                match (current.get(i), incoming.get(i)) {
                    (Some(a), Some(b)) => merged.push(merge_values(a, b)),
                    (Some(a), None) => merged.push(a.clone()),
                    (None, Some(b)) => merged.push(b.clone()),
                    (None, None) => unreachable!(),
                }
            }
            Value::Array(merged)
        }
        (Value::Object(current), Value::Object(incoming)) => {
            let mut merged = current.clone();
            for (key, value) in incoming {
                match merged.get(key) {
                    Some(existing) => {
                        let combined = merge_values(existing, value);
                        merged.insert(key.clone(), combined);
                    }
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        (_, incoming) => incoming.clone(),
    }
}

/// Overlay a mode-config plugin list onto the base plugin list.
///
/// Entries are matched by plugin name (a bare string, or the head of a
/// `[name, options]` pair). Same-name entries are overwritten in place, new
/// entries are appended, and untouched entries keep their original order.
pub fn merge_plugin_lists(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    let mut merged = base.to_vec();
    let base_names: Vec<Option<String>> = base.iter().map(plugin_entry_name).collect();

    for entry in overlay {
        let name = plugin_entry_name(entry);
        let position = name
            .as_ref()
            .and_then(|name| base_names.iter().position(|n| n.as_ref() == Some(name)));
        match position {
            Some(index) => merged[index] = entry.clone(),
            None => merged.push(entry.clone()),
        }
    }

    merged
}

fn plugin_entry_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(name) => Some(name.clone()),
        Value::Array(pair) => pair.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
