//! Request parameter normalization.

use serde_json::{Map, Value};

/// Removes every top-level key whose value is an empty string or `null`.
///
/// Other values, including `0`, `false`, empty arrays and empty objects, are
/// kept unchanged. Non-object values are returned as-is. Applying the function
/// twice yields the same value as applying it once.
pub fn strip_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !is_empty_value(v))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Flattens a JSON object into query-string pairs.
///
/// Strings are sent verbatim, scalars through their JSON text, and nested
/// arrays or objects as compact JSON. Non-object values produce no pairs.
pub fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = value else {
        return Vec::new();
    };

    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
