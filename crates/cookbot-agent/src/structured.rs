//! Structured (JSON) output parsing
//!
//! Models asked for JSON usually return a bare object, but sometimes wrap it
//! in a Markdown fence or surround it with prose. These helpers recover the
//! object when one is there and report `None` when it is not.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Extract the JSON object carried by a model response
///
/// # Examples
///
/// ```
/// use cookbot_agent::extract_json_object;
///
/// let text = "```json\n{\"approved\": true}\n```";
/// let object = extract_json_object(text).unwrap();
/// assert_eq!(object["approved"], true);
/// ```
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = strip_fence(text.trim());
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(map);
    }

    // Fall back to the outermost brace pair
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if start >= end {
        return None;
    }

    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Parse a model response straight into `T`
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    extract_json_object(text).and_then(|map| serde_json::from_value(Value::Object(map)).ok())
}

/// Non-empty string field of a JSON object
pub fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Array-of-strings field, skipping entries that are not strings
pub fn string_list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
