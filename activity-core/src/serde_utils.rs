use serde_json::{Map, Value};

use crate::errors::{Result, TimelineError};

/// Serializes a value to pretty JSON with canonical error handling.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| TimelineError::Serialization(err.to_string()))
}

/// Copies keys from `extra` into `target` without replacing existing keys.
pub fn merge_missing(target: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        target.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
