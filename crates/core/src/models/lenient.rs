//! Forgiving field deserialisers for catalog files edited by hand or by older tools.
//!
//! Each `deserialize_with` target here accepts whatever JSON shows up and
//! normalises it. `null`, wrong types and out-of-range numbers collapse to
//! the field's empty value instead of failing the whole file.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::Requirements;

pub(crate) fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub(crate) fn optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(value_to_flag(&Value::deserialize(deserializer)?))
}

pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(value_to_list(Value::deserialize(deserializer)?))
}

pub(crate) fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(value_to_tags(Value::deserialize(deserializer)?))
}

pub(crate) fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    Ok(value_to_score(&Value::deserialize(deserializer)?))
}

pub(crate) fn external_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    Ok(value_to_external_id(&Value::deserialize(deserializer)?))
}

pub(crate) fn platform_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(value_to_platform_id(&Value::deserialize(deserializer)?))
}

pub(crate) fn requirements<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Requirements, D::Error> {
    Ok(value_to_requirements(Value::deserialize(deserializer)?))
}

// Patch variants: a present key always yields `Some`, even when its value is null.

pub(crate) fn some_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    string(deserializer).map(Some)
}

pub(crate) fn some_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error> {
    optional_string(deserializer).map(Some)
}

pub(crate) fn some_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    flag(deserializer).map(Some)
}

pub(crate) fn some_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    list(deserializer).map(Some)
}

pub(crate) fn some_tags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    tags(deserializer).map(Some)
}

pub(crate) fn some_score<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<u8>>, D::Error> {
    score(deserializer).map(Some)
}

pub(crate) fn some_external_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<u64>>, D::Error> {
    external_id(deserializer).map(Some)
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn value_to_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_i64().map(|n| n != 0).unwrap_or(false),
        Value::String(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        ),
        _ => false,
    }
}

fn value_to_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!(entry = %item, "dropping unreadable list entry: {err}");
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(value = %other, "expected a list; using an empty one");
            Vec::new()
        }
    }
}

/// Tags may arrive as an array or as one comma-separated string.
pub(crate) fn split_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn value_to_tags(value: Value) -> Vec<String> {
    match value {
        Value::String(text) => split_tags(&text),
        other => value_to_list(other),
    }
}

fn value_to_score(value: &Value) -> Option<u8> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .filter(|score| *score <= 100)
        .and_then(|score| u8::try_from(score).ok())
}

fn value_to_platform_id(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .unwrap_or_default()
}

/// Anything but an object means the requirements were never published.
fn value_to_requirements(value: Value) -> Requirements {
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!("unreadable requirements: {err}");
            Requirements::unavailable()
        }),
        _ => Requirements::unavailable(),
    }
}

fn value_to_external_id(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .filter(|id| *id > 0)
}
