//! Static description of the editable record fields.
//!
//! Frontends build their editors from [`RECORD_SCHEMA`] instead of
//! inspecting runtime value types: each entry names the field, its
//! [`FieldKind`] and whether it is required. The kind knows how to turn
//! raw user text into a JSON value ([`FieldKind::parse_input`]) and how
//! to render a stored value back into editable text ([`FieldKind::render`]).

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::{error::FieldError, models::lenient::split_tags};

/// Editor and conversion rules for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    LongText,
    /// Single-line text stored as `null` when empty.
    OptionalText,
    /// Boolean checkbox.
    Flag,
    /// `YYYY-MM-DD` or empty.
    Date,
    /// Integer score in `0..=100`; empty or `0` means unset.
    Score,
    /// Positive integer identifier; empty or `0` means unset.
    ExternalId,
    /// Comma-separated list of tags.
    TagList,
    /// JSON array of names.
    NameList,
    /// JSON array of URLs.
    UrlList,
    /// JSON array of platform objects.
    PlatformList,
}

/// One editable field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key of the field.
    pub name: &'static str,
    /// Label shown next to the editor.
    pub label: &'static str,
    /// Conversion rules.
    pub kind: FieldKind,
    /// Whether the store rejects records where this field is empty.
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: false,
    }
}

const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: true,
    }
}

/// Every user-editable field, in display order. `is_correct` is derived
/// and intentionally absent.
pub const RECORD_SCHEMA: &[FieldSpec] = &[
    required("name", "Name", FieldKind::Text),
    required("original_torrent_name", "Original Torrent Name", FieldKind::Text),
    field("cleaned_search_name", "Cleaned Search Name", FieldKind::Text),
    field("magnet", "Magnet", FieldKind::LongText),
    field("size", "Size", FieldKind::Text),
    field("version", "Version", FieldKind::Text),
    field("release_group", "Release Group", FieldKind::Text),
    field("edition_info", "Edition Info", FieldKind::OptionalText),
    field("languages_info", "Languages Info", FieldKind::Text),
    field("is_native_linux_torrent", "Is Native Linux Torrent", FieldKind::Flag),
    field("is_wine_bottled_torrent", "Is Wine Bottled Torrent", FieldKind::Flag),
    field("other_torrent_tags", "Other Torrent Tags", FieldKind::TagList),
    field("genres", "Genres", FieldKind::NameList),
    field("platforms", "Platforms", FieldKind::PlatformList),
    field("platform_type", "Platform Type", FieldKind::Text),
    required("description", "Description", FieldKind::LongText),
    field("release_date", "Release Date", FieldKind::Date),
    field("metacritic", "Metacritic", FieldKind::Score),
    field("rawg_id", "Rawg Id", FieldKind::ExternalId),
    field("thumbnail", "Thumbnail", FieldKind::Text),
    field("background_image", "Background Image", FieldKind::Text),
    field("screenshots", "Screenshots", FieldKind::UrlList),
    field("hidden", "Hidden", FieldKind::Flag),
];

/// Look up a field by its JSON key.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    RECORD_SCHEMA.iter().find(|spec| spec.name == name)
}

impl FieldSpec {
    /// Parse raw input for this field, enforcing `required`.
    pub fn parse_input(&self, raw: &str) -> Result<Value, FieldError> {
        if self.required && raw.trim().is_empty() {
            return Err(FieldError::Required(self.name));
        }
        self.kind.parse_input(raw).map_err(|reason| FieldError::Invalid {
            field: self.name.to_string(),
            reason,
        })
    }
}

impl FieldKind {
    /// Convert raw user text into the JSON value stored for this kind.
    pub fn parse_input(self, raw: &str) -> Result<Value, String> {
        let text = raw.trim();
        match self {
            Self::Text | Self::LongText => Ok(json!(text)),
            Self::OptionalText if text.is_empty() => Ok(Value::Null),
            Self::OptionalText => Ok(json!(text)),
            Self::Flag => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(json!(true)),
                "false" | "no" | "0" | "" => Ok(json!(false)),
                other => Err(format!("expected true or false, got '{other}'")),
            },
            Self::Date if text.is_empty() => Ok(json!("")),
            Self::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|date| json!(date.format("%Y-%m-%d").to_string()))
                .map_err(|_| format!("expected YYYY-MM-DD, got '{text}'")),
            Self::Score => parse_number(text, 100),
            Self::ExternalId => parse_number(text, u64::MAX),
            Self::TagList => Ok(json!(split_tags(text))),
            Self::NameList | Self::UrlList | Self::PlatformList => parse_array(self, text),
        }
    }

    /// Render a stored value as editable text; the inverse of [`Self::parse_input`].
    pub fn render(self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (Self::TagList, Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            (Self::NameList | Self::UrlList | Self::PlatformList, value) => {
                serde_json::to_string_pretty(value).unwrap_or_default()
            }
            (_, Value::String(text)) => text.clone(),
            (_, other) => other.to_string(),
        }
    }
}

fn parse_number(text: &str, max: u64) -> Result<Value, String> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    let number: u64 = text
        .parse()
        .map_err(|_| format!("expected a whole number, got '{text}'"))?;
    if number > max {
        return Err(format!("{number} is larger than {max}"));
    }
    Ok(if number == 0 { Value::Null } else { json!(number) })
}

fn parse_array(kind: FieldKind, text: &str) -> Result<Value, String> {
    if text.is_empty() {
        return Ok(json!([]));
    }
    let value: Value =
        serde_json::from_str(text).map_err(|err| format!("expected a JSON array: {err}"))?;
    let Value::Array(items) = &value else {
        return Err("expected a JSON array".to_string());
    };
    let well_formed = match kind {
        FieldKind::PlatformList => items
            .iter()
            .all(|item| item.get("id").and_then(Value::as_u64).is_some()),
        _ => items.iter().all(Value::is_string),
    };
    if !well_formed {
        return Err(match kind {
            FieldKind::PlatformList => "every platform needs a numeric id".to_string(),
            _ => "every entry must be a string".to_string(),
        });
    }
    Ok(value)
}
