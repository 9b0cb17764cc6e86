use serde::Deserialize;
use serde_json::{Map, Value};

use super::{lenient, Platform, Record};
use crate::{error::FieldError, schema};

/// Field-level changes for a [`Record`].
///
/// `None` leaves a field untouched. Nullable fields use a nested option so
/// `Some(None)` clears them. `is_correct` is derived and cannot be patched;
/// it is ignored when present in JSON input.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    #[serde(deserialize_with = "lenient::some_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub original_torrent_name: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub cleaned_search_name: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub magnet: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub version: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub release_group: Option<String>,
    #[serde(deserialize_with = "lenient::some_optional_string")]
    pub edition_info: Option<Option<String>>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub languages_info: Option<String>,
    #[serde(deserialize_with = "lenient::some_flag")]
    pub is_native_linux_torrent: Option<bool>,
    #[serde(deserialize_with = "lenient::some_flag")]
    pub is_wine_bottled_torrent: Option<bool>,
    #[serde(deserialize_with = "lenient::some_tags")]
    pub other_torrent_tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::some_list")]
    pub genres: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::some_list")]
    pub platforms: Option<Vec<Platform>>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub platform_type: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub release_date: Option<String>,
    #[serde(deserialize_with = "lenient::some_score")]
    pub metacritic: Option<Option<u8>>,
    #[serde(deserialize_with = "lenient::some_external_id")]
    pub rawg_id: Option<Option<u64>>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub thumbnail: Option<String>,
    #[serde(deserialize_with = "lenient::some_string")]
    pub background_image: Option<String>,
    #[serde(deserialize_with = "lenient::some_list")]
    pub screenshots: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::some_flag")]
    pub hidden: Option<bool>,
}

macro_rules! record_fields {
    ($apply:ident) => {
        $apply!(
            name,
            original_torrent_name,
            cleaned_search_name,
            magnet,
            size,
            version,
            release_group,
            edition_info,
            languages_info,
            is_native_linux_torrent,
            is_wine_bottled_torrent,
            other_torrent_tags,
            genres,
            platforms,
            platform_type,
            description,
            release_date,
            metacritic,
            rawg_id,
            thumbnail,
            background_image,
            screenshots,
            hidden
        )
    };
}

impl RecordPatch {
    /// Build a patch from a JSON object, e.g. a record file written by hand.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Overwrite every field present in the patch onto `record`.
    ///
    /// `is_correct` is left alone; the store recomputes it afterwards.
    pub fn apply_to(self, record: &mut Record) {
        let patch = self;
        macro_rules! overwrite {
            ($($field:ident),+) => {
                $(if let Some(value) = patch.$field {
                    record.$field = value;
                })+
            };
        }
        record_fields!(overwrite);
    }

    /// Layer `other` over this patch; fields set in `other` win.
    pub fn merge(&mut self, other: RecordPatch) {
        let target = self;
        macro_rules! overlay {
            ($($field:ident),+) => {
                $(if other.$field.is_some() {
                    target.$field = other.$field;
                })+
            };
        }
        record_fields!(overlay);
    }

    /// Set a single field from an already parsed JSON value.
    ///
    /// Only fields listed in [`schema::RECORD_SCHEMA`] are accepted.
    pub fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        let spec = schema::field_spec(field)
            .ok_or_else(|| FieldError::UnknownField(field.to_string()))?;
        let mut object = Map::new();
        object.insert(spec.name.to_string(), value);
        let single = Self::from_json(Value::Object(object)).map_err(|err| FieldError::Invalid {
            field: spec.name.to_string(),
            reason: err.to_string(),
        })?;
        self.merge(single);
        Ok(())
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
