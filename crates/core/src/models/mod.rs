//! Shared domain models.

pub(crate) mod lenient;
mod patch;

use serde::{Deserialize, Serialize};

use crate::catalog::correctness;

pub use patch::RecordPatch;

/// Placeholder used when the provider publishes no system requirements.
pub const REQUIREMENTS_UNAVAILABLE: &str = "N/A";

/// One catalog entry pairing a torrent release with external game metadata.
///
/// Serialises with every key present; `edition_info`, `metacritic` and
/// `rawg_id` are written as `null` when unset. Deserialising is lenient so
/// files edited elsewhere still load, with missing or malformed values
/// falling back to empty defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Record {
    /// Catalog title of the game.
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    /// Release name of the torrent. Unique across the store.
    #[serde(deserialize_with = "lenient::string")]
    pub original_torrent_name: String,
    /// Name used when searching for the release.
    #[serde(deserialize_with = "lenient::string")]
    pub cleaned_search_name: String,
    /// Magnet link.
    #[serde(deserialize_with = "lenient::string")]
    pub magnet: String,
    /// Human-readable download size.
    #[serde(deserialize_with = "lenient::string")]
    pub size: String,
    /// Release version string.
    #[serde(deserialize_with = "lenient::string")]
    pub version: String,
    /// Group that published the release.
    #[serde(deserialize_with = "lenient::string")]
    pub release_group: String,
    /// Edition label, when the release names one.
    #[serde(deserialize_with = "lenient::optional_string")]
    pub edition_info: Option<String>,
    /// Free-form language description.
    #[serde(deserialize_with = "lenient::string")]
    pub languages_info: String,
    /// Release ships a native Linux build.
    #[serde(deserialize_with = "lenient::flag")]
    pub is_native_linux_torrent: bool,
    /// Release ships as a Wine bottle.
    #[serde(deserialize_with = "lenient::flag")]
    pub is_wine_bottled_torrent: bool,
    /// Additional release tags in their original order.
    #[serde(deserialize_with = "lenient::tags")]
    pub other_torrent_tags: Vec<String>,
    /// Genre names.
    #[serde(deserialize_with = "lenient::list")]
    pub genres: Vec<String>,
    /// Platforms with their system requirements.
    #[serde(deserialize_with = "lenient::list")]
    pub platforms: Vec<Platform>,
    /// Free-form platform label of the release.
    #[serde(deserialize_with = "lenient::string")]
    pub platform_type: String,
    /// Game description, plain text.
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    /// ISO date (`YYYY-MM-DD`) or empty.
    #[serde(deserialize_with = "lenient::string")]
    pub release_date: String,
    /// Metacritic score in `0..=100`.
    #[serde(deserialize_with = "lenient::score")]
    pub metacritic: Option<u8>,
    /// Identifier in the external games database.
    #[serde(deserialize_with = "lenient::external_id")]
    pub rawg_id: Option<u64>,
    /// Thumbnail image URL.
    #[serde(deserialize_with = "lenient::string")]
    pub thumbnail: String,
    /// Background image URL.
    #[serde(deserialize_with = "lenient::string")]
    pub background_image: String,
    /// Screenshot URLs.
    #[serde(deserialize_with = "lenient::list")]
    pub screenshots: Vec<String>,
    /// Soft-delete flag. Hidden records stay in storage.
    #[serde(deserialize_with = "lenient::flag")]
    pub hidden: bool,
    /// Derived by the store; any value read from disk is recomputed.
    #[serde(deserialize_with = "lenient::flag")]
    pub is_correct: bool,
}

impl Record {
    /// Names of required fields that are blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("original_torrent_name", &self.original_torrent_name),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Recompute `is_correct` from the current name pair.
    pub fn refresh_correctness(&mut self) {
        self.is_correct = correctness::is_correct(&self.name, &self.original_torrent_name);
    }

    /// Returns the catalog name, or the torrent name when the former is empty.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.original_torrent_name
        } else {
            &self.name
        }
    }
}

/// A platform the game runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Platform identifier in the external database.
    #[serde(default, deserialize_with = "lenient::platform_id")]
    pub id: u64,
    /// Platform name.
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Published system requirements; `N/A` when absent or not an object.
    #[serde(
        default = "Requirements::unavailable",
        deserialize_with = "lenient::requirements"
    )]
    pub requirements: Requirements,
}

/// Minimum and recommended system requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Requirements {
    /// Minimum requirements text.
    #[serde(deserialize_with = "lenient::string")]
    pub minimum: String,
    /// Recommended requirements text.
    #[serde(deserialize_with = "lenient::string")]
    pub recommended: String,
}

impl Requirements {
    /// Requirements for a platform where none were published.
    pub fn unavailable() -> Self {
        Self {
            minimum: REQUIREMENTS_UNAVAILABLE.to_string(),
            recommended: REQUIREMENTS_UNAVAILABLE.to_string(),
        }
    }
}
