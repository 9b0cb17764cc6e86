//! Wire shapes of the games database API and their mapping onto record fields.

use serde::Deserialize;

use super::{html::strip_html, ExternalMetadata};
use crate::models::{Platform, Requirements};

/// `GET /games?search=...`
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub id: u64,
}

/// `GET /games/{id}`
///
/// Several fields exist in two spellings; the first one wins when present
/// and non-null.
#[derive(Debug, Deserialize)]
pub(crate) struct GameDetail {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description_raw: Option<String>,
    pub description: Option<String>,
    pub released: Option<String>,
    pub metacritic: Option<i64>,
    pub background_image: Option<String>,
    pub background_image_additional: Option<String>,
    pub genres: Option<Vec<NamedRef>>,
    pub platforms: Option<Vec<PlatformEntry>>,
    pub short_screenshots: Option<Vec<ImageRef>>,
    pub screenshots: Option<Vec<ImageRef>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlatformEntry {
    pub platform: PlatformRef,
    pub requirements: Option<RequirementsPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlatformRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequirementsPayload {
    pub minimum: Option<String>,
    pub recommended: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageRef {
    #[serde(default)]
    pub image: String,
}

impl GameDetail {
    pub(crate) fn into_metadata(self) -> ExternalMetadata {
        let description = self
            .description_raw
            .or(self.description)
            .map(|text| strip_html(&text))
            .unwrap_or_default();
        let background_image = self.background_image.unwrap_or_default();
        let thumbnail = self
            .background_image_additional
            .unwrap_or_else(|| background_image.clone());

        ExternalMetadata {
            name: self.name.unwrap_or_default(),
            description,
            release_date: self.released.unwrap_or_default(),
            metacritic: self
                .metacritic
                .and_then(|score| u8::try_from(score).ok())
                .filter(|score| *score <= 100),
            rawg_id: self.id.filter(|id| *id > 0),
            thumbnail,
            background_image,
            genres: self
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|genre| genre.name)
                .filter(|name| !name.is_empty())
                .collect(),
            platforms: self
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(PlatformEntry::into_platform)
                .collect(),
            screenshots: self
                .short_screenshots
                .or(self.screenshots)
                .unwrap_or_default()
                .into_iter()
                .map(|shot| shot.image)
                .filter(|url| !url.is_empty())
                .collect(),
        }
    }
}

impl PlatformEntry {
    fn into_platform(self) -> Platform {
        let requirements = match self.requirements {
            Some(published) => Requirements {
                minimum: published.minimum.unwrap_or_default(),
                recommended: published.recommended.unwrap_or_default(),
            },
            None => Requirements::unavailable(),
        };
        Platform {
            id: self.platform.id,
            name: self.platform.name,
            requirements,
        }
    }
}
