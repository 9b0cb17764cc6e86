//! Client for the external games database.
//!
//! [`RawgProvider::fetch`] resolves metadata through a fallback chain:
//! an explicit numeric id, then the record's existing id, then a name
//! search followed by a detail lookup of the first hit. Each step fails
//! independently; only the absence of any result reaches the caller.

mod html;
mod payload;
mod transport;

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::ProviderError,
    events::{Notifier, NotifyOptions},
    models::{Platform, RecordPatch},
};

pub use html::strip_html;
pub use transport::{CatalogTransport, HttpTransport};

use payload::{GameDetail, SearchResponse};

/// Connection settings, injected from [`crate::AppConfig::provider_settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// API root, e.g. `https://api.rawg.io/api`.
    pub base_url: String,
    /// API key; requests are refused without one.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// External metadata mapped onto record fields. Every field is always set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalMetadata {
    /// Catalog title.
    pub name: String,
    /// Plain-text description.
    pub description: String,
    /// Release date as published, usually `YYYY-MM-DD`.
    pub release_date: String,
    /// Metacritic score.
    pub metacritic: Option<u8>,
    /// Identifier in the games database.
    pub rawg_id: Option<u64>,
    /// Thumbnail image URL.
    pub thumbnail: String,
    /// Background image URL.
    pub background_image: String,
    /// Genre names.
    pub genres: Vec<String>,
    /// Platforms with requirements.
    pub platforms: Vec<Platform>,
    /// Screenshot URLs.
    pub screenshots: Vec<String>,
}

impl From<ExternalMetadata> for RecordPatch {
    fn from(metadata: ExternalMetadata) -> Self {
        Self {
            name: Some(metadata.name),
            description: Some(metadata.description),
            release_date: Some(metadata.release_date),
            metacritic: Some(metadata.metacritic),
            rawg_id: Some(metadata.rawg_id),
            thumbnail: Some(metadata.thumbnail),
            background_image: Some(metadata.background_image),
            genres: Some(metadata.genres),
            platforms: Some(metadata.platforms),
            screenshots: Some(metadata.screenshots),
            ..Self::default()
        }
    }
}

/// Anything able to resolve external metadata for a record.
pub trait MetadataSource {
    /// Resolve metadata for `query`, falling back to `existing_id` when no
    /// query is given. Returns `None` when every lookup failed.
    fn fetch(
        &self,
        query: Option<&str>,
        existing_id: Option<u64>,
        options: NotifyOptions,
    ) -> Option<ExternalMetadata>;
}

/// How a user query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind<'a> {
    /// Positive integer: look the id up directly.
    Id(u64),
    /// Digits that do not fit an id; the direct lookup cannot succeed.
    OversizedId,
    /// Free text, or a literal zero: search by name.
    Search(&'a str),
}

fn classify(query: &str) -> QueryKind<'_> {
    if query.chars().all(|ch| ch.is_ascii_digit()) {
        return match query.parse::<u64>() {
            Ok(0) => QueryKind::Search(query),
            Ok(id) => QueryKind::Id(id),
            Err(_) => QueryKind::OversizedId,
        };
    }
    QueryKind::Search(query)
}

/// Games database client generic over its transport.
pub struct RawgProvider<T = HttpTransport> {
    transport: T,
    notifier: Notifier,
}

impl RawgProvider<HttpTransport> {
    /// Build an HTTP-backed provider.
    pub fn from_settings(
        settings: &ProviderSettings,
        notifier: Notifier,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new(HttpTransport::new(settings)?, notifier))
    }
}

impl<T: CatalogTransport> RawgProvider<T> {
    /// Wrap an existing transport.
    pub fn new(transport: T, notifier: Notifier) -> Self {
        Self {
            transport,
            notifier,
        }
    }

    /// Fetch the detail record for `id`.
    pub fn lookup(&self, id: u64) -> Result<ExternalMetadata, ProviderError> {
        let value = self.transport.get_json(&format!("games/{id}"), &[])?;
        if is_empty_payload(&value) {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        let detail: GameDetail =
            serde_json::from_value(value).map_err(|err| ProviderError::Parse(err.to_string()))?;
        Ok(detail.into_metadata())
    }

    /// Search by name and fetch the detail record of the first hit.
    pub fn search(&self, name: &str) -> Result<ExternalMetadata, ProviderError> {
        let value = self.transport.get_json("games", &[("search", name)])?;
        let response: SearchResponse =
            serde_json::from_value(value).map_err(|err| ProviderError::Parse(err.to_string()))?;
        let first = response
            .results
            .first()
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;
        debug!(query = name, id = first.id, "search matched");
        self.lookup(first.id)
    }

    fn attempt(
        &self,
        options: NotifyOptions,
        description: &str,
        on_failure: Option<&str>,
        request: impl FnOnce() -> Result<ExternalMetadata, ProviderError>,
    ) -> Option<ExternalMetadata> {
        self.notifier.info(
            options,
            format!("Attempting to fetch game data by {description}..."),
        );
        match request() {
            Ok(metadata) => {
                self.notifier.info(
                    options,
                    format!("Fetched '{}' by {description}.", metadata.name),
                );
                Some(metadata)
            }
            Err(err) => {
                let mut message = format!("Fetch by {description} failed: {err}.");
                if let Some(next) = on_failure {
                    message.push(' ');
                    message.push_str(next);
                }
                self.notifier.error(options, message);
                None
            }
        }
    }
}

impl<T: CatalogTransport> MetadataSource for RawgProvider<T> {
    fn fetch(
        &self,
        query: Option<&str>,
        existing_id: Option<u64>,
        options: NotifyOptions,
    ) -> Option<ExternalMetadata> {
        if let Err(err) = self.transport.ready() {
            self.notifier.error(options, err.to_string());
            return None;
        }

        let query = query.map(str::trim).filter(|query| !query.is_empty());
        let kind = query.map(classify);

        let mut found = None;
        match kind {
            Some(QueryKind::Id(id)) => {
                found = self.attempt(
                    options,
                    &format!("ID {id}"),
                    Some("Trying other methods..."),
                    || self.lookup(id),
                );
            }
            Some(QueryKind::OversizedId) => {
                self.notifier.error(
                    options,
                    format!("'{}' is not a valid game ID.", query.unwrap_or_default()),
                );
            }
            _ => {}
        }

        if found.is_none() && query.is_none() {
            if let Some(id) = existing_id.filter(|id| *id > 0) {
                found = self.attempt(
                    options,
                    &format!("existing ID {id}"),
                    Some("No further attempts."),
                    || self.lookup(id),
                );
            }
        }

        if found.is_none() {
            if let Some(QueryKind::Search(name)) = kind {
                found = self.attempt(
                    options,
                    &format!("name search '{name}'"),
                    None,
                    || self.search(name),
                );
            }
        }

        found
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notice;
    use serde_json::json;
    use std::{cell::RefCell, collections::HashMap};

    /// Replays canned responses keyed by `path?search` and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: HashMap<String, Value>,
        failures: HashMap<String, u16>,
        calls: RefCell<Vec<String>>,
        missing_key: bool,
    }

    impl ScriptedTransport {
        fn respond(mut self, key: &str, body: Value) -> Self {
            self.responses.insert(key.to_string(), body);
            self
        }

        fn fail(mut self, key: &str, status: u16) -> Self {
            self.failures.insert(key.to_string(), status);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CatalogTransport for ScriptedTransport {
        fn ready(&self) -> Result<(), ProviderError> {
            if self.missing_key {
                Err(ProviderError::MissingApiKey)
            } else {
                Ok(())
            }
        }

        fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
            let key = match query {
                [("search", text)] => format!("{path}?{text}"),
                _ => path.to_string(),
            };
            self.calls.borrow_mut().push(key.clone());
            if let Some(status) = self.failures.get(&key) {
                return Err(ProviderError::Status(*status, "error".to_string()));
            }
            self.responses
                .get(&key)
                .cloned()
                .ok_or_else(|| ProviderError::Status(404, "Not found.".to_string()))
        }
    }

    fn detail(id: u64, name: &str) -> Value {
        json!({"id": id, "name": name, "description_raw": "desc"})
    }

    fn provider(transport: ScriptedTransport) -> RawgProvider<ScriptedTransport> {
        RawgProvider::new(transport, Notifier::disabled())
    }

    #[test]
    fn numeric_query_looks_up_id_directly() {
        let provider = provider(ScriptedTransport::default().respond("games/3498", detail(3498, "GTA V")));
        let metadata = provider
            .fetch(Some(" 3498 "), Some(1), NotifyOptions::SILENT)
            .expect("lookup succeeds");
        assert_eq!(metadata.name, "GTA V");
        assert_eq!(provider.transport.calls(), vec!["games/3498"]);
    }

    #[test]
    fn unknown_numeric_id_ends_without_fallback() {
        let provider = provider(ScriptedTransport::default());
        assert!(provider
            .fetch(Some("9999999999999"), Some(42), NotifyOptions::SILENT)
            .is_none());
        assert_eq!(provider.transport.calls(), vec!["games/9999999999999"]);
    }

    #[test]
    fn empty_query_uses_existing_id() {
        let provider = provider(ScriptedTransport::default().respond("games/42", detail(42, "Halo")));
        let metadata = provider
            .fetch(Some("   "), Some(42), NotifyOptions::SILENT)
            .expect("existing id");
        assert_eq!(metadata.rawg_id, Some(42));
    }

    #[test]
    fn text_query_searches_then_fetches_detail() {
        let provider = provider(
            ScriptedTransport::default()
                .respond("games?Halo Infinite", json!({"results": [{"id": 7}, {"id": 8}]}))
                .respond("games/7", detail(7, "Halo Infinite")),
        );
        let metadata = provider
            .fetch(Some("Halo Infinite"), Some(99), NotifyOptions::SILENT)
            .expect("search succeeds");
        assert_eq!(metadata.name, "Halo Infinite");
        assert_eq!(provider.transport.calls(), vec!["games?Halo Infinite", "games/7"]);
    }

    #[test]
    fn zero_is_searched_as_text() {
        let provider = provider(ScriptedTransport::default().respond("games?0", json!({"results": []})));
        assert!(provider.fetch(Some("0"), None, NotifyOptions::SILENT).is_none());
        assert_eq!(provider.transport.calls(), vec!["games?0"]);
    }

    #[test]
    fn failures_surface_as_absent_results() {
        let (notifier, mut receiver) = Notifier::channel();
        let transport = ScriptedTransport::default().fail("games?Halo", 500);
        let provider = RawgProvider::new(transport, notifier);

        assert!(provider.fetch(Some("Halo"), None, NotifyOptions::LOUD).is_none());
        let notices: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();
        assert!(matches!(notices.last(), Some(Notice::Error(message)) if message.contains("HTTP 500")));
    }

    #[test]
    fn empty_detail_payload_is_not_found() {
        let provider = provider(ScriptedTransport::default().respond("games/5", json!({})));
        assert!(matches!(provider.lookup(5), Err(ProviderError::NotFound(_))));
    }

    #[test]
    fn missing_api_key_makes_no_requests() {
        let provider = provider(ScriptedTransport {
            missing_key: true,
            ..ScriptedTransport::default()
        });
        assert!(provider.fetch(Some("Halo"), None, NotifyOptions::SILENT).is_none());
        assert!(provider.transport.calls().is_empty());
    }

    #[test]
    fn metadata_patch_leaves_release_fields_alone() {
        let patch = RecordPatch::from(ExternalMetadata {
            name: "Halo".to_string(),
            ..ExternalMetadata::default()
        });
        assert_eq!(patch.name.as_deref(), Some("Halo"));
        assert_eq!(patch.original_torrent_name, None);
        assert_eq!(patch.magnet, None);
        assert_eq!(patch.rawg_id, Some(None));
    }
}
