use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use super::ProviderSettings;
use crate::error::ProviderError;

const USER_AGENT: &str = concat!("gamecat/", env!("CARGO_PKG_VERSION"));

/// Issues GET requests against the games database and returns the JSON body.
///
/// `path` is relative to the API root, e.g. `games/3498`.
pub trait CatalogTransport {
    /// Fail fast when the transport cannot issue requests at all.
    fn ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Fetch `path` with the given query parameters.
    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError>;
}

/// Blocking HTTP transport authenticated with an API key query parameter.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Build a client using the configured timeout.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

impl CatalogTransport for HttpTransport {
    fn ready(&self) -> Result<(), ProviderError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ProviderError::MissingApiKey),
        }
    }

    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut params = vec![("key", key)];
        params.extend_from_slice(query);

        debug!(url = %url, "querying games database");
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status(status.as_u16(), body));
        }

        response
            .json()
            .map_err(|err| ProviderError::Parse(err.to_string()))
    }
}
