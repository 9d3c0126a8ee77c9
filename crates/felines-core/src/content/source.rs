//! Where content items come from.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Url;
use serde_json::json;
use tracing::debug;

use crate::catalog;
use crate::error::{ConfigError, ContentFetchError, CoreError};
use crate::storage::ContentConfig;

/// Request/response boundary for remote content. Returns the raw JSON body;
/// the cache decides which field matters.
pub trait ContentSource: Send + Sync {
    fn fetch(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ContentFetchError>> + Send;
}

/// `GET {base_url}/{key}` over HTTP.
pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpContentSource {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "content.base_url".into(),
            message,
        };
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid(format!("'{base_url}' cannot carry a path")).into());
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Custom(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Base URL with `key` appended as one percent-encoded path segment.
    pub fn url_for(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base always has path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        url
    }
}

impl ContentSource for HttpContentSource {
    async fn fetch(&self, key: &str) -> Result<serde_json::Value, ContentFetchError> {
        let url = self.url_for(key);
        debug!(%url, "requesting content");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContentFetchError::Request {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentFetchError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ContentFetchError::InvalidPayload {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

/// Offline source that rotates through the built-in facts.
#[derive(Debug, Default)]
pub struct StaticSource {
    next: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentSource for StaticSource {
    async fn fetch(&self, _key: &str) -> Result<serde_json::Value, ContentFetchError> {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % catalog::FACTS.len();
        let fact = catalog::FACTS[i];
        Ok(json!({ "fact": fact, "length": fact.len() }))
    }
}

/// Source chosen by configuration: network or built-in facts.
pub enum ConfiguredSource {
    Http(HttpContentSource),
    Static(StaticSource),
}

impl ConfiguredSource {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ContentConfig) -> Result<Self, CoreError> {
        if config.offline {
            return Ok(ConfiguredSource::Static(StaticSource::new()));
        }
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(ConfiguredSource::Http(HttpContentSource::new(&config.base_url, timeout)?))
    }
}

impl ContentSource for ConfiguredSource {
    async fn fetch(&self, key: &str) -> Result<serde_json::Value, ContentFetchError> {
        match self {
            ConfiguredSource::Http(source) => source.fetch(key).await,
            ConfiguredSource::Static(source) => source.fetch(key).await,
        }
    }
}
