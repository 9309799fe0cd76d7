//! HTTP client for a remote collection gateway.
//!
//! Wire format:
//! - `POST {base_url}/search` with `{query, collection, limit, user_level}`
//!   answers `{"results": [{"text", "score", "metadata"}]}`
//! - `GET {base_url}/collections` answers `{"collections": ["..."]}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::GatewayError;
use super::{CollectionGateway, SearchHit};

#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    /// Transport-level timeout per request. The engine applies its own
    /// per-collection timeout on top of this.
    pub request_timeout: Duration,
}

impl HttpGatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_millis(crate::constants::DEFAULT_GATEWAY_TIMEOUT_MS),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    collection: &'a str,
    limit: usize,
    user_level: u8,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct CollectionsResponse {
    collections: Vec<String>,
}

#[derive(Clone)]
pub struct HttpGateway {
    http: HttpClient,
    base_url: String,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::RegistryUnavailable {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_request_error(collection: &str, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                collection: collection.to_string(),
                timeout_ms: 0,
            }
        } else {
            GatewayError::RequestFailed {
                collection: collection.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl CollectionGateway for HttpGateway {
    async fn search(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
        user_level: u8,
    ) -> Result<Vec<SearchHit>, GatewayError> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            query,
            collection,
            limit,
            user_level,
        };

        let res = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_request_error(collection, e))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::UnknownCollection {
                collection: collection.to_string(),
            });
        }

        let res = res
            .error_for_status()
            .map_err(|e| Self::map_request_error(collection, e))?;

        let parsed: SearchResponse =
            res.json()
                .await
                .map_err(|e| GatewayError::InvalidResponse {
                    collection: collection.to_string(),
                    message: e.to_string(),
                })?;

        debug!(
            collection = collection,
            hits = parsed.results.len(),
            "Gateway search complete"
        );

        let mut hits = parsed.results;
        hits.truncate(limit);
        Ok(hits)
    }

    async fn collections(&self) -> Result<Vec<String>, GatewayError> {
        let url = format!("{}/collections", self.base_url);

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GatewayError::RegistryUnavailable {
                message: e.to_string(),
            })?;

        let parsed: CollectionsResponse =
            res.json()
                .await
                .map_err(|e| GatewayError::RegistryUnavailable {
                    message: e.to_string(),
                })?;

        Ok(parsed.collections)
    }
}
