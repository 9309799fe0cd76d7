//! Uniform search interface over independently queryable collections.
//!
//! The gateway itself is an external service; this module defines the
//! contract the engine consumes plus an HTTP client and an in-memory mock.

pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::GatewayError;
pub use http::{HttpGateway, HttpGatewayConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockGateway, RecordedSearch};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scoring::Candidate;

/// One raw result from a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchHit {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
            metadata: Map::new(),
        }
    }

    /// Attaches provenance: the hit becomes a [`Candidate`] of `collection`.
    pub fn into_candidate(self, collection: &str) -> Candidate {
        Candidate::new(self.text, collection, self.score).with_metadata(self.metadata)
    }
}

#[async_trait]
/// Search over named knowledge collections.
///
/// Implementations must return an empty list (not an error) when a
/// collection has no results, and must either answer within a bounded time
/// or fail with [`GatewayError::Timeout`].
pub trait CollectionGateway: Send + Sync {
    /// Returns up to `limit` hits from `collection`, visible at `user_level`.
    async fn search(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
        user_level: u8,
    ) -> Result<Vec<SearchHit>, GatewayError>;

    /// Names of every collection the gateway serves.
    async fn collections(&self) -> Result<Vec<String>, GatewayError>;
}
