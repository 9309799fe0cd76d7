//! In-memory gateway for tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::GatewayError;
use super::{CollectionGateway, SearchHit};

/// One recorded `search` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSearch {
    pub query: String,
    pub collection: String,
    pub limit: usize,
    pub user_level: u8,
}

/// Serves canned hits per collection.
///
/// Collections can be scripted to fail or to answer slowly. Every search is
/// recorded so tests can assert on fan-out.
#[derive(Debug, Default)]
pub struct MockGateway {
    docs: BTreeMap<String, Vec<SearchHit>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    registry_down: bool,
    calls: Mutex<Vec<RecordedSearch>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `collection` with a fixed set of hits.
    pub fn with_collection(mut self, collection: &str, hits: Vec<SearchHit>) -> Self {
        self.docs.insert(collection.to_string(), hits);
        self
    }

    /// Registers `collection` with hits built from `(text, score)` pairs.
    pub fn with_texts(self, collection: &str, texts: &[(&str, f32)]) -> Self {
        let hits = texts
            .iter()
            .map(|(text, score)| SearchHit::new(*text, *score))
            .collect();
        self.with_collection(collection, hits)
    }

    /// Registers `collection` with no hits.
    pub fn with_empty(self, collection: &str) -> Self {
        self.with_collection(collection, Vec::new())
    }

    /// Every search against `collection` fails. The collection stays in the
    /// registry.
    pub fn with_failure(mut self, collection: &str) -> Self {
        self.docs.entry(collection.to_string()).or_default();
        self.failing.insert(collection.to_string());
        self
    }

    /// Every search against `collection` sleeps for `delay` first.
    pub fn with_delay(mut self, collection: &str, delay: Duration) -> Self {
        self.delays.insert(collection.to_string(), delay);
        self
    }

    /// `collections()` fails.
    pub fn with_registry_down(mut self) -> Self {
        self.registry_down = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedSearch> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Collections searched so far, in call order.
    pub fn searched_collections(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| c.collection.clone())
            .collect()
    }
}

#[async_trait]
impl CollectionGateway for MockGateway {
    async fn search(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
        user_level: u8,
    ) -> Result<Vec<SearchHit>, GatewayError> {
        self.calls.lock().push(RecordedSearch {
            query: query.to_string(),
            collection: collection.to_string(),
            limit,
            user_level,
        });

        if let Some(delay) = self.delays.get(collection) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(collection) {
            return Err(GatewayError::RequestFailed {
                collection: collection.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        let hits = self
            .docs
            .get(collection)
            .ok_or_else(|| GatewayError::UnknownCollection {
                collection: collection.to_string(),
            })?;

        Ok(hits.iter().take(limit).cloned().collect())
    }

    async fn collections(&self) -> Result<Vec<String>, GatewayError> {
        if self.registry_down {
            return Err(GatewayError::RegistryUnavailable {
                message: "scripted registry outage".to_string(),
            });
        }
        Ok(self.docs.keys().cloned().collect())
    }
}
