use std::time::Duration;

use crate::constants::{
    DEFAULT_GATEWAY_TIMEOUT_MS, DEFAULT_GENERATION_TIMEOUT_MS, DEFAULT_MAX_TOKENS,
    DEFAULT_SEARCH_LIMIT, DEFAULT_SNIPPETS_PER_COLLECTION, DEFAULT_TOP_K,
};

/// Settings shared by single-pass synthesis and the final research answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    /// Results requested from each collection.
    pub search_limit: usize,
    /// Merged candidates kept after reranking.
    pub top_k: usize,
    pub snippets_per_collection: usize,
    /// Independent timeout for each collection query.
    pub collection_timeout: Duration,
    pub max_tokens: u32,
    pub generation_timeout: Duration,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
            top_k: DEFAULT_TOP_K,
            snippets_per_collection: DEFAULT_SNIPPETS_PER_COLLECTION,
            collection_timeout: Duration::from_millis(DEFAULT_GATEWAY_TIMEOUT_MS),
            max_tokens: DEFAULT_MAX_TOKENS,
            generation_timeout: Duration::from_millis(DEFAULT_GENERATION_TIMEOUT_MS),
        }
    }
}

impl SynthesisConfig {
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_snippets_per_collection(mut self, snippets: usize) -> Self {
        self.snippets_per_collection = snippets;
        self
    }

    pub fn with_collection_timeout(mut self, timeout: Duration) -> Self {
        self.collection_timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.search_limit == 0 {
            return Err("search_limit must be > 0".to_string());
        }
        if self.top_k == 0 {
            return Err("top_k must be > 0".to_string());
        }
        if self.snippets_per_collection == 0 {
            return Err("snippets_per_collection must be > 0".to_string());
        }
        if self.collection_timeout.is_zero() {
            return Err("collection_timeout must be > 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be > 0".to_string());
        }
        if self.generation_timeout.is_zero() {
            return Err("generation_timeout must be > 0".to_string());
        }
        Ok(())
    }
}
