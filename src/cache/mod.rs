//! Bounded LRU cache for reranker results.

pub mod rerank;


pub use rerank::{CacheLookup, RerankCache};
