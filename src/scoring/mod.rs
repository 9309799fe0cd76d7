//! Relevance reranking of retrieved candidates.
//!
//! [`Reranker`] scores (query, candidate) pairs with a
//! [`PairScorer`](crate::embedding::PairScorer), keeps a process-wide LRU of
//! ranked results and a rolling latency window, and never surfaces a model
//! failure to its caller: a failing scorer yields the input order with
//! neutral scores as an [`Outcome::Degraded`](crate::outcome::Outcome).
//!
//! Async callers use [`RerankerHandle`], which moves scoring onto the
//! blocking thread pool.

pub mod config;
pub mod error;
pub mod reranker;
pub mod telemetry;
pub mod types;


pub use config::RerankerConfig;
pub use error::ScoringError;
pub use reranker::{Reranker, RerankerHandle};
pub use telemetry::LatencyTelemetry;
pub use types::{Candidate, RerankerStats, mean_relevance};
