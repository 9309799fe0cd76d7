use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved snippet scoped to one query and one collection.
///
/// `rerank_score` and `rank` are only set once the candidate has passed
/// through the reranker, and are only comparable against candidates ranked
/// for the same query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub source_collection: String,
    /// Score reported by the collection (vector distance based).
    pub raw_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Candidate {
    pub fn new(text: impl Into<String>, source_collection: impl Into<String>, raw_score: f32) -> Self {
        Self {
            text: text.into(),
            source_collection: source_collection.into(),
            raw_score,
            rerank_score: None,
            rank: None,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Marks the candidate as ranked at position `rank` (0-based) with `score`.
    pub fn with_rank(mut self, rank: usize, score: f32) -> Self {
        self.rank = Some(rank);
        self.rerank_score = Some(score);
        self
    }

    /// Rerank score when present, otherwise the collection's raw score.
    pub fn relevance(&self) -> f32 {
        self.rerank_score.unwrap_or(self.raw_score)
    }
}

/// Mean [`Candidate::relevance`], or `0.0` for an empty slice.
pub fn mean_relevance(candidates: &[Candidate]) -> f32 {
    if candidates.is_empty() {
        return 0.0;
    }
    candidates.iter().map(Candidate::relevance).sum::<f32>() / candidates.len() as f32
}

/// Read-only snapshot of reranker telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankerStats {
    pub total_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub fallback_count: u64,
    pub latency_samples: usize,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub latency_target_ms: f64,
    /// Fraction of sampled calls at or under `latency_target_ms`.
    pub target_met_rate: f64,
    /// First model invocation, kept out of the window.
    pub cold_start_ms: Option<f64>,
    pub model_loaded: bool,
}
