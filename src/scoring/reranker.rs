use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheLookup, RerankCache};
use crate::constants::NEUTRAL_SCORE;
use crate::embedding::{CrossEncoder, CrossEncoderConfig, CrossEncoderError, PairScorer};
use crate::hashing::rerank_cache_key;
use crate::outcome::Outcome;

use super::config::RerankerConfig;
use super::error::ScoringError;
use super::telemetry::LatencyTelemetry;
use super::types::{Candidate, RerankerStats};

/// Process-wide state shared by every request. One lock covers all of it.
struct SharedState {
    cache: RerankCache,
    telemetry: LatencyTelemetry,
    total_calls: u64,
    fallbacks: u64,
}

/// Cross-encoder reranker with a shared result cache and latency telemetry.
///
/// Per call it is stateless; the only state is the cache and the metrics
/// accumulator, both mutated under a single [`parking_lot::Mutex`]. Scoring
/// itself runs without the lock held.
///
/// # Cache staleness
///
/// The cache key is the normalized query text plus the candidate *count*.
/// Reranking the same query against a different candidate set of the same
/// size returns the previously cached ranking until the entry is evicted or
/// [`Reranker::clear_cache`] is called.
pub struct Reranker {
    scorer: Arc<dyn PairScorer>,
    config: RerankerConfig,
    shared: Mutex<SharedState>,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("config", &self.config)
            .field("model_loaded", &self.scorer.is_model_loaded())
            .finish()
    }
}

impl Reranker {
    pub fn new(scorer: Arc<dyn PairScorer>, config: RerankerConfig) -> Result<Self, ScoringError> {
        config
            .validate()
            .map_err(|reason| ScoringError::InvalidConfig { reason })?;
        Ok(Self::build(scorer, config))
    }

    /// Loads a [`CrossEncoder`] and wraps it.
    pub fn load(
        encoder_config: CrossEncoderConfig,
        config: RerankerConfig,
    ) -> Result<Self, ScoringError> {
        let encoder = CrossEncoder::load(encoder_config)?;
        Self::new(Arc::new(encoder), config)
    }

    /// Lexical-scorer reranker with default settings.
    pub fn stub() -> Self {
        Self::build(Arc::new(CrossEncoder::stub()), RerankerConfig::default())
    }

    fn build(scorer: Arc<dyn PairScorer>, config: RerankerConfig) -> Self {
        let shared = SharedState {
            cache: RerankCache::with_capacity(config.cache_capacity),
            telemetry: LatencyTelemetry::new(config.latency_window, config.latency_target_ms),
            total_calls: 0,
            fallbacks: 0,
        };

        Self {
            scorer,
            config,
            shared: Mutex::new(shared),
        }
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    pub fn is_model_loaded(&self) -> bool {
        self.scorer.is_model_loaded()
    }

    /// Returns the `top_k` most relevant candidates, best first.
    ///
    /// Each returned candidate carries its `rerank_score` and 0-based `rank`.
    /// Ties keep their input order. An empty input yields an empty list.
    /// If the scoring model fails the input order is kept, truncated to
    /// `top_k`, with every score set to [`NEUTRAL_SCORE`], and the result
    /// is [`Outcome::Degraded`]. `top_k == 0` is [`Outcome::Failed`].
    pub fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Outcome<Vec<Candidate>> {
        let started = Instant::now();

        if top_k == 0 {
            return Outcome::failed("top_k must be at least 1");
        }

        if candidates.is_empty() {
            self.record_call(started, false, 0);
            return Outcome::Ok(Vec::new());
        }

        let key = rerank_cache_key(query, candidates.len());
        let lookup = self.shared.lock().cache.lookup(key);

        if let CacheLookup::Hit(mut ranked) = lookup {
            ranked.truncate(top_k);
            debug!(
                query_len = query.len(),
                returned = ranked.len(),
                "Rerank cache hit"
            );
            self.record_call(started, false, 0);
            return Outcome::Ok(ranked);
        }

        let outcome = self.score_and_cache(query, Some(key), candidates, top_k);
        let fallbacks = u64::from(outcome.is_degraded());
        self.record_call(started, true, fallbacks);

        outcome
    }

    /// [`Reranker::rerank`] without reading or writing the cache.
    ///
    /// For callers that rank one query against several candidate sets of
    /// the same size, where the count-based key would serve one set's
    /// ranking for another. Telemetry is still recorded.
    pub fn rerank_uncached(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Outcome<Vec<Candidate>> {
        let started = Instant::now();

        if top_k == 0 {
            return Outcome::failed("top_k must be at least 1");
        }

        if candidates.is_empty() {
            self.record_call(started, false, 0);
            return Outcome::Ok(Vec::new());
        }

        let outcome = self.score_and_cache(query, None, candidates, top_k);
        let fallbacks = u64::from(outcome.is_degraded());
        self.record_call(started, true, fallbacks);

        outcome
    }

    /// Reranks several queries with one batched model invocation.
    ///
    /// Equivalent to calling [`Reranker::rerank`] per query. Cached queries
    /// are served from the cache; the rest are scored together. If the
    /// batched invocation fails, each remaining query is reranked on its own
    /// (and may degrade individually) instead of failing the whole call.
    pub fn rerank_batch(
        &self,
        queries: &[&str],
        candidates_per_query: Vec<Vec<Candidate>>,
        top_k: usize,
    ) -> Vec<Outcome<Vec<Candidate>>> {
        let started = Instant::now();

        if queries.len() != candidates_per_query.len() {
            let reason = format!(
                "got {} queries but {} candidate lists",
                queries.len(),
                candidates_per_query.len()
            );
            return queries.iter().map(|_| Outcome::failed(&reason)).collect();
        }

        if top_k == 0 {
            return queries
                .iter()
                .map(|_| Outcome::failed("top_k must be at least 1"))
                .collect();
        }

        let mut results: Vec<Option<Outcome<Vec<Candidate>>>> =
            (0..queries.len()).map(|_| None).collect();
        let mut pending: Vec<(usize, u64, Vec<Candidate>)> = Vec::new();

        {
            let mut shared = self.shared.lock();
            for (idx, (query, candidates)) in
                queries.iter().zip(candidates_per_query).enumerate()
            {
                if candidates.is_empty() {
                    results[idx] = Some(Outcome::Ok(Vec::new()));
                    continue;
                }

                let key = rerank_cache_key(query, candidates.len());
                match shared.cache.lookup(key) {
                    CacheLookup::Hit(mut ranked) => {
                        ranked.truncate(top_k);
                        results[idx] = Some(Outcome::Ok(ranked));
                    }
                    CacheLookup::Miss => pending.push((idx, key, candidates)),
                }
            }
        }

        let invoked_model = !pending.is_empty();
        let mut fallbacks = 0u64;

        if invoked_model {
            let scored = {
                let pairs: Vec<(&str, &str)> = pending
                    .iter()
                    .flat_map(|(idx, _, candidates)| {
                        candidates
                            .iter()
                            .map(move |c| (queries[*idx], c.text.as_str()))
                    })
                    .collect();
                self.score_checked(&pairs)
            };

            match scored {
                Ok(scores) => {
                    let mut offset = 0;
                    let mut shared = self.shared.lock();
                    for (idx, key, candidates) in pending {
                        let count = candidates.len();
                        let ranked = rank_by_scores(candidates, &scores[offset..offset + count]);
                        offset += count;

                        shared.cache.insert(key, ranked.clone());
                        results[idx] = Some(Outcome::Ok(truncated(ranked, top_k)));
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        queries = pending.len(),
                        "Batched rerank failed, falling back to per-query reranking"
                    );
                    for (idx, key, candidates) in pending {
                        let outcome = self.score_and_cache(queries[idx], Some(key), candidates, top_k);
                        fallbacks += u64::from(outcome.is_degraded());
                        results[idx] = Some(outcome);
                    }
                }
            }
        }

        self.record_call(started, invoked_model, fallbacks);

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Outcome::failed("query was not ranked")))
            .collect()
    }

    /// Atomically drops all cached rankings and resets hit/miss counters.
    pub fn clear_cache(&self) {
        self.shared.lock().cache.clear();
        debug!("Rerank cache cleared");
    }

    /// Read-only snapshot; never resets anything.
    pub fn get_stats(&self) -> RerankerStats {
        let shared = self.shared.lock();
        RerankerStats {
            total_calls: shared.total_calls,
            cache_hits: shared.cache.hits(),
            cache_misses: shared.cache.misses(),
            cache_hit_rate: shared.cache.hit_rate(),
            cache_size: shared.cache.len(),
            cache_capacity: shared.cache.capacity(),
            fallback_count: shared.fallbacks,
            latency_samples: shared.telemetry.len(),
            p50_ms: shared.telemetry.percentile(50.0),
            p95_ms: shared.telemetry.percentile(95.0),
            p99_ms: shared.telemetry.percentile(99.0),
            latency_target_ms: shared.telemetry.target_ms(),
            target_met_rate: shared.telemetry.target_met_rate(),
            cold_start_ms: shared.telemetry.cold_start_ms(),
            model_loaded: self.scorer.is_model_loaded(),
        }
    }

    fn score_checked(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError> {
        let scores = self.scorer.score_pairs(pairs)?;
        if scores.len() != pairs.len() {
            return Err(CrossEncoderError::ScoreCountMismatch {
                expected: pairs.len(),
                actual: scores.len(),
            });
        }
        Ok(scores)
    }

    /// Scores one query; caches the full ranking under `key` on success.
    fn score_and_cache(
        &self,
        query: &str,
        key: Option<u64>,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Outcome<Vec<Candidate>> {
        let scored = {
            let pairs: Vec<(&str, &str)> = candidates
                .iter()
                .map(|c| (query, c.text.as_str()))
                .collect();
            self.score_checked(&pairs)
        };

        match scored {
            Ok(scores) => {
                let ranked = rank_by_scores(candidates, &scores);
                if let Some(key) = key {
                    self.shared.lock().cache.insert(key, ranked.clone());
                }
                debug!(
                    candidates = ranked.len(),
                    top_score = ranked.first().and_then(|c| c.rerank_score),
                    "Rerank complete"
                );
                Outcome::Ok(truncated(ranked, top_k))
            }
            Err(e) => {
                warn!(error = %e, "Cross-encoder failed, returning neutral ordering");
                Outcome::degraded(
                    neutral_ranking(candidates, top_k),
                    format!("scoring model failed: {e}"),
                )
            }
        }
    }

    fn record_call(&self, started: Instant, invoked_model: bool, fallbacks: u64) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        let mut shared = self.shared.lock();
        shared.total_calls += 1;
        shared.fallbacks += fallbacks;

        if invoked_model && !shared.telemetry.has_cold_start() {
            shared.telemetry.record_cold_start(elapsed_ms);
        } else {
            shared.telemetry.record(elapsed_ms);
        }
    }
}

/// Stable descending sort by score; ties keep input order.
fn rank_by_scores(candidates: Vec<Candidate>, scores: &[f32]) -> Vec<Candidate> {
    let mut scored: Vec<(Candidate, f32)> = candidates
        .into_iter()
        .zip(scores.iter().map(|s| if s.is_nan() { 0.0 } else { *s }))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .enumerate()
        .map(|(rank, (candidate, score))| candidate.with_rank(rank, score))
        .collect()
}

fn truncated(mut ranked: Vec<Candidate>, top_k: usize) -> Vec<Candidate> {
    ranked.truncate(top_k);
    ranked
}

/// Input order, truncated to `top_k`, every score [`NEUTRAL_SCORE`].
pub(crate) fn neutral_ranking(candidates: Vec<Candidate>, top_k: usize) -> Vec<Candidate> {
    candidates
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(rank, candidate)| candidate.with_rank(rank, NEUTRAL_SCORE))
        .collect()
}

/// Cloneable handle that runs reranking on the blocking thread pool.
///
/// Scoring is CPU/accelerator bound, so async callers go through
/// [`tokio::task::spawn_blocking`] rather than scoring on the runtime.
#[derive(Clone)]
pub struct RerankerHandle {
    inner: Arc<Reranker>,
}

impl RerankerHandle {
    pub fn new(reranker: Reranker) -> Self {
        Self {
            inner: Arc::new(reranker),
        }
    }

    pub fn from_arc(inner: Arc<Reranker>) -> Self {
        Self { inner }
    }

    pub fn stub() -> Self {
        Self::new(Reranker::stub())
    }

    pub fn reranker(&self) -> &Reranker {
        &self.inner
    }

    /// Async [`Reranker::rerank`]; a failed blocking task degrades to the
    /// neutral ordering.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Outcome<Vec<Candidate>> {
        let inner = Arc::clone(&self.inner);
        let query = query.to_string();
        let fallback = candidates.clone();

        match tokio::task::spawn_blocking(move || inner.rerank(&query, candidates, top_k)).await {
            Ok(outcome) => outcome,
            Err(e) if top_k > 0 => {
                warn!(error = %e, "Rerank task failed, returning neutral ordering");
                Outcome::degraded(
                    neutral_ranking(fallback, top_k),
                    format!("scoring task failed: {e}"),
                )
            }
            Err(e) => Outcome::failed(format!("scoring task failed: {e}")),
        }
    }

    /// Async [`Reranker::rerank_uncached`].
    pub async fn rerank_uncached(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Outcome<Vec<Candidate>> {
        let inner = Arc::clone(&self.inner);
        let query = query.to_string();
        let fallback = candidates.clone();

        match tokio::task::spawn_blocking(move || inner.rerank_uncached(&query, candidates, top_k))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) if top_k > 0 => {
                warn!(error = %e, "Rerank task failed, returning neutral ordering");
                Outcome::degraded(
                    neutral_ranking(fallback, top_k),
                    format!("scoring task failed: {e}"),
                )
            }
            Err(e) => Outcome::failed(format!("scoring task failed: {e}")),
        }
    }

    /// Async [`Reranker::rerank_batch`].
    pub async fn rerank_batch(
        &self,
        queries: Vec<String>,
        candidates_per_query: Vec<Vec<Candidate>>,
        top_k: usize,
    ) -> Vec<Outcome<Vec<Candidate>>> {
        let inner = Arc::clone(&self.inner);
        let count = queries.len();
        let fallback = candidates_per_query.clone();

        let task = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = queries.iter().map(String::as_str).collect();
            inner.rerank_batch(&refs, candidates_per_query, top_k)
        });

        match task.await {
            Ok(outcomes) => outcomes,
            Err(e) if top_k > 0 && fallback.len() == count => {
                warn!(error = %e, "Batched rerank task failed, returning neutral orderings");
                fallback
                    .into_iter()
                    .map(|candidates| {
                        Outcome::degraded(
                            neutral_ranking(candidates, top_k),
                            format!("scoring task failed: {e}"),
                        )
                    })
                    .collect()
            }
            Err(e) => (0..count)
                .map(|_| Outcome::failed(format!("scoring task failed: {e}")))
                .collect(),
        }
    }

    pub fn get_stats(&self) -> RerankerStats {
        self.inner.get_stats()
    }

    pub fn clear_cache(&self) {
        self.inner.clear_cache();
    }

    /// Returns the number of strong references to the underlying reranker.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl std::fmt::Debug for RerankerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankerHandle")
            .field("strong_count", &self.strong_count())
            .finish()
    }
}
