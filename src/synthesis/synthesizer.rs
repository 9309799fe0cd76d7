use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::constants::{FALLBACK_CONFIDENCE_FACTOR, RELEVANCE_WEIGHT};
use crate::gateway::CollectionGateway;
use crate::generation::{ExtractedFields, TextGenerator};
use crate::outcome::Outcome;
use crate::routing::{RoutingError, ScenarioClassifier, ScenarioPlan};
use crate::scoring::{Candidate, RerankerHandle, mean_relevance};

use super::config::SynthesisConfig;
use super::context::{Composition, build_sections, compose, fallback_text};
use super::gather::scatter;
use super::stats::StatsRecorder;
use super::types::{AnswerSource, OrchestratorStats, SynthesisResult};

/// Single-pass scatter-gather over a routed collection plan.
pub struct ScatterGatherSynthesizer {
    classifier: ScenarioClassifier,
    gateway: Arc<dyn CollectionGateway>,
    reranker: RerankerHandle,
    generator: Arc<dyn TextGenerator>,
    config: SynthesisConfig,
    stats: StatsRecorder,
}

impl std::fmt::Debug for ScatterGatherSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatterGatherSynthesizer")
            .field("config", &self.config)
            .field("generator", &self.generator.model_name())
            .finish()
    }
}

impl ScatterGatherSynthesizer {
    pub fn new(
        classifier: ScenarioClassifier,
        gateway: Arc<dyn CollectionGateway>,
        reranker: RerankerHandle,
        generator: Arc<dyn TextGenerator>,
        config: SynthesisConfig,
    ) -> Self {
        Self {
            classifier,
            gateway,
            reranker,
            generator,
            config,
            stats: StatsRecorder::new(),
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ScenarioClassifier {
        &self.classifier
    }

    /// Classifies `query`, gathers from its plan and answers.
    ///
    /// Never fails: collection errors shrink the evidence, reranker errors
    /// fall back to input order, and generation errors fall back to a
    /// deterministic answer.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn synthesize(&self, query: &str, user_level: u8) -> SynthesisResult {
        let plan = self.classifier.route(query);
        self.run(query, user_level, plan).await
    }

    /// Like [`ScatterGatherSynthesizer::synthesize`] with a caller-chosen
    /// scenario. Unknown scenarios are rejected.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn synthesize_for_scenario(
        &self,
        query: &str,
        user_level: u8,
        scenario: &str,
    ) -> Result<SynthesisResult, RoutingError> {
        let plan = self.classifier.plan_strict(query, scenario)?;
        Ok(self.run(query, user_level, plan).await)
    }

    pub fn get_stats(&self) -> OrchestratorStats {
        self.stats.snapshot()
    }

    async fn run(&self, query: &str, user_level: u8, plan: ScenarioPlan) -> SynthesisResult {
        let started = Instant::now();
        let session_id = Uuid::new_v4();

        debug!(
            %session_id,
            scenario = %plan.scenario_type,
            collections = ?plan.collection_names().collect::<Vec<_>>(),
            "Planned scatter-gather"
        );

        let gathered = scatter(
            self.gateway.as_ref(),
            query,
            &plan.collections,
            user_level,
            self.config.search_limit,
            self.config.collection_timeout,
        )
        .await;

        let sources_consulted: Vec<String> = gathered.succeeded().map(str::to_string).collect();
        let collections_failed: Vec<String> = gathered.failed().map(str::to_string).collect();
        let mut degraded = Vec::new();
        if !collections_failed.is_empty() {
            degraded.push(format!("collections failed: {}", collections_failed.join(", ")));
        }

        let candidates = match self.select(query, gathered.candidates, &sources_consulted).await {
            Outcome::Ok(ranked) => ranked,
            Outcome::Degraded { value, reason } => {
                degraded.push(format!("rerank: {reason}"));
                value
            }
            Outcome::Failed { reason } => {
                warn!(%reason, "Rerank failed, answering without candidates");
                degraded.push(format!("rerank: {reason}"));
                Vec::new()
            }
        };

        let sections = build_sections(&candidates, &plan.collections, self.config.snippets_per_collection);
        let composition = compose(self.generator.as_ref(), query, &sections, &self.config).await;

        let (composition, answer_source) = match composition {
            Outcome::Ok(composition) => (composition, AnswerSource::Model),
            Outcome::Degraded { value, reason } => {
                degraded.push(reason);
                (value, AnswerSource::Fallback)
            }
            Outcome::Failed { reason } => {
                degraded.push(reason);
                (
                    Composition {
                        text: fallback_text(query, &sections),
                        fields: ExtractedFields::default(),
                    },
                    AnswerSource::Fallback,
                )
            }
        };

        let coverage = sources_consulted.len() as f32 / plan.len().max(1) as f32;
        let overall_confidence = synthesis_confidence(&candidates, coverage, answer_source);

        let degraded = (!degraded.is_empty()).then(|| degraded.join("; "));
        self.stats.record(
            &plan.scenario_type,
            sources_consulted.len(),
            overall_confidence,
            degraded.is_some(),
        );

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            %session_id,
            scenario = %plan.scenario_type,
            consulted = sources_consulted.len(),
            failed = collections_failed.len(),
            confidence = overall_confidence,
            duration_ms,
            "Synthesis complete"
        );

        SynthesisResult {
            session_id,
            original_query: query.to_string(),
            scenario: plan.scenario_type,
            scenario_confidence: plan.confidence,
            sources_consulted,
            collections_failed,
            collection_outcomes: gathered.outcomes,
            candidates,
            synthesized_text: composition.text,
            extracted_fields: composition.fields,
            overall_confidence,
            answer_source,
            degraded,
            duration_ms,
            created_at: Utc::now(),
        }
    }

    /// Reranks only when the merged set exceeds `top_k`.
    ///
    /// A cache hit may carry candidates from a collection that did not
    /// answer this request; such a ranking is discarded and the merged set
    /// is scored again without the cache.
    async fn select(
        &self,
        query: &str,
        merged: Vec<Candidate>,
        consulted: &[String],
    ) -> Outcome<Vec<Candidate>> {
        if merged.len() <= self.config.top_k {
            return Outcome::Ok(merged);
        }

        let outcome = self
            .reranker
            .rerank(query, merged.clone(), self.config.top_k)
            .await;

        let foreign = outcome.value().is_some_and(|ranked| {
            ranked
                .iter()
                .any(|c| !consulted.iter().any(|name| *name == c.source_collection))
        });
        if !foreign {
            return outcome;
        }

        debug!("Cached ranking names collections outside this gather, rescoring");
        self.reranker
            .rerank_uncached(query, merged, self.config.top_k)
            .await
    }
}

/// `relevance * 0.7 + coverage * 0.3`, scaled down for fallback answers and
/// clamped to `[0, 1]`. No candidates means zero confidence.
pub fn synthesis_confidence(candidates: &[Candidate], coverage: f32, source: AnswerSource) -> f32 {
    if candidates.is_empty() {
        return 0.0;
    }

    let relevance = mean_relevance(candidates).clamp(0.0, 1.0);
    let mut confidence = relevance * RELEVANCE_WEIGHT + coverage.clamp(0.0, 1.0) * (1.0 - RELEVANCE_WEIGHT);
    if source == AnswerSource::Fallback {
        confidence *= FALLBACK_CONFIDENCE_FACTOR;
    }

    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(0.0, 1.0)
}
