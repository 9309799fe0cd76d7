use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::constants::{
    COVERAGE_BONUS_PER_RESULT, FALLBACK_CONFIDENCE_FACTOR, FINDINGS_PER_STEP, MAX_COVERAGE_BONUS,
    MAX_FINDING_CHARS,
};
use crate::gateway::CollectionGateway;
use crate::generation::extract::truncate_chars;
use crate::generation::{ExtractedFields, TextGenerator};
use crate::outcome::Outcome;
use crate::routing::{PlannedCollection, Priority, ScenarioClassifier};
use crate::scoring::{Candidate, RerankerHandle, mean_relevance};
use crate::synthesis::{
    AnswerSource, Composition, ContextSection, OrchestratorStats, StatsRecorder, compose,
    fallback_text, query_collection,
};

use super::config::ResearchConfig;
use super::gap::{Evidence, analyze, expand_query};
use super::session::{ResearchSession, StepRecord};
use super::state::{ResearchState, StopReason};
use super::types::ResearchResult;

/// Sequential, gap-driven search across collections.
///
/// Each iteration searches one collection not yet searched, then stops on
/// high confidence, on sufficient evidence, or at the iteration cap, in
/// that order. A session never has more than one query in flight.
pub struct ResearchLoop {
    classifier: ScenarioClassifier,
    gateway: Arc<dyn CollectionGateway>,
    reranker: RerankerHandle,
    generator: Arc<dyn TextGenerator>,
    config: ResearchConfig,
    stats: StatsRecorder,
}

impl std::fmt::Debug for ResearchLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchLoop")
            .field("config", &self.config)
            .field("generator", &self.generator.model_name())
            .finish()
    }
}

impl ResearchLoop {
    pub fn new(
        classifier: ScenarioClassifier,
        gateway: Arc<dyn CollectionGateway>,
        reranker: RerankerHandle,
        generator: Arc<dyn TextGenerator>,
        config: ResearchConfig,
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

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    pub fn get_stats(&self) -> OrchestratorStats {
        self.stats.snapshot()
    }

    /// Researches `query` over the routed plan followed by the fallback
    /// order. Always produces a result.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn research(&self, query: &str, user_level: u8) -> ResearchResult {
        let order = self.classifier.research_order(query);
        self.run(query, user_level, order).await
    }

    /// Researches `query` over exactly `order`, in that order. Callers are
    /// responsible for checking the collections exist.
    #[instrument(skip(self, order), fields(query_len = query.len(), collections = order.len()))]
    pub async fn research_with_order(
        &self,
        query: &str,
        user_level: u8,
        order: Vec<PlannedCollection>,
    ) -> ResearchResult {
        self.run(query, user_level, order).await
    }

    async fn run(&self, query: &str, user_level: u8, order: Vec<PlannedCollection>) -> ResearchResult {
        let started = Instant::now();
        let scenario = self.classifier.classify(query).scenario;
        let domain = self.classifier.table();
        let synthesis = &self.config.synthesis;

        let mut session = ResearchSession::new();
        session.advance(ResearchState::Searching);
        session.note(format!(
            "Researching \"{}\" (scenario {}), {} candidate collections",
            query.trim(),
            scenario,
            order.len()
        ));

        let mut variant = query.to_string();
        let mut pending_rationale: Option<String> = None;
        let mut degraded: Vec<String> = Vec::new();

        let stop_reason = loop {
            let Some(next) = order.iter().find(|p| !session.has_searched(&p.collection)) else {
                session.advance(ResearchState::Exhausted);
                break StopReason::CollectionsExhausted;
            };

            let rationale = pending_rationale.take().unwrap_or_else(|| next.rationale.clone());
            let record = self
                .search_step(query, &variant, &next.collection, rationale, user_level, &mut degraded)
                .await;

            let step = session.push_step(record);
            let (step_number, step_results, step_confidence) =
                (step.step_number, step.results_found, step.confidence);
            let line = format!(
                "Step {}: searched {} for \"{}\" ({}), {} results, confidence {:.2}",
                step.step_number,
                step.collection,
                step.query_variant,
                step.rationale,
                step.results_found,
                step.confidence
            );
            session.note(line);

            debug!(
                session_id = %session.id(),
                step = step_number,
                collection = %next.collection,
                results = step_results,
                confidence = step_confidence,
                "Research step complete"
            );

            if step_confidence >= self.config.confidence_threshold {
                session.advance(ResearchState::Confident);
                break StopReason::HighConfidence;
            }

            let accumulated = session.accumulated_text();
            let gap = analyze(
                Evidence {
                    step_results,
                    step_relevance: step_confidence,
                    accumulated_text: &accumulated,
                    distinct_collections: session.distinct_collections(),
                },
                &self.config,
                &domain.uncertainty_markers,
            );

            let Some(gap) = gap else {
                session.advance(ResearchState::Confident);
                break StopReason::Sufficient;
            };

            if session.iterations() >= self.config.max_iterations {
                session.note(format!("Gap remains ({}), but iteration limit reached", gap.rationale));
                session.advance(ResearchState::Exhausted);
                break StopReason::IterationCap;
            }

            session.advance(ResearchState::GapFound);
            let variants = expand_query(query, &session.findings(), &domain.domain_terms);
            variant = variants.get(1).cloned().unwrap_or_else(|| query.to_string());
            session.note(format!(
                "Gap: {}; next query \"{}\"",
                gap.rationale, variant
            ));
            pending_rationale = Some(format!("gap: {}", gap.rationale));
            session.advance(ResearchState::Searching);
        };

        session.note(format!("Stopped: {}", stop_reason.describe()));
        session.advance(ResearchState::Synthesizing);

        let sections = self.sections(&session, &order);
        let (composition, answer_source) =
            match compose(self.generator.as_ref(), query, &sections, synthesis).await {
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

        let total_results = session.total_results();
        let overall_confidence =
            research_confidence(session.mean_step_confidence(), total_results, answer_source);

        session.advance(ResearchState::Done);
        let finished = session.finish();

        let degraded = (!degraded.is_empty()).then(|| degraded.join("; "));
        self.stats.record(
            &scenario,
            finished.consulted.len(),
            overall_confidence,
            degraded.is_some(),
        );

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            session_id = %finished.id,
            steps = finished.steps.len(),
            stop = ?stop_reason,
            confidence = overall_confidence,
            duration_ms,
            "Research complete"
        );

        ResearchResult {
            session_id: finished.id,
            original_query: query.to_string(),
            scenario,
            sources_consulted: finished.consulted,
            steps: finished.steps,
            stop_reason,
            final_state: finished.state,
            reasoning_trace: finished.trace,
            synthesized_text: composition.text,
            extracted_fields: composition.fields,
            overall_confidence,
            answer_source,
            degraded,
            total_results,
            duration_ms,
            created_at: Utc::now(),
        }
    }

    /// Queries one collection with `variant` and reranks against the
    /// original query so step confidences stay comparable. Step reranks
    /// bypass the cache: consecutive steps often return equally sized sets
    /// for the same query.
    async fn search_step(
        &self,
        query: &str,
        variant: &str,
        collection: &str,
        rationale: String,
        user_level: u8,
        degraded: &mut Vec<String>,
    ) -> StepRecord {
        let synthesis = &self.config.synthesis;
        let searched = query_collection(
            self.gateway.as_ref(),
            variant,
            collection,
            synthesis.search_limit,
            user_level,
            synthesis.collection_timeout,
        )
        .await;

        let (candidates, rationale, succeeded) = match searched {
            Ok(candidates) => (self.rank(query, candidates, degraded).await, rationale, true),
            Err(e) => {
                warn!(collection = collection, error = %e, "Research step query failed");
                degraded.push(format!("{collection} failed"));
                (Vec::new(), e.to_string(), false)
            }
        };

        let confidence = if candidates.is_empty() {
            0.0
        } else {
            mean_relevance(&candidates).clamp(0.0, 1.0)
        };

        let key_findings = candidates
            .iter()
            .take(FINDINGS_PER_STEP)
            .map(|c| truncate_chars(c.text.trim(), MAX_FINDING_CHARS))
            .collect();

        StepRecord {
            collection: collection.to_string(),
            query_variant: variant.to_string(),
            rationale,
            confidence,
            key_findings,
            candidates,
            succeeded,
        }
    }

    async fn rank(&self, query: &str, candidates: Vec<Candidate>, degraded: &mut Vec<String>) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }
        match self
            .reranker
            .rerank_uncached(query, candidates, self.config.synthesis.top_k)
            .await
        {
            Outcome::Ok(ranked) => ranked,
            Outcome::Degraded { value, reason } => {
                degraded.push(format!("rerank: {reason}"));
                value
            }
            Outcome::Failed { reason } => {
                degraded.push(format!("rerank: {reason}"));
                Vec::new()
            }
        }
    }

    /// One context section per productive step, in step order.
    fn sections(&self, session: &ResearchSession, order: &[PlannedCollection]) -> Vec<ContextSection> {
        let per_collection = self.config.synthesis.snippets_per_collection;
        session
            .evidence()
            .filter(|(_, candidates)| !candidates.is_empty())
            .map(|(step, candidates)| ContextSection {
                collection: step.collection.clone(),
                priority: order
                    .iter()
                    .find(|p| p.collection == step.collection)
                    .map_or(Priority::Fallback, |p| p.priority),
                snippets: candidates.iter().take(per_collection).cloned().collect(),
            })
            .collect()
    }
}

/// Mean step confidence plus a coverage bonus of
/// `min(0.2, 0.02 * total_results)`, scaled down for fallback answers and
/// clamped to `[0, 1]`.
pub fn research_confidence(mean_step_confidence: f32, total_results: usize, source: AnswerSource) -> f32 {
    if total_results == 0 {
        return 0.0;
    }

    let bonus = (COVERAGE_BONUS_PER_RESULT * total_results as f32).min(MAX_COVERAGE_BONUS);
    let mut confidence = (mean_step_confidence + bonus).clamp(0.0, 1.0);
    if source == AnswerSource::Fallback {
        confidence *= FALLBACK_CONFIDENCE_FACTOR;
    }

    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(0.0, 1.0)
}
