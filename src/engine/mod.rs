//! Public entry point wiring routing, gather, reranking, research and
//! generation together.

mod builder;
pub mod error;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;
pub use error::EngineError;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::outcome::Outcome;
use crate::research::{ResearchLoop, ResearchResult};
use crate::routing::{Classification, PlannedCollection, Priority, ScenarioClassifier, ScenarioPlan};
use crate::scoring::{Candidate, RerankerHandle, RerankerStats};
use crate::synthesis::{OrchestratorStats, ScatterGatherSynthesizer, SynthesisResult};

/// Read-only snapshot of every component's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub reranker: RerankerStats,
    pub synthesis: OrchestratorStats,
    pub research: OrchestratorStats,
}

/// Built once at startup and shared across requests.
#[derive(Debug)]
pub struct Engine {
    classifier: ScenarioClassifier,
    synthesizer: ScatterGatherSynthesizer,
    research: ResearchLoop,
    reranker: RerankerHandle,
    registry: BTreeSet<String>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn classify(&self, query: &str) -> Classification {
        self.classifier.classify(query)
    }

    pub fn plan(&self, query: &str) -> ScenarioPlan {
        self.classifier.route(query)
    }

    /// Collections known at build time.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.registry.iter().map(String::as_str)
    }

    /// Single scatter-gather pass over the routed plan.
    pub async fn synthesize(&self, query: &str, user_level: u8) -> SynthesisResult {
        self.synthesizer.synthesize(query, user_level).await
    }

    /// Scatter-gather over an explicitly named scenario.
    pub async fn synthesize_for_scenario(
        &self,
        query: &str,
        user_level: u8,
        scenario: &str,
    ) -> Result<SynthesisResult, EngineError> {
        if self.classifier.table().scenario(scenario).is_none() {
            return Err(EngineError::UnknownScenario {
                name: scenario.to_string(),
            });
        }
        self.synthesizer
            .synthesize_for_scenario(query, user_level, scenario)
            .await
            .map_err(EngineError::from)
    }

    /// Iterative research over the routed plan and fallback order.
    pub async fn research(&self, query: &str, user_level: u8) -> ResearchResult {
        self.research.research(query, user_level).await
    }

    /// Iterative research restricted to `collections`, searched in order.
    pub async fn research_in<S: AsRef<str>>(
        &self,
        query: &str,
        user_level: u8,
        collections: &[S],
    ) -> Result<ResearchResult, EngineError> {
        if collections.is_empty() {
            return Err(EngineError::InvalidConfig {
                reason: "research_in needs at least one collection".to_string(),
            });
        }

        let mut order: Vec<PlannedCollection> = Vec::with_capacity(collections.len());
        for collection in collections.iter().map(AsRef::as_ref) {
            if !self.registry.contains(collection) {
                return Err(EngineError::UnknownCollection {
                    collection: collection.to_string(),
                });
            }
            if order.iter().any(|p| p.collection == collection) {
                continue;
            }
            order.push(PlannedCollection {
                collection: collection.to_string(),
                priority: Priority::Required,
                rationale: "requested by caller".to_string(),
            });
        }

        Ok(self
            .research
            .research_with_order(query, user_level, order)
            .await)
    }

    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Outcome<Vec<Candidate>> {
        self.reranker.rerank(query, candidates, top_k).await
    }

    pub async fn rerank_batch(
        &self,
        queries: Vec<String>,
        candidates_per_query: Vec<Vec<Candidate>>,
        top_k: usize,
    ) -> Vec<Outcome<Vec<Candidate>>> {
        self.reranker
            .rerank_batch(queries, candidates_per_query, top_k)
            .await
    }

    pub fn reranker(&self) -> &RerankerHandle {
        &self.reranker
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            reranker: self.reranker.get_stats(),
            synthesis: self.synthesizer.get_stats(),
            research: self.research.get_stats(),
        }
    }

    /// Logs final statistics and drops cached rankings.
    pub fn shutdown(&self) {
        let stats = self.get_stats();
        info!(
            rerank_calls = stats.reranker.total_calls,
            cache_hit_rate = stats.reranker.cache_hit_rate,
            p95_ms = stats.reranker.p95_ms,
            target_met_rate = stats.reranker.target_met_rate,
            syntheses = stats.synthesis.requests,
            research_sessions = stats.research.requests,
            "Engine shutting down"
        );
        self.reranker.clear_cache();
    }
}
