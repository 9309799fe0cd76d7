use std::sync::Arc;

use super::*;
use crate::embedding::{CrossEncoderError, PairScorer};
use crate::gateway::{MockGateway, SearchHit};
use crate::generation::MockGenerator;
use crate::routing::{PlannedCollection, Priority, RoutingTable, ScenarioClassifier};
use crate::scoring::{Reranker, RerankerConfig, RerankerHandle};
use crate::synthesis::AnswerSource;

const QUERY: &str = "I want to open a restaurant in Canggu";

const ALL_COLLECTIONS: [&str; 7] = [
    "legal_unified",
    "kbli_unified",
    "tax_genius",
    "visa_oracle",
    "property_unified",
    "bali_zero_pricing",
    "knowledge_base",
];

struct ConstantScorer(f32);

impl PairScorer for ConstantScorer {
    fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError> {
        Ok(vec![self.0; pairs.len()])
    }
}

fn reranker(score: f32) -> RerankerHandle {
    RerankerHandle::new(
        Reranker::new(Arc::new(ConstantScorer(score)), RerankerConfig::default()).unwrap(),
    )
}

fn empty_gateway() -> MockGateway {
    ALL_COLLECTIONS
        .iter()
        .fold(MockGateway::new(), |gateway, c| gateway.with_empty(c))
}

/// Three plain hits in every collection.
fn stocked_gateway() -> MockGateway {
    ALL_COLLECTIONS.iter().fold(MockGateway::new(), |gateway, c| {
        gateway.with_collection(
            c,
            vec![
                SearchHit::new(format!("{c} guidance one"), 0.5),
                SearchHit::new(format!("{c} guidance two"), 0.5),
                SearchHit::new(format!("{c} guidance three"), 0.5),
            ],
        )
    })
}

fn research_loop(
    gateway: Arc<MockGateway>,
    reranker: RerankerHandle,
    generator: MockGenerator,
    config: ResearchConfig,
) -> ResearchLoop {
    ResearchLoop::new(
        ScenarioClassifier::new(Arc::new(RoutingTable::builtin())),
        gateway,
        reranker,
        Arc::new(generator),
        config,
    )
}

#[tokio::test]
async fn test_empty_gateway_stops_at_iteration_cap() {
    let gateway = Arc::new(empty_gateway());
    let research = research_loop(
        gateway.clone(),
        RerankerHandle::stub(),
        MockGenerator::replying("unused"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.iterations(), crate::constants::DEFAULT_MAX_ITERATIONS);
    assert_eq!(gateway.call_count(), crate::constants::DEFAULT_MAX_ITERATIONS);
    assert_eq!(result.stop_reason, StopReason::IterationCap);
    assert_eq!(result.final_state, ResearchState::Done);
    assert_eq!(result.overall_confidence, 0.0);
    assert!(!result.synthesized_text.is_empty());
    assert!(result.steps.iter().all(|s| s.results_found == 0));
}

#[tokio::test]
async fn test_collections_exhausted_before_cap() {
    let research = research_loop(
        Arc::new(empty_gateway()),
        RerankerHandle::stub(),
        MockGenerator::replying("unused"),
        ResearchConfig::default().with_max_iterations(20),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.iterations(), ALL_COLLECTIONS.len());
    assert_eq!(result.stop_reason, StopReason::CollectionsExhausted);
    let searched: Vec<&str> = result.steps.iter().map(|s| s.collection.as_str()).collect();
    let mut unique = searched.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), searched.len());
}

#[tokio::test]
async fn test_high_confidence_stops_after_first_step() {
    let research = research_loop(
        Arc::new(stocked_gateway()),
        reranker(0.9),
        MockGenerator::replying("## Recommendation\nGo ahead."),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.iterations(), 1);
    assert_eq!(result.stop_reason, StopReason::HighConfidence);
    assert_eq!(result.steps[0].collection, "kbli_unified");
    assert_eq!(result.steps[0].query_variant, QUERY);
    assert_eq!(result.answer_source, AnswerSource::Model);
    assert_eq!(
        result.extracted_fields.recommendation.as_deref(),
        Some("Go ahead.")
    );
    // 0.9 mean + 0.06 coverage bonus
    assert!((result.overall_confidence - 0.96).abs() < 1e-5);
}

#[tokio::test]
async fn test_sufficient_after_three_collections() {
    let research = research_loop(
        Arc::new(stocked_gateway()),
        reranker(0.6),
        MockGenerator::replying("answer"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.stop_reason, StopReason::Sufficient);
    assert_eq!(result.iterations(), 3);
    assert_eq!(
        result.sources_consulted,
        vec!["kbli_unified", "legal_unified", "tax_genius"]
    );
    assert!(result.steps[1].rationale.starts_with("gap: only 1 of 3"));
    // 0.6 mean + min(0.2, 9 * 0.02)
    assert!((result.overall_confidence - 0.78).abs() < 1e-5);
}

#[tokio::test]
async fn test_failed_collection_does_not_count_toward_coverage() {
    let research = research_loop(
        Arc::new(stocked_gateway().with_failure("kbli_unified")),
        reranker(0.6),
        MockGenerator::replying("answer"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.stop_reason, StopReason::Sufficient);
    assert_eq!(result.iterations(), 4);
    assert_eq!(result.steps[0].collection, "kbli_unified");
    assert_eq!(result.steps[0].results_found, 0);
    assert_eq!(
        result.sources_consulted,
        vec!["legal_unified", "tax_genius", "visa_oracle"]
    );
}

#[tokio::test]
async fn test_step_numbers_strictly_increase() {
    let research = research_loop(
        Arc::new(empty_gateway()),
        RerankerHandle::stub(),
        MockGenerator::replying("unused"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    for (i, step) in result.steps.iter().enumerate() {
        assert_eq!(step.step_number, i + 1);
    }
}

#[tokio::test]
async fn test_failed_collection_recorded_and_loop_continues() {
    let gateway = Arc::new(stocked_gateway().with_failure("kbli_unified"));
    let research = research_loop(
        gateway,
        reranker(0.6),
        MockGenerator::replying("answer"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    let first = &result.steps[0];
    assert_eq!(first.collection, "kbli_unified");
    assert_eq!(first.results_found, 0);
    assert!(first.rationale.contains("scripted failure"));
    assert!(result.iterations() > 1);
    assert!(!result.sources_consulted.contains(&"kbli_unified".to_string()));
    assert!(result.degraded.is_some());
}

#[tokio::test]
async fn test_gap_expands_query_from_findings() {
    let gateway = Arc::new(
        empty_gateway().with_texts("kbli_unified", &[("KBLI 56101 applies to restaurants", 0.5)]),
    );
    let research = research_loop(
        gateway.clone(),
        reranker(0.3),
        MockGenerator::replying("answer"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.steps[1].query_variant, format!("{QUERY} kbli"));
    assert_eq!(gateway.calls()[1].query, format!("{QUERY} kbli"));
    assert!(result.steps[1].rationale.contains("only 1 results"));
}

#[tokio::test]
async fn test_uncertainty_markers_keep_searching() {
    let hedged: Vec<SearchHit> = (0..3)
        .map(|i| SearchHit::new(format!("Processing time is unclear, case {i}"), 0.5))
        .collect();
    let gateway = ALL_COLLECTIONS.iter().fold(MockGateway::new(), |g, c| {
        g.with_collection(c, hedged.clone())
    });
    let research = research_loop(
        Arc::new(gateway),
        reranker(0.6),
        MockGenerator::replying("answer"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.stop_reason, StopReason::IterationCap);
    assert!(
        result
            .reasoning_trace
            .iter()
            .any(|line| line.contains("hedge with \"unclear\""))
    );
}

#[tokio::test]
async fn test_generation_failure_reduces_confidence() {
    let research = research_loop(
        Arc::new(stocked_gateway()),
        reranker(0.9),
        MockGenerator::failing("quota exceeded"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert_eq!(result.answer_source, AnswerSource::Fallback);
    assert!(result.synthesized_text.contains("[kbli_unified]"));
    assert!((result.overall_confidence - 0.96 * 0.6).abs() < 1e-5);
}

#[tokio::test]
async fn test_explicit_order_is_followed() {
    let gateway = Arc::new(stocked_gateway());
    let research = research_loop(
        gateway.clone(),
        reranker(0.6),
        MockGenerator::replying("answer"),
        ResearchConfig::default(),
    );
    let order = ["visa_oracle", "tax_genius", "knowledge_base"]
        .iter()
        .map(|c| PlannedCollection {
            collection: c.to_string(),
            priority: Priority::Required,
            rationale: "requested".to_string(),
        })
        .collect();

    let result = research.research_with_order("kitas sponsor", 0, order).await;

    assert_eq!(
        gateway.searched_collections(),
        vec!["visa_oracle", "tax_genius", "knowledge_base"]
    );
    assert_eq!(result.stop_reason, StopReason::Sufficient);
}

#[tokio::test]
async fn test_trace_and_stats() {
    let research = research_loop(
        Arc::new(empty_gateway()),
        RerankerHandle::stub(),
        MockGenerator::replying("unused"),
        ResearchConfig::default(),
    );

    let result = research.research(QUERY, 0).await;

    assert!(result.reasoning_trace.first().unwrap().starts_with("Researching"));
    assert!(
        result
            .reasoning_trace
            .last()
            .unwrap()
            .contains("iteration limit reached")
    );

    let stats = research.get_stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.scenario_counts["business_setup"], 1);
}

#[test]
fn test_research_confidence_bounds() {
    for mean in [-1.0, 0.0, 0.5, 0.95, 2.0] {
        for total in [0, 1, 10, 1_000] {
            for source in [AnswerSource::Model, AnswerSource::Fallback] {
                let c = research_confidence(mean, total, source);
                assert!((0.0..=1.0).contains(&c), "{mean} {total} {source:?} -> {c}");
            }
        }
    }
    assert_eq!(research_confidence(0.9, 0, AnswerSource::Model), 0.0);
}
