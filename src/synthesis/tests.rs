use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::gateway::{MockGateway, SearchHit};
use crate::generation::MockGenerator;
use crate::routing::{PlannedCollection, Priority, RoutingTable, ScenarioClassifier};
use crate::scoring::{Candidate, RerankerHandle};

const STRUCTURED_REPLY: &str = "## Recommendation\nRegister a PT PMA under KBLI 56101.\n\n\
## Timeline\nAbout three months.\n\n## Cost\nIDR 10 billion paid-up capital.\n\n\
## Requirements\nNIB, NPWP, hygiene certificate.\n\n## Risks\nZoning restrictions in Canggu.";

fn classifier() -> ScenarioClassifier {
    ScenarioClassifier::new(Arc::new(RoutingTable::builtin()))
}

fn full_gateway() -> MockGateway {
    MockGateway::new()
        .with_texts(
            "kbli_unified",
            &[
                ("KBLI 56101 covers restaurant businesses", 0.91),
                ("KBLI 56303 covers bars", 0.55),
            ],
        )
        .with_texts(
            "legal_unified",
            &[("A PT PMA needs a notarial deed for a restaurant business", 0.88)],
        )
        .with_texts(
            "tax_genius",
            &[("Restaurant businesses collect a regional PB1 tax", 0.8)],
        )
        .with_texts(
            "visa_oracle",
            &[("Foreign directors of a PT PMA need a KITAS", 0.7)],
        )
        .with_texts(
            "property_unified",
            &[("Leasing restaurant premises in Canggu requires zoning checks", 0.66)],
        )
        .with_texts(
            "bali_zero_pricing",
            &[("Company setup package pricing", 0.5)],
        )
        .with_empty("knowledge_base")
}

fn synthesizer(gateway: MockGateway, generator: MockGenerator) -> ScatterGatherSynthesizer {
    ScatterGatherSynthesizer::new(
        classifier(),
        Arc::new(gateway),
        RerankerHandle::stub(),
        Arc::new(generator),
        SynthesisConfig::default(),
    )
}

#[tokio::test]
async fn test_restaurant_query_routes_and_answers() {
    let synth = synthesizer(full_gateway(), MockGenerator::replying(STRUCTURED_REPLY));

    let result = synth
        .synthesize("I want to open a restaurant in Canggu", 1)
        .await;

    assert_eq!(result.scenario, "business_setup");
    assert_eq!(
        result.sources_consulted,
        vec![
            "kbli_unified",
            "legal_unified",
            "tax_genius",
            "visa_oracle",
            "property_unified",
            "bali_zero_pricing"
        ]
    );
    assert!(result.collections_failed.is_empty());
    assert_eq!(result.answer_source, AnswerSource::Model);
    assert_eq!(result.degraded, None);
    assert!(!result.synthesized_text.is_empty());
    assert_eq!(
        result.extracted_fields.timeline.as_deref(),
        Some("About three months.")
    );
    assert!((0.0..=1.0).contains(&result.overall_confidence));
    assert!(result.overall_confidence > 0.0);
}

#[tokio::test]
async fn test_failing_collection_is_excluded() {
    let gateway = full_gateway().with_failure("tax_genius");
    let synth = synthesizer(gateway, MockGenerator::replying(STRUCTURED_REPLY));

    let result = synth
        .synthesize("I want to open a restaurant in Canggu", 0)
        .await;

    assert!(!result.sources_consulted.contains(&"tax_genius".to_string()));
    assert_eq!(result.collections_failed, vec!["tax_genius"]);
    let tax = result
        .collection_outcomes
        .iter()
        .find(|o| o.collection == "tax_genius")
        .unwrap();
    assert!(!tax.success);
    assert!(tax.error.is_some());
    assert!(result.degraded.is_some());
    assert!(!result.synthesized_text.is_empty());
}

#[tokio::test]
async fn test_slow_collection_times_out_without_stalling_others() {
    let gateway = full_gateway().with_delay("legal_unified", Duration::from_secs(30));
    let synth = ScatterGatherSynthesizer::new(
        classifier(),
        Arc::new(gateway),
        RerankerHandle::stub(),
        Arc::new(MockGenerator::replying(STRUCTURED_REPLY)),
        SynthesisConfig::default().with_collection_timeout(Duration::from_millis(50)),
    );

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        synth.synthesize("I want to open a restaurant in Canggu", 0),
    )
    .await
    .expect("gather must not wait for the slow collection");

    assert_eq!(result.collections_failed, vec!["legal_unified"]);
    assert!(result.sources_consulted.contains(&"kbli_unified".to_string()));
}

#[tokio::test]
async fn test_generation_failure_uses_fallback() {
    let synth = synthesizer(full_gateway(), MockGenerator::failing("provider down"));

    let result = synth
        .synthesize("I want to open a restaurant in Canggu", 0)
        .await;

    assert_eq!(result.answer_source, AnswerSource::Fallback);
    assert!(result.synthesized_text.contains("[kbli_unified]"));
    assert!(result.extracted_fields.is_empty());
    assert!(result.degraded.as_deref().unwrap().contains("provider down"));
    assert!(result.overall_confidence <= crate::constants::FALLBACK_CONFIDENCE_FACTOR);
}

#[tokio::test]
async fn test_no_results_anywhere() {
    let gateway = MockGateway::new()
        .with_empty("legal_unified")
        .with_empty("kbli_unified");
    let generator = Arc::new(MockGenerator::replying(STRUCTURED_REPLY));
    let synth = ScatterGatherSynthesizer::new(
        classifier(),
        Arc::new(gateway),
        RerankerHandle::stub(),
        generator.clone(),
        SynthesisConfig::default(),
    );

    let result = synth.synthesize("what is the weather like", 0).await;

    assert_eq!(result.scenario, "general");
    assert_eq!(result.sources_consulted, vec!["legal_unified"]);
    assert_eq!(result.overall_confidence, 0.0);
    assert!(result.synthesized_text.contains("No relevant information"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_reranks_only_above_top_k() {
    let many: Vec<SearchHit> = (0..6)
        .map(|i| SearchHit::new(format!("restaurant licence note {i}"), 0.9))
        .collect();
    let gateway = full_gateway().with_collection("kbli_unified", many);
    let synth = ScatterGatherSynthesizer::new(
        classifier(),
        Arc::new(gateway),
        RerankerHandle::stub(),
        Arc::new(MockGenerator::replying(STRUCTURED_REPLY)),
        SynthesisConfig::default().with_top_k(4),
    );

    let result = synth
        .synthesize("I want to open a restaurant in Canggu", 0)
        .await;

    assert_eq!(result.candidates.len(), 4);
    assert!(result.candidates.iter().all(|c| c.rank.is_some()));
}

fn two_hits_each(collections: &[&str]) -> MockGateway {
    collections.iter().fold(MockGateway::new(), |gateway, c| {
        let texts: Vec<SearchHit> = if *c == "tax_genius" {
            (0..2)
                .map(|i| SearchHit::new(format!("Open a restaurant in Canggu: tax step {i}"), 0.9))
                .collect()
        } else {
            (0..2)
                .map(|i| SearchHit::new(format!("{c} general note {i}"), 0.4))
                .collect()
        };
        gateway.with_collection(c, texts)
    })
}

#[tokio::test]
async fn test_cached_ranking_never_names_failed_collection() {
    const QUERY: &str = "I want to open a restaurant in Canggu";
    let reranker = RerankerHandle::stub();
    let planned = [
        "kbli_unified",
        "legal_unified",
        "tax_genius",
        "visa_oracle",
        "property_unified",
        "bali_zero_pricing",
    ];

    let first = ScatterGatherSynthesizer::new(
        classifier(),
        Arc::new(two_hits_each(&planned)),
        reranker.clone(),
        Arc::new(MockGenerator::replying(STRUCTURED_REPLY)),
        SynthesisConfig::default(),
    )
    .synthesize(QUERY, 0)
    .await;
    assert!(first.candidates.iter().any(|c| c.source_collection == "tax_genius"));

    let extra: Vec<SearchHit> = (0..4)
        .map(|i| SearchHit::new(format!("kbli_unified licence note {i}"), 0.4))
        .collect();
    let gateway = two_hits_each(&planned)
        .with_collection("kbli_unified", extra)
        .with_failure("tax_genius");
    let second = ScatterGatherSynthesizer::new(
        classifier(),
        Arc::new(gateway),
        reranker.clone(),
        Arc::new(MockGenerator::replying(STRUCTURED_REPLY)),
        SynthesisConfig::default(),
    )
    .synthesize(QUERY, 0)
    .await;

    assert_eq!(second.collections_failed, vec!["tax_genius".to_string()]);
    assert_eq!(second.candidates.len(), 8);
    assert!(
        second
            .candidates
            .iter()
            .all(|c| second.sources_consulted.contains(&c.source_collection))
    );
}

#[tokio::test]
async fn test_passthrough_at_or_below_top_k() {
    let gateway = MockGateway::new().with_texts("tax_genius", &[("PPh 21 rates", 0.4)]);
    let synth = synthesizer(gateway, MockGenerator::replying(STRUCTURED_REPLY));

    let result = synth
        .synthesize_for_scenario("tax", 0, "tax_compliance")
        .await
        .unwrap();

    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].rank, None);
}

#[tokio::test]
async fn test_unknown_scenario_rejected() {
    let synth = synthesizer(full_gateway(), MockGenerator::replying("x"));

    let err = synth
        .synthesize_for_scenario("anything", 0, "space_travel")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("space_travel"));
}

#[tokio::test]
async fn test_stats_accumulate() {
    let synth = synthesizer(full_gateway(), MockGenerator::replying(STRUCTURED_REPLY));

    synth.synthesize("I want to open a restaurant", 0).await;
    synth.synthesize("how do I file my npwp tax", 0).await;

    let stats = synth.get_stats();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.scenario_counts["business_setup"], 1);
    assert_eq!(stats.scenario_counts["tax_compliance"], 1);
    assert!(stats.avg_collections_consulted > 0.0);
    assert!((0.0..=1.0).contains(&stats.avg_confidence));
}

#[test]
fn test_sections_ordered_by_priority_then_name() {
    let plan = vec![
        PlannedCollection {
            collection: "tax_genius".to_string(),
            priority: Priority::Required,
            rationale: String::new(),
        },
        PlannedCollection {
            collection: "kbli_unified".to_string(),
            priority: Priority::Required,
            rationale: String::new(),
        },
        PlannedCollection {
            collection: "visa_oracle".to_string(),
            priority: Priority::Optional,
            rationale: String::new(),
        },
    ];
    let candidates = vec![
        Candidate::new("v1", "visa_oracle", 0.9),
        Candidate::new("t1", "tax_genius", 0.8),
        Candidate::new("k1", "kbli_unified", 0.7),
        Candidate::new("t2", "tax_genius", 0.6),
        Candidate::new("t3", "tax_genius", 0.5),
        Candidate::new("x1", "stray", 0.4),
    ];

    let sections = build_sections(&candidates, &plan, 2);

    let order: Vec<&str> = sections.iter().map(|s| s.collection.as_str()).collect();
    assert_eq!(order, vec!["kbli_unified", "tax_genius", "visa_oracle", "stray"]);
    assert_eq!(sections[1].snippets.len(), 2);
    assert_eq!(sections[1].snippets[0].text, "t1");
    assert_eq!(sections[3].priority, Priority::Fallback);
}

#[test]
fn test_fallback_text_never_empty() {
    assert!(!fallback_text("q", &[]).is_empty());
}

#[test]
fn test_confidence_bounds() {
    let high = vec![Candidate::new("a", "c", 5.0)];
    let negative = vec![Candidate::new("a", "c", -3.0)];

    for candidates in [&high, &negative] {
        for source in [AnswerSource::Model, AnswerSource::Fallback] {
            let c = synthesis_confidence(candidates, 1.0, source);
            assert!((0.0..=1.0).contains(&c));
        }
    }
    assert_eq!(synthesis_confidence(&[], 1.0, AnswerSource::Model), 0.0);
}
