use std::sync::Arc;

use super::*;
use crate::gateway::MockGateway;
use crate::generation::MockGenerator;
use crate::routing::RoutingTable;

fn gateway() -> MockGateway {
    [
        "legal_unified",
        "kbli_unified",
        "tax_genius",
        "visa_oracle",
        "property_unified",
        "bali_zero_pricing",
        "knowledge_base",
    ]
    .iter()
    .fold(MockGateway::new(), |g, c| {
        let text = format!("{c} restaurant guidance");
        g.with_texts(c, &[(text.as_str(), 0.6)])
    })
}

async fn engine() -> Engine {
    Engine::builder()
        .gateway(Arc::new(gateway()))
        .generator(Arc::new(MockGenerator::replying("## Timeline\nTwo months.")))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_build_requires_gateway_and_generator() {
    let err = Engine::builder().build().await.unwrap_err();
    assert!(matches!(err, EngineError::MissingComponent { .. }));

    let err = Engine::builder()
        .gateway(Arc::new(gateway()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::MissingComponent {
            component: "text generator"
        }
    ));
}

#[tokio::test]
async fn test_build_rejects_collection_missing_from_registry() {
    let gateway = MockGateway::new()
        .with_empty("legal_unified")
        .with_empty("kbli_unified");

    let err = Engine::builder()
        .gateway(Arc::new(gateway))
        .generator(Arc::new(MockGenerator::replying("x")))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Routing(crate::routing::RoutingError::UnknownCollection { .. })
    ));
}

#[tokio::test]
async fn test_build_fails_when_registry_down() {
    let err = Engine::builder()
        .gateway(Arc::new(gateway().with_registry_down()))
        .generator(Arc::new(MockGenerator::replying("x")))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Gateway(_)));
}

#[tokio::test]
async fn test_skip_registry_check() {
    let engine = Engine::builder()
        .gateway(Arc::new(MockGateway::new().with_registry_down()))
        .generator(Arc::new(MockGenerator::replying("x")))
        .skip_registry_check()
        .build()
        .await
        .unwrap();

    assert!(engine.collections().any(|c| c == "tax_genius"));
}

#[tokio::test]
async fn test_custom_routing_table() {
    let table = RoutingTable::from_json_str(
        r#"{
            "scenarios": [
                {"name": "surf", "keywords": ["surf", "board"], "required": ["knowledge_base"]}
            ],
            "fallback_order": ["knowledge_base"]
        }"#,
    )
    .unwrap();

    let engine = Engine::builder()
        .gateway(Arc::new(gateway()))
        .generator(Arc::new(MockGenerator::replying("x")))
        .routing(table)
        .build()
        .await
        .unwrap();

    let classification = engine.classify("surf board rental");
    assert_eq!(classification.scenario, "surf");
    assert_eq!(engine.plan("surf lessons").collection_names().collect::<Vec<_>>(), vec!["knowledge_base"]);
}

#[tokio::test]
async fn test_unknown_scenario_is_hard_error() {
    let engine = engine().await;

    let err = engine
        .synthesize_for_scenario("anything", 0, "space_travel")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UnknownScenario { name } if name == "space_travel"));
}

#[tokio::test]
async fn test_research_in_rejects_unknown_collection() {
    let engine = engine().await;

    let err = engine
        .research_in("kitas", 0, &["visa_oracle", "moon_base"])
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UnknownCollection { collection } if collection == "moon_base"));
}

#[tokio::test]
async fn test_research_in_dedups_and_keeps_order() {
    let engine = engine().await;

    let result = engine
        .research_in("kitas", 0, &["visa_oracle", "visa_oracle", "legal_unified"])
        .await
        .unwrap();

    let searched: Vec<&str> = result.steps.iter().map(|s| s.collection.as_str()).collect();
    assert_eq!(searched, vec!["visa_oracle", "legal_unified"]);
    assert_eq!(result.stop_reason, crate::research::StopReason::CollectionsExhausted);
}

#[tokio::test]
async fn test_stats_and_shutdown() {
    let engine = engine().await;

    let synthesis = engine.synthesize("I want to open a restaurant", 0).await;
    let research = engine.research("I want to open a restaurant", 0).await;
    assert!((0.0..=1.0).contains(&synthesis.overall_confidence));
    assert!((0.0..=1.0).contains(&research.overall_confidence));

    let candidates = vec![
        Candidate::new("restaurant permit", "kbli_unified", 0.2),
        Candidate::new("villa lease", "property_unified", 0.9),
    ];
    let ranked = engine.rerank("restaurant", candidates, 1).await;
    assert_eq!(ranked.value().unwrap()[0].text, "restaurant permit");

    let stats = engine.get_stats();
    assert_eq!(stats.synthesis.requests, 1);
    assert_eq!(stats.research.requests, 1);
    assert!(stats.reranker.total_calls >= 1);

    engine.shutdown();
    assert_eq!(engine.get_stats().reranker.cache_size, 0);
}
