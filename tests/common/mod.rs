//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sift::embedding::{CrossEncoderError, PairScorer};
use sift::gateway::{MockGateway, SearchHit};
use sift::generation::MockGenerator;
use sift::scoring::{Reranker, RerankerConfig, RerankerHandle};
use sift::{Candidate, Engine};

pub const CANGGU_QUERY: &str = "I want to open a restaurant in Canggu";

pub const ALL_COLLECTIONS: [&str; 7] = [
    "legal_unified",
    "kbli_unified",
    "tax_genius",
    "visa_oracle",
    "property_unified",
    "bali_zero_pricing",
    "knowledge_base",
];

pub const STRUCTURED_ANSWER: &str = "\
## Recommendation
Register a PT PMA under KBLI 56101 before signing a lease.

## Timeline
Roughly 2-3 months end to end.

## Costs
Paid-up capital of IDR 10 billion plus notary fees.

## Requirements
NIB, NPWP, and a hygiene certificate.

## Risks
Zoning in Canggu changes frequently.
";

/// Scores a pair by how many query words the passage contains.
pub struct OverlapScorer;

impl PairScorer for OverlapScorer {
    fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError> {
        Ok(pairs
            .iter()
            .map(|(query, passage)| {
                let passage = passage.to_lowercase();
                let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
                let hits = words.iter().filter(|w| passage.contains(w.as_str())).count();
                hits as f32 / words.len().max(1) as f32
            })
            .collect())
    }

    fn is_model_loaded(&self) -> bool {
        true
    }
}

/// Always errors, forcing the neutral fallback path.
pub struct BrokenScorer;

impl PairScorer for BrokenScorer {
    fn score_pairs(&self, _pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError> {
        Err(CrossEncoderError::InferenceFailed {
            reason: "device lost".to_string(),
        })
    }
}

pub struct ConstantScorer(pub f32);

impl PairScorer for ConstantScorer {
    fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError> {
        Ok(vec![self.0; pairs.len()])
    }
}

pub fn handle(scorer: impl PairScorer + 'static) -> RerankerHandle {
    RerankerHandle::new(
        Reranker::new(Arc::new(scorer), RerankerConfig::default()).expect("valid config"),
    )
}

pub fn candidates(collection: &str, texts: &[&str]) -> Vec<Candidate> {
    texts
        .iter()
        .map(|text| Candidate::new(*text, collection, 0.5))
        .collect()
}

/// Every collection stocked with two restaurant-related hits.
pub fn stocked_gateway() -> MockGateway {
    ALL_COLLECTIONS.iter().fold(MockGateway::new(), |gateway, c| {
        gateway.with_collection(
            c,
            vec![
                SearchHit::new(format!("{c}: opening a restaurant in Canggu"), 0.8),
                SearchHit::new(format!("{c}: general notes"), 0.4),
            ],
        )
    })
}

pub fn empty_gateway() -> MockGateway {
    ALL_COLLECTIONS
        .iter()
        .fold(MockGateway::new(), |gateway, c| gateway.with_empty(c))
}

pub async fn engine_with(
    gateway: MockGateway,
    generator: MockGenerator,
    reranker: RerankerHandle,
) -> Engine {
    Engine::builder()
        .gateway(Arc::new(gateway))
        .generator(Arc::new(generator))
        .reranker(reranker)
        .build()
        .await
        .expect("engine should build")
}
