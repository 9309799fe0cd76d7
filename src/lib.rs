//! Sift: adaptive multi-source retrieval and cross-encoder reranking.
//!
//! # Public API Surface
//!
//! ## Entry point
//! - [`Engine`], [`EngineBuilder`], [`EngineError`] - built once, shared per process
//! - [`SynthesisResult`], [`ResearchResult`] - answers with confidence and provenance
//!
//! ## Components
//! - [`Reranker`], [`RerankerHandle`] - cross-encoder reranking with LRU cache and telemetry
//! - [`ScenarioClassifier`], [`RoutingTable`] - keyword routing to collection plans
//! - [`ScatterGatherSynthesizer`] - concurrent single-pass synthesis
//! - [`ResearchLoop`] - iterative, gap-driven research
//!
//! ## Collaborators
//! - [`CollectionGateway`] ([`HttpGateway`]) - collection search
//! - [`TextGenerator`] ([`GenaiGenerator`]) - answer prose
//!
//! ## Degradation
//! Fallback paths report through [`Outcome`] instead of errors.
//!
//! ## Test/Mock Support
//! [`MockGateway`] and [`MockGenerator`] are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod engine;
pub mod gateway;
pub mod generation;
pub mod hashing;
pub mod outcome;
pub mod research;
pub mod routing;
pub mod scoring;
pub mod synthesis;

pub use cache::{CacheLookup, RerankCache};
pub use config::{Config, ConfigError};
pub use embedding::{CrossEncoder, CrossEncoderConfig, CrossEncoderError, PairScorer};
pub use engine::{Engine, EngineBuilder, EngineError, EngineStats};
#[cfg(any(test, feature = "mock"))]
pub use gateway::MockGateway;
pub use gateway::{CollectionGateway, GatewayError, HttpGateway, HttpGatewayConfig, SearchHit};
#[cfg(any(test, feature = "mock"))]
pub use generation::MockGenerator;
pub use generation::{
    ExtractedFields, GenaiGenerator, Generated, GenerationError, TextGenerator, extract_fields,
};
pub use hashing::{normalize_query, rerank_cache_key};
pub use outcome::Outcome;
pub use research::{
    ResearchConfig, ResearchLoop, ResearchResult, ResearchState, ResearchStep, StopReason,
};
pub use routing::{
    Classification, PlannedCollection, Priority, RoutingError, RoutingTable, ScenarioClassifier,
    ScenarioPlan,
};
pub use scoring::{
    Candidate, Reranker, RerankerConfig, RerankerHandle, RerankerStats, ScoringError,
};
pub use synthesis::{
    AnswerSource, CollectionOutcome, OrchestratorStats, ScatterGatherSynthesizer,
    SynthesisConfig, SynthesisResult,
};
