//! Scatter-gather synthesis: query every planned collection concurrently,
//! rerank the merged candidates, and ask the generator for a structured
//! answer.

pub mod config;
pub mod context;
pub mod gather;
pub mod stats;
pub mod synthesizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::SynthesisConfig;
pub use context::{Composition, ContextSection, build_sections, compose, fallback_text};
pub use gather::{Gathered, query_collection, scatter};
pub use stats::StatsRecorder;
pub use synthesizer::{ScatterGatherSynthesizer, synthesis_confidence};
pub use types::{AnswerSource, CollectionOutcome, OrchestratorStats, SynthesisResult};
