use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, DEFAULT_MIN_RESULTS,
    LOW_RELEVANCE_THRESHOLD, MIN_DISTINCT_COLLECTIONS,
};
use crate::synthesis::SynthesisConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchConfig {
    /// Hard cap on search steps per session.
    pub max_iterations: usize,
    /// A step at or above this confidence ends the session.
    pub confidence_threshold: f32,
    /// Fewer results than this in a step is a gap.
    pub min_results: usize,
    /// Mean relevance below this in a step is a gap.
    pub low_relevance_threshold: f32,
    /// Fewer distinct collections searched than this is a gap.
    pub min_distinct_collections: usize,
    /// Search limit, rerank `top_k`, timeouts and generation settings.
    pub synthesis: SynthesisConfig,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_results: DEFAULT_MIN_RESULTS,
            low_relevance_threshold: LOW_RELEVANCE_THRESHOLD,
            min_distinct_collections: MIN_DISTINCT_COLLECTIONS,
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl ResearchConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_min_results(mut self, min_results: usize) -> Self {
        self.min_results = min_results;
        self
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisConfig) -> Self {
        self.synthesis = synthesis;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.low_relevance_threshold) {
            return Err(format!(
                "low_relevance_threshold must be in [0, 1], got {}",
                self.low_relevance_threshold
            ));
        }
        self.synthesis.validate()
    }
}
