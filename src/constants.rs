//! Cross-cutting, shared constants.
//!
//! Component configs take their defaults from here so the env layer in
//! [`crate::config`] and the component builders cannot drift apart.

/// Score assigned to every candidate when the scoring model fails.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Max entries in the reranker result cache.
pub const DEFAULT_RERANK_CACHE_CAPACITY: usize = 1_000;

/// Number of latency samples kept by the reranker telemetry window.
pub const LATENCY_WINDOW: usize = 1_000;

/// Per-call latency target for the reranker, in milliseconds.
pub const DEFAULT_LATENCY_TARGET_MS: f64 = 50.0;

/// Candidates kept after reranking.
pub const DEFAULT_TOP_K: usize = 8;

/// Results requested from the gateway per collection.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Snippets per collection allowed into a synthesis context.
pub const DEFAULT_SNIPPETS_PER_COLLECTION: usize = 3;

/// Independent timeout applied to each collection query, in milliseconds.
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5_000;

/// Timeout applied to one text-generation call, in milliseconds.
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_MAX_TOKENS: u32 = 1_500;

pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_MAX_ITERATIONS: usize = 5;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

pub const DEFAULT_MIN_RESULTS: usize = 3;

/// Mean relevance below which a research step counts as a gap.
pub const LOW_RELEVANCE_THRESHOLD: f32 = 0.5;

/// Distinct collections a research session should consult before it may
/// stop on sufficiency alone.
pub const MIN_DISTINCT_COLLECTIONS: usize = 3;

/// Upper bound on query variants proposed by expansion (original included).
pub const MAX_QUERY_VARIANTS: usize = 3;

/// Ceiling of the coverage bonus added to research confidence.
pub const MAX_COVERAGE_BONUS: f32 = 0.2;

/// Coverage bonus granted per result found across all research steps.
pub const COVERAGE_BONUS_PER_RESULT: f32 = 0.02;

/// Multiplier applied to confidence when synthesis fell back to the
/// deterministic non-AI path.
pub const FALLBACK_CONFIDENCE_FACTOR: f32 = 0.6;

/// Keyword matches that saturate scenario confidence at 1.0.
pub const KEYWORDS_FOR_FULL_CONFIDENCE: f32 = 5.0;

/// Longest text kept for one extracted answer section.
pub const MAX_SECTION_CHARS: usize = 2_000;

/// Longest text kept for one research key finding.
pub const MAX_FINDING_CHARS: usize = 240;

/// Key findings recorded per research step.
pub const FINDINGS_PER_STEP: usize = 3;

/// Longest snippet text placed into a synthesis prompt.
pub const MAX_SNIPPET_CHARS: usize = 1_200;

/// Weight of mean candidate relevance in single-pass synthesis confidence.
/// The remainder weighs collection coverage.
pub const RELEVANCE_WEIGHT: f32 = 0.7;
