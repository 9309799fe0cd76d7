use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::generation::ExtractedFields;
use crate::routing::Priority;
use crate::scoring::Candidate;

/// How one planned collection fared during the gather.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionOutcome {
    pub collection: String,
    pub priority: Priority,
    pub success: bool,
    pub hits: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Where the answer text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Model,
    /// Deterministic concatenation of top snippets.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisResult {
    pub session_id: Uuid,
    pub original_query: String,
    pub scenario: String,
    pub scenario_confidence: f32,
    /// Collections whose query succeeded, in plan order.
    pub sources_consulted: Vec<String>,
    pub collections_failed: Vec<String>,
    pub collection_outcomes: Vec<CollectionOutcome>,
    /// Candidates that fed the answer, best first.
    pub candidates: Vec<Candidate>,
    pub synthesized_text: String,
    pub extracted_fields: ExtractedFields,
    pub overall_confidence: f32,
    pub answer_source: AnswerSource,
    /// Set when any stage fell back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Read-only snapshot of an orchestrator's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrchestratorStats {
    pub requests: u64,
    pub scenario_counts: BTreeMap<String, u64>,
    pub avg_collections_consulted: f64,
    pub avg_confidence: f64,
    pub degraded_count: u64,
}
