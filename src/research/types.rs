use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::generation::ExtractedFields;
use crate::synthesis::AnswerSource;

use super::state::{ResearchState, StopReason};

/// One search step. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchStep {
    /// 1-based, strictly increasing within a session.
    pub step_number: usize,
    pub collection: String,
    pub query_variant: String,
    pub rationale: String,
    pub results_found: usize,
    /// Mean relevance of the step's candidates; `0.0` with none.
    pub confidence: f32,
    pub key_findings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchResult {
    pub session_id: Uuid,
    pub original_query: String,
    pub scenario: String,
    /// Collections whose query succeeded, in search order.
    pub sources_consulted: Vec<String>,
    pub steps: Vec<ResearchStep>,
    pub stop_reason: StopReason,
    pub final_state: ResearchState,
    pub reasoning_trace: Vec<String>,
    pub synthesized_text: String,
    pub extracted_fields: ExtractedFields,
    pub overall_confidence: f32,
    pub answer_source: AnswerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    pub total_results: usize,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl ResearchResult {
    pub fn iterations(&self) -> usize {
        self.steps.len()
    }
}
