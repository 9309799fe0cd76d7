use std::collections::HashSet;

use tracing::warn;
use uuid::Uuid;

use crate::scoring::Candidate;

use super::state::ResearchState;
use super::types::ResearchStep;

/// A step before the session numbers it.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub collection: String,
    pub query_variant: String,
    pub rationale: String,
    pub confidence: f32,
    pub key_findings: Vec<String>,
    pub candidates: Vec<Candidate>,
    pub succeeded: bool,
}

/// Owned parts of a session, handed to the final result.
#[derive(Debug)]
pub struct FinishedSession {
    pub id: Uuid,
    pub state: ResearchState,
    pub steps: Vec<ResearchStep>,
    /// Collections whose query succeeded, in search order.
    pub consulted: Vec<String>,
    pub trace: Vec<String>,
}

/// Request-local state of one research run.
#[derive(Debug)]
pub struct ResearchSession {
    id: Uuid,
    state: ResearchState,
    steps: Vec<ResearchStep>,
    /// Candidates per step, aligned with `steps`.
    evidence: Vec<Vec<Candidate>>,
    searched: HashSet<String>,
    consulted: Vec<String>,
    trace: Vec<String>,
}

impl Default for ResearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ResearchSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ResearchState::Init,
            steps: Vec::new(),
            evidence: Vec::new(),
            searched: HashSet::new(),
            consulted: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ResearchState {
        self.state
    }

    /// Moves to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: ResearchState) -> bool {
        let legal = self.state.can_transition_to(next);
        debug_assert!(legal, "illegal transition {:?} -> {:?}", self.state, next);
        if !legal {
            warn!(from = ?self.state, to = ?next, "Ignoring illegal research state transition");
            return false;
        }
        self.state = next;
        true
    }

    pub fn has_searched(&self, collection: &str) -> bool {
        self.searched.contains(collection)
    }

    /// Collections that answered; failed searches do not count.
    pub fn distinct_collections(&self) -> usize {
        self.consulted.len()
    }

    /// Appends a step numbered after the last one.
    pub fn push_step(&mut self, record: StepRecord) -> &ResearchStep {
        let step_number = self.steps.len() + 1;

        self.searched.insert(record.collection.clone());
        if record.succeeded {
            self.consulted.push(record.collection.clone());
        }

        self.steps.push(ResearchStep {
            step_number,
            collection: record.collection,
            query_variant: record.query_variant,
            rationale: record.rationale,
            results_found: record.candidates.len(),
            confidence: record.confidence,
            key_findings: record.key_findings,
        });
        self.evidence.push(record.candidates);

        &self.steps[step_number - 1]
    }

    pub fn steps(&self) -> &[ResearchStep] {
        &self.steps
    }

    pub fn iterations(&self) -> usize {
        self.steps.len()
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    pub fn total_results(&self) -> usize {
        self.steps.iter().map(|s| s.results_found).sum()
    }

    /// Every finding recorded so far, oldest first.
    pub fn findings(&self) -> Vec<String> {
        self.steps
            .iter()
            .flat_map(|s| s.key_findings.iter().cloned())
            .collect()
    }

    /// Concatenated text of every gathered candidate.
    pub fn accumulated_text(&self) -> String {
        self.evidence
            .iter()
            .flatten()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Steps paired with their candidates, in step order.
    pub fn evidence(&self) -> impl Iterator<Item = (&ResearchStep, &[Candidate])> {
        self.steps
            .iter()
            .zip(self.evidence.iter().map(Vec::as_slice))
    }

    /// Mean confidence over steps that found anything; `0.0` otherwise.
    pub fn mean_step_confidence(&self) -> f32 {
        let productive: Vec<f32> = self
            .steps
            .iter()
            .filter(|s| s.results_found > 0)
            .map(|s| s.confidence)
            .collect();
        if productive.is_empty() {
            return 0.0;
        }
        productive.iter().sum::<f32>() / productive.len() as f32
    }

    pub fn finish(self) -> FinishedSession {
        FinishedSession {
            id: self.id,
            state: self.state,
            steps: self.steps,
            consulted: self.consulted,
            trace: self.trace,
        }
    }
}
