use serde::Serialize;

/// Lifecycle of one research session.
///
/// `Init → Searching → (GapFound → Searching)* → Confident | Exhausted →
/// Synthesizing → Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchState {
    Init,
    Searching,
    GapFound,
    Confident,
    Exhausted,
    Synthesizing,
    Done,
}

impl ResearchState {
    pub fn can_transition_to(self, next: ResearchState) -> bool {
        use ResearchState::*;
        matches!(
            (self, next),
            (Init, Searching)
                | (Searching, GapFound | Confident | Exhausted)
                | (GapFound, Searching | Exhausted)
                | (Confident | Exhausted, Synthesizing)
                | (Synthesizing, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ResearchState::Done
    }
}

/// Why the search phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A step reached the confidence threshold.
    HighConfidence,
    /// Gap analysis found nothing missing.
    Sufficient,
    IterationCap,
    /// Every candidate collection was searched.
    CollectionsExhausted,
}

impl StopReason {
    pub fn describe(self) -> &'static str {
        match self {
            StopReason::HighConfidence => "confidence threshold reached",
            StopReason::Sufficient => "evidence judged sufficient",
            StopReason::IterationCap => "iteration limit reached",
            StopReason::CollectionsExhausted => "no collections left to search",
        }
    }
}
