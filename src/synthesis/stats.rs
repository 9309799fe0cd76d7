use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::types::OrchestratorStats;

#[derive(Debug, Default)]
struct Totals {
    requests: u64,
    scenario_counts: BTreeMap<String, u64>,
    collections_consulted: u64,
    confidence_sum: f64,
    degraded: u64,
}

/// Running counters behind [`OrchestratorStats`]. Never reset implicitly.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    totals: Mutex<Totals>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, scenario: &str, collections_consulted: usize, confidence: f32, degraded: bool) {
        let mut totals = self.totals.lock();
        totals.requests += 1;
        *totals
            .scenario_counts
            .entry(scenario.to_string())
            .or_insert(0) += 1;
        totals.collections_consulted += collections_consulted as u64;
        totals.confidence_sum += f64::from(confidence);
        totals.degraded += u64::from(degraded);
    }

    pub fn snapshot(&self) -> OrchestratorStats {
        let totals = self.totals.lock();
        // Zero requests means zero sums, so the floor only avoids 0/0.
        let requests = totals.requests.max(1) as f64;
        OrchestratorStats {
            requests: totals.requests,
            scenario_counts: totals.scenario_counts.clone(),
            avg_collections_consulted: totals.collections_consulted as f64 / requests,
            avg_confidence: totals.confidence_sum / requests,
            degraded_count: totals.degraded,
        }
    }
}
