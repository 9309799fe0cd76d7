//! Rolling latency window for the reranker.

use std::collections::VecDeque;

/// Latency samples (milliseconds) over the most recent `window` calls.
///
/// The first model invocation is recorded separately as the cold start and
/// never enters the window, so model load time does not skew percentiles
/// or the target-met rate.
#[derive(Debug, Clone)]
pub struct LatencyTelemetry {
    samples: VecDeque<f64>,
    window: usize,
    target_ms: f64,
    cold_start_ms: Option<f64>,
}

impl LatencyTelemetry {
    pub fn new(window: usize, target_ms: f64) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            target_ms,
            cold_start_ms: None,
        }
    }

    /// Appends a sample, dropping the oldest one once the window is full.
    pub fn record(&mut self, latency_ms: f64) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);
    }

    /// Stores the cold-start latency. Only the first call takes effect.
    pub fn record_cold_start(&mut self, latency_ms: f64) {
        self.cold_start_ms.get_or_insert(latency_ms);
    }

    pub fn has_cold_start(&self) -> bool {
        self.cold_start_ms.is_some()
    }

    pub fn cold_start_ms(&self) -> Option<f64> {
        self.cold_start_ms
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn target_ms(&self) -> f64 {
        self.target_ms
    }

    /// Nearest-rank percentile for `pct` in `[0, 100]`; `0.0` when empty.
    pub fn percentile(&self, pct: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let rank = (pct.clamp(0.0, 100.0) / 100.0 * sorted.len() as f64).ceil() as usize;
        sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
    }

    /// Fraction of windowed samples at or under the target; `0.0` when empty.
    pub fn target_met_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let met = self
            .samples
            .iter()
            .filter(|&&ms| ms <= self.target_ms)
            .count();
        met as f64 / self.samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window() {
        let telemetry = LatencyTelemetry::new(10, 50.0);

        assert_eq!(telemetry.percentile(50.0), 0.0);
        assert_eq!(telemetry.target_met_rate(), 0.0);
        assert!(telemetry.is_empty());
    }

    #[test]
    fn test_percentiles_nearest_rank() {
        let mut telemetry = LatencyTelemetry::new(100, 50.0);
        for ms in 1..=100 {
            telemetry.record(ms as f64);
        }

        assert_eq!(telemetry.percentile(50.0), 50.0);
        assert_eq!(telemetry.percentile(95.0), 95.0);
        assert_eq!(telemetry.percentile(99.0), 99.0);
        assert_eq!(telemetry.percentile(100.0), 100.0);
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut telemetry = LatencyTelemetry::new(3, 50.0);
        for ms in [500.0, 1.0, 2.0, 3.0] {
            telemetry.record(ms);
        }

        assert_eq!(telemetry.len(), 3);
        assert_eq!(telemetry.percentile(100.0), 3.0);
    }

    #[test]
    fn test_target_met_rate() {
        let mut telemetry = LatencyTelemetry::new(10, 50.0);
        for ms in [10.0, 50.0, 51.0, 200.0] {
            telemetry.record(ms);
        }

        assert_eq!(telemetry.target_met_rate(), 0.5);
    }

    #[test]
    fn test_cold_start_kept_out_of_window() {
        let mut telemetry = LatencyTelemetry::new(10, 50.0);
        telemetry.record_cold_start(2_000.0);
        telemetry.record_cold_start(3_000.0);
        telemetry.record(5.0);

        assert_eq!(telemetry.cold_start_ms(), Some(2_000.0));
        assert_eq!(telemetry.len(), 1);
        assert_eq!(telemetry.target_met_rate(), 1.0);
    }
}
