use crate::constants::{DEFAULT_LATENCY_TARGET_MS, DEFAULT_RERANK_CACHE_CAPACITY, LATENCY_WINDOW};

#[derive(Debug, Clone, PartialEq)]
pub struct RerankerConfig {
    /// Max cached ranked lists. Default: `1_000`.
    pub cache_capacity: usize,

    /// Per-call latency target used for the target-met rate. Default: `50.0`.
    pub latency_target_ms: f64,

    /// Latency samples retained. Default: `1_000`.
    pub latency_window: usize,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_RERANK_CACHE_CAPACITY,
            latency_target_ms: DEFAULT_LATENCY_TARGET_MS,
            latency_window: LATENCY_WINDOW,
        }
    }
}

impl RerankerConfig {
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_latency_target_ms(mut self, target_ms: f64) -> Self {
        self.latency_target_ms = target_ms;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be at least 1".to_string());
        }
        if self.latency_window == 0 {
            return Err("latency_window must be at least 1".to_string());
        }
        if !(self.latency_target_ms.is_finite() && self.latency_target_ms > 0.0) {
            return Err(format!(
                "latency_target_ms must be positive, got {}",
                self.latency_target_ms
            ));
        }
        Ok(())
    }
}
