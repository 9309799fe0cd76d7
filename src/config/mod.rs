//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SIFT_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_GATEWAY_TIMEOUT_MS, DEFAULT_GENERATION_TIMEOUT_MS,
    DEFAULT_LATENCY_TARGET_MS, DEFAULT_LLM_MODEL, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS,
    DEFAULT_MIN_RESULTS, DEFAULT_RERANK_CACHE_CAPACITY, DEFAULT_SEARCH_LIMIT,
    DEFAULT_SNIPPETS_PER_COLLECTION, DEFAULT_TOP_K,
};
use crate::embedding::CrossEncoderConfig;
use crate::gateway::HttpGatewayConfig;
use crate::research::ResearchConfig;
use crate::scoring::RerankerConfig;
use crate::synthesis::SynthesisConfig;

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SIFT_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Collection gateway base URL. Default: `http://localhost:8090`.
    pub gateway_url: String,

    /// Per-collection query timeout in ms. Default: `5000`.
    pub gateway_timeout_ms: u64,

    /// Results requested per collection. Default: `5`.
    pub search_limit: usize,

    /// Candidates kept after reranking. Default: `8`.
    pub top_k: usize,

    pub snippets_per_collection: usize,

    /// Model identifier passed to the generation provider.
    pub llm_model: String,

    pub llm_max_tokens: u32,

    pub llm_timeout_ms: u64,

    /// Cross-encoder model directory (config + safetensors + tokenizer).
    /// Unset means the lexical scorer.
    pub reranker_path: Option<PathBuf>,

    pub rerank_cache_capacity: usize,

    pub rerank_latency_target_ms: f64,

    /// JSON routing table. Unset means the built-in table.
    pub routing_path: Option<PathBuf>,

    pub research_max_iterations: usize,

    pub research_confidence: f32,

    pub research_min_results: usize,
}

/// Default gateway URL used when `SIFT_GATEWAY_URL` is not set.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8090";

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_timeout_ms: DEFAULT_GATEWAY_TIMEOUT_MS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            top_k: DEFAULT_TOP_K,
            snippets_per_collection: DEFAULT_SNIPPETS_PER_COLLECTION,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_max_tokens: DEFAULT_MAX_TOKENS,
            llm_timeout_ms: DEFAULT_GENERATION_TIMEOUT_MS,
            reranker_path: None,
            rerank_cache_capacity: DEFAULT_RERANK_CACHE_CAPACITY,
            rerank_latency_target_ms: DEFAULT_LATENCY_TARGET_MS,
            routing_path: None,
            research_max_iterations: DEFAULT_MAX_ITERATIONS,
            research_confidence: DEFAULT_CONFIDENCE_THRESHOLD,
            research_min_results: DEFAULT_MIN_RESULTS,
        }
    }
}

impl Config {
    const ENV_GATEWAY_URL: &'static str = "SIFT_GATEWAY_URL";
    const ENV_GATEWAY_TIMEOUT_MS: &'static str = "SIFT_GATEWAY_TIMEOUT_MS";
    const ENV_SEARCH_LIMIT: &'static str = "SIFT_SEARCH_LIMIT";
    const ENV_TOP_K: &'static str = "SIFT_TOP_K";
    const ENV_SNIPPETS_PER_COLLECTION: &'static str = "SIFT_SNIPPETS_PER_COLLECTION";
    const ENV_LLM_MODEL: &'static str = "SIFT_LLM_MODEL";
    const ENV_LLM_MAX_TOKENS: &'static str = "SIFT_LLM_MAX_TOKENS";
    const ENV_LLM_TIMEOUT_MS: &'static str = "SIFT_LLM_TIMEOUT_MS";
    const ENV_RERANKER_PATH: &'static str = "SIFT_RERANKER_PATH";
    const ENV_RERANK_CACHE_CAPACITY: &'static str = "SIFT_RERANK_CACHE_CAPACITY";
    const ENV_RERANK_LATENCY_TARGET_MS: &'static str = "SIFT_RERANK_LATENCY_TARGET_MS";
    const ENV_ROUTING_PATH: &'static str = "SIFT_ROUTING_PATH";
    const ENV_RESEARCH_MAX_ITERATIONS: &'static str = "SIFT_RESEARCH_MAX_ITERATIONS";
    const ENV_RESEARCH_CONFIDENCE: &'static str = "SIFT_RESEARCH_CONFIDENCE";
    const ENV_RESEARCH_MIN_RESULTS: &'static str = "SIFT_RESEARCH_MIN_RESULTS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();

        Ok(Self {
            gateway_url: Self::parse_string_from_env(Self::ENV_GATEWAY_URL, d.gateway_url),
            gateway_timeout_ms: Self::parse_from_env(Self::ENV_GATEWAY_TIMEOUT_MS, d.gateway_timeout_ms)?,
            search_limit: Self::parse_from_env(Self::ENV_SEARCH_LIMIT, d.search_limit)?,
            top_k: Self::parse_from_env(Self::ENV_TOP_K, d.top_k)?,
            snippets_per_collection: Self::parse_from_env(
                Self::ENV_SNIPPETS_PER_COLLECTION,
                d.snippets_per_collection,
            )?,
            llm_model: Self::parse_string_from_env(Self::ENV_LLM_MODEL, d.llm_model),
            llm_max_tokens: Self::parse_from_env(Self::ENV_LLM_MAX_TOKENS, d.llm_max_tokens)?,
            llm_timeout_ms: Self::parse_from_env(Self::ENV_LLM_TIMEOUT_MS, d.llm_timeout_ms)?,
            reranker_path: Self::parse_optional_path_from_env(Self::ENV_RERANKER_PATH),
            rerank_cache_capacity: Self::parse_from_env(
                Self::ENV_RERANK_CACHE_CAPACITY,
                d.rerank_cache_capacity,
            )?,
            rerank_latency_target_ms: Self::parse_from_env(
                Self::ENV_RERANK_LATENCY_TARGET_MS,
                d.rerank_latency_target_ms,
            )?,
            routing_path: Self::parse_optional_path_from_env(Self::ENV_ROUTING_PATH),
            research_max_iterations: Self::parse_from_env(
                Self::ENV_RESEARCH_MAX_ITERATIONS,
                d.research_max_iterations,
            )?,
            research_confidence: Self::parse_from_env(Self::ENV_RESEARCH_CONFIDENCE, d.research_confidence)?,
            research_min_results: Self::parse_from_env(
                Self::ENV_RESEARCH_MIN_RESULTS,
                d.research_min_results,
            )?,
        })
    }

    /// Validates paths and basic invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                value: self.gateway_url.clone(),
            });
        }

        let non_zero = [
            (Self::ENV_GATEWAY_TIMEOUT_MS, self.gateway_timeout_ms),
            (Self::ENV_SEARCH_LIMIT, self.search_limit as u64),
            (Self::ENV_TOP_K, self.top_k as u64),
            (Self::ENV_SNIPPETS_PER_COLLECTION, self.snippets_per_collection as u64),
            (Self::ENV_LLM_MAX_TOKENS, u64::from(self.llm_max_tokens)),
            (Self::ENV_LLM_TIMEOUT_MS, self.llm_timeout_ms),
            (Self::ENV_RERANK_CACHE_CAPACITY, self.rerank_cache_capacity as u64),
            (Self::ENV_RESEARCH_MAX_ITERATIONS, self.research_max_iterations as u64),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    reason: "must be > 0".to_string(),
                });
            }
        }

        if self.rerank_latency_target_ms.is_nan() || self.rerank_latency_target_ms <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_RERANK_LATENCY_TARGET_MS,
                reason: format!("must be > 0, got {}", self.rerank_latency_target_ms),
            });
        }

        if !(0.0..=1.0).contains(&self.research_confidence) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_RESEARCH_CONFIDENCE,
                reason: format!("must be in [0, 1], got {}", self.research_confidence),
            });
        }

        if let Some(ref path) = self.reranker_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.routing_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig::new(&self.gateway_url)
            .with_request_timeout(Duration::from_millis(self.gateway_timeout_ms))
    }

    pub fn cross_encoder_config(&self) -> CrossEncoderConfig {
        match &self.reranker_path {
            Some(path) => CrossEncoderConfig::new(path),
            None => CrossEncoderConfig::stub(),
        }
    }

    pub fn reranker_config(&self) -> RerankerConfig {
        RerankerConfig::default()
            .with_cache_capacity(self.rerank_cache_capacity)
            .with_latency_target_ms(self.rerank_latency_target_ms)
    }

    pub fn synthesis_config(&self) -> SynthesisConfig {
        SynthesisConfig::default()
            .with_search_limit(self.search_limit)
            .with_top_k(self.top_k)
            .with_snippets_per_collection(self.snippets_per_collection)
            .with_collection_timeout(Duration::from_millis(self.gateway_timeout_ms))
            .with_max_tokens(self.llm_max_tokens)
            .with_generation_timeout(Duration::from_millis(self.llm_timeout_ms))
    }

    pub fn research_config(&self) -> ResearchConfig {
        ResearchConfig::default()
            .with_max_iterations(self.research_max_iterations)
            .with_confidence_threshold(self.research_confidence)
            .with_min_results(self.research_min_results)
            .with_synthesis(self.synthesis_config())
    }

    fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name,
                    reason: e.to_string(),
                    value,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }
}
