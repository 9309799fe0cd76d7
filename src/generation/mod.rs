//! Text generation behind a trait, plus best-effort parsing of the
//! structured sections the engine asks for.

pub mod error;
pub mod extract;
mod genai_client;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod extract_tests;

pub use error::GenerationError;
pub use extract::{ExtractedFields, Section, extract_fields};
pub use genai_client::GenaiGenerator;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerator;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Text returned by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generated {
    pub text: String,
}

impl Generated {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
/// Produces prose from a prompt.
///
/// Failures are returned, never panicked; callers fall back to a
/// deterministic synthesis.
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<Generated, GenerationError>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str {
        "unknown"
    }
}

/// Runs `generate` under `timeout`. An empty or whitespace-only reply
/// counts as a failure.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    max_tokens: u32,
    timeout: Duration,
) -> Result<Generated, GenerationError> {
    let generated = tokio::time::timeout(timeout, generator.generate(prompt, max_tokens))
        .await
        .map_err(|_| GenerationError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })??;

    if generated.text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(generated)
}
