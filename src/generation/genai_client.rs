use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, error};

use super::{Generated, GenerationError, TextGenerator};

const SYSTEM_PROMPT: &str = "You are a business advisory assistant. Answer only from the \
provided context. When the context does not cover something, say so instead of guessing.";

/// [`TextGenerator`] backed by a `genai` client. Provider credentials are
/// resolved by `genai` from the environment.
#[derive(Clone)]
pub struct GenaiGenerator {
    client: Client,
    model: String,
}

impl std::fmt::Debug for GenaiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiGenerator")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiGenerator {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for GenaiGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<Generated, GenerationError> {
        if max_tokens == 0 {
            return Err(GenerationError::InvalidRequest {
                reason: "max_tokens must be > 0".to_string(),
            });
        }

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ]);
        let options = ChatOptions::default().with_max_tokens(max_tokens);

        debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting generation");

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&options))
            .await
            .map_err(|e| {
                error!("Provider error: {}", e);
                GenerationError::from(e)
            })?;

        let text = response
            .first_text()
            .ok_or(GenerationError::EmptyResponse)?
            .to_string();

        Ok(Generated { text })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
