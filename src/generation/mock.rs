//! Scripted generator for tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Generated, GenerationError, TextGenerator};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
    /// Never answers; exercises the caller's timeout.
    Hang,
}

/// Returns a fixed reply (or failure) and captures every prompt.
#[derive(Debug)]
pub struct MockGenerator {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::from_script(Script::Reply(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_script(Script::Fail(message.into()))
    }

    pub fn hanging() -> Self {
        Self::from_script(Script::Hang)
    }

    fn from_script(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<Generated, GenerationError> {
        self.prompts.lock().push(prompt.to_string());

        match &self.script {
            Script::Reply(text) => Ok(Generated::new(text.clone())),
            Script::Fail(message) => Err(GenerationError::Provider {
                message: message.clone(),
            }),
            Script::Hang => {
                std::future::pending::<()>().await;
                Err(GenerationError::EmptyResponse)
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
