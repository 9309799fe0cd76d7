use thiserror::Error;

/// Errors from the text-generation collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("provider returned no text")]
    EmptyResponse,

    #[error("invalid generation request: {reason}")]
    InvalidRequest { reason: String },
}

impl From<genai::Error> for GenerationError {
    fn from(err: genai::Error) -> Self {
        GenerationError::Provider {
            message: err.to_string(),
        }
    }
}
