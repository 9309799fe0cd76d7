use thiserror::Error;

use crate::embedding::CrossEncoderError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("cross-encoder error: {0}")]
    CrossEncoder(#[from] CrossEncoderError),

    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },
}
