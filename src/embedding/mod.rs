//! Cross-encoder model plumbing.
//!
//! [`cross_encoder`] turns (query, passage) pairs into relevance scores;
//! [`crate::scoring`] builds caching, telemetry and fallback on top of it.

/// BERT sequence-pair classifier.
pub mod bert;
/// Cross-encoder scorer (model or lexical stub).
pub mod cross_encoder;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Tokenizer loading helpers.
pub mod tokenizer;

pub use cross_encoder::{
    CrossEncoder, CrossEncoderConfig, CrossEncoderError, PairScorer, lexical_score,
};
