pub mod config;
pub mod error;
mod lexical;


pub use config::{CrossEncoderConfig, DEFAULT_BATCH_SIZE, MAX_SEQ_LEN};
pub use error::CrossEncoderError;
pub use lexical::lexical_score;

use candle_core::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedding::bert::PairClassifier;
use crate::embedding::device::select_device;
use crate::embedding::tokenizer::load_pair_tokenizer;

/// Jointly scores (query, passage) pairs.
///
/// Implementations must return exactly one score per input pair, aligned
/// with the input order, each in `[0, 1]`.
pub trait PairScorer: Send + Sync {
    fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError>;

    /// `true` when scores come from real model weights.
    fn is_model_loaded(&self) -> bool {
        false
    }
}

struct LoadedModel {
    classifier: PairClassifier,
    tokenizer: Tokenizer,
}

pub struct CrossEncoder {
    device: candle_core::Device,
    config: CrossEncoderConfig,
    model: Option<LoadedModel>,
}

impl std::fmt::Debug for CrossEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEncoder")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.model.is_some())
            .finish()
    }
}

impl CrossEncoder {
    pub fn load(config: CrossEncoderConfig) -> Result<Self, CrossEncoderError> {
        if let Err(reason) = config.validate() {
            return Err(CrossEncoderError::InvalidConfig { reason });
        }

        let device = select_device();

        let Some(model_path) = config.model_path.clone() else {
            info!("No cross-encoder model path configured, using lexical scorer");
            return Ok(Self {
                device,
                config,
                model: None,
            });
        };

        if !model_path.exists() {
            return Err(CrossEncoderError::ModelNotFound { path: model_path });
        }

        for required in ["config.json", "model.safetensors", "tokenizer.json"] {
            if !model_path.join(required).exists() {
                return Err(CrossEncoderError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", required, model_path.display()),
                });
            }
        }

        info!(model_path = %model_path.display(), "Loading cross-encoder model");

        let classifier = PairClassifier::load(&model_path, &device).map_err(|e| {
            CrossEncoderError::ModelLoadFailed {
                reason: format!("Failed to load BERT classifier: {}", e),
            }
        })?;

        let tokenizer = load_pair_tokenizer(&model_path, MAX_SEQ_LEN).map_err(|e| {
            CrossEncoderError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(batch_size = config.batch_size, "Cross-encoder model loaded");

        Ok(Self {
            device,
            config,
            model: Some(LoadedModel {
                classifier,
                tokenizer,
            }),
        })
    }

    pub fn stub() -> Self {
        Self {
            device: candle_core::Device::Cpu,
            config: CrossEncoderConfig::stub(),
            model: None,
        }
    }

    pub fn config(&self) -> &CrossEncoderConfig {
        &self.config
    }

    pub fn score(&self, query: &str, passage: &str) -> Result<f32, CrossEncoderError> {
        let scores = self.score_pairs(&[(query, passage)])?;
        scores
            .first()
            .copied()
            .ok_or(CrossEncoderError::ScoreCountMismatch {
                expected: 1,
                actual: 0,
            })
    }

    fn forward_chunk(
        &self,
        model: &LoadedModel,
        chunk: &[(&str, &str)],
    ) -> Result<Vec<f32>, CrossEncoderError> {
        let encodings = model
            .tokenizer
            .encode_batch(chunk.to_vec(), true)
            .map_err(|e| CrossEncoderError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let rows = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(rows * seq_len);
        let mut type_ids = Vec::with_capacity(rows * seq_len);
        let mut mask = Vec::with_capacity(rows * seq_len);

        for encoding in &encodings {
            if encoding.get_ids().len() != seq_len {
                return Err(CrossEncoderError::InferenceFailed {
                    reason: "batch rows were not padded to equal length".to_string(),
                });
            }
            ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let ids = Tensor::from_vec(ids, (rows, seq_len), &self.device)?;
        let type_ids = Tensor::from_vec(type_ids, (rows, seq_len), &self.device)?;
        let mask = Tensor::from_vec(mask, (rows, seq_len), &self.device)?;

        let logits = model
            .classifier
            .forward(&ids, &type_ids, &mask)
            .map_err(|e| CrossEncoderError::InferenceFailed {
                reason: e.to_string(),
            })?
            .flatten_all()?
            .to_vec1::<f32>()?;

        Ok(logits
            .into_iter()
            .map(|logit| 1.0 / (1.0 + (-logit).exp()))
            .collect())
    }
}

impl PairScorer for CrossEncoder {
    fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, CrossEncoderError> {
        debug!(
            pairs = pairs.len(),
            model_loaded = self.model.is_some(),
            "Scoring query-passage pairs"
        );

        let Some(model) = &self.model else {
            return Ok(pairs.iter().map(|(q, p)| lexical_score(q, p)).collect());
        };

        let mut scores = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(self.config.batch_size) {
            scores.extend(self.forward_chunk(model, chunk)?);
        }

        if scores.len() != pairs.len() {
            return Err(CrossEncoderError::ScoreCountMismatch {
                expected: pairs.len(),
                actual: scores.len(),
            });
        }

        Ok(scores)
    }

    fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }
}
