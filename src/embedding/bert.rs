use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;

/// BERT encoder with a single-logit relevance head on the `[CLS]` token.
struct RelevanceHead {
    encoder: BertModel,
    classifier: Linear,
}

impl RelevanceHead {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        // Cross-encoder checkpoints ship under either prefix (or none).
        let encoder = ["bert", "roberta"]
            .into_iter()
            .find(|prefix| {
                vb.contains_tensor(&format!("{prefix}.embeddings.word_embeddings.weight"))
            })
            .map(|prefix| BertModel::load(vb.pp(prefix), config))
            .unwrap_or_else(|| BertModel::load(vb.clone(), config))?;

        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;

        Ok(Self {
            encoder,
            classifier,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0, ..))?;
        self.classifier.forward(&cls)
    }
}

/// Shareable sequence-pair classifier loaded from a safetensors checkpoint.
#[derive(Clone)]
pub struct PairClassifier(std::sync::Arc<RelevanceHead>);

impl PairClassifier {
    /// Loads `config.json` + `model.safetensors` from `model_dir`.
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_content = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;

        let weights = model_dir.join("model.safetensors");
        // SAFETY: the weights file is opened read-only and must not be
        // modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)? };

        Ok(Self(std::sync::Arc::new(RelevanceHead::load(vb, &config)?)))
    }

    /// Runs a padded batch and returns one raw logit per row, shape `(batch, 1)`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        self.0.forward(input_ids, token_type_ids, attention_mask)
    }
}
