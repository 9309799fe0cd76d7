use std::path::PathBuf;

/// Token budget for one (query, passage) pair.
pub const MAX_SEQ_LEN: usize = 512;

/// Pairs scored per forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct CrossEncoderConfig {
    /// Model directory holding `config.json`, `model.safetensors` and
    /// `tokenizer.json`. `None` selects the lexical stub scorer.
    pub model_path: Option<PathBuf>,

    pub batch_size: usize,
}

impl Default for CrossEncoderConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl CrossEncoderConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be at least 1");
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
