// ============================================================
// Layer 5 — Inferencer
// ============================================================
// BurnIntentClassifier is the concrete IntentClassifier the
// decoder talks to. It takes already-encoded id rows and
// returns one softmax probability vector per row.
use anyhow::Result;

use crate::data::batcher::ids_tensor;
use crate::domain::traits::IntentClassifier;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{TransformerIntentConfig, TransformerIntentModel};

type InferBackend = burn::backend::Wgpu;

pub struct BurnIntentClassifier {
    model:       TransformerIntentModel<InferBackend>,
    num_classes: usize,
    device:      burn::backend::wgpu::WgpuDevice,
}

impl BurnIntentClassifier {
    /// Wrap a freshly trained model.
    pub fn new(model: TransformerIntentModel<InferBackend>, num_classes: usize) -> Self {
        Self {
            model,
            num_classes,
            device: burn::backend::wgpu::WgpuDevice::default(),
        }
    }

    /// Rebuild the architecture from model_config.json and load
    /// the latest epoch's weights.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device    = burn::backend::wgpu::WgpuDevice::default();
        let model_cfg = without_dropout(ckpt_manager.load_model_config()?);
        let model: TransformerIntentModel<InferBackend> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint ({} intents)", model_cfg.num_classes);
        Ok(Self { model, num_classes: model_cfg.num_classes, device })
    }

    /// Sequence length the positional embedding was built for
    pub fn max_sequence_length(&self) -> usize {
        self.model.max_seq_len
    }
}

/// The saved architecture with both dropout rates zeroed.
fn without_dropout(model_cfg: TransformerIntentConfig) -> TransformerIntentConfig {
    let mut model_cfg = model_cfg.with_head_dropout(0.0);
    model_cfg.dropout = 0.0;
    model_cfg
}

impl IntentClassifier for BurnIntentClassifier {
    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let input = ids_tensor::<InferBackend>(batch, &self.device);
        let probs: Vec<f32> = self
            .model
            .predict_proba(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        // [batch, num_classes] row-major
        Ok(probs
            .chunks(self.num_classes.max(1))
            .map(<[f32]>::to_vec)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reloaded_config_has_no_dropout() {
        let saved = TransformerIntentConfig::new(64, 16, 3, 32, 4, 2, 64, 0.1).with_head_dropout(0.5);
        let cfg   = without_dropout(saved);

        assert_eq!(cfg.dropout, 0.0);
        assert_eq!(cfg.head_dropout, 0.0);
        assert_eq!((cfg.vocab_size, cfg.max_seq_len, cfg.num_classes), (64, 16, 3));
    }
}
