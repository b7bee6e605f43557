// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything a later evaluate / regress
// run needs to reproduce the build's predictions.
//
// What gets saved:
//   1. Model weights (.mpk.gz file) — one per epoch
//   2. latest_epoch.json            — which epoch to reload
//   3. model_config.json            — architecture, incl. vocab
//                                     size and number of intents
//   4. train_config.json            — the full build configuration
//   5. build_metadata.json          — max_sequence_length and
//                                     intents, cross-checked by
//                                     the decoder
//
// File layout:
//   <output_dir>/
//     model_epoch_1.mpk.gz
//     model_epoch_2.mpk.gz
//     latest_epoch.json
//     model_config.json
//     train_config.json
//     build_metadata.json
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip
//   - Loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    config::Config,
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::build_use_case::BuildConfig;
use crate::domain::metadata::BuildMetadata;
use crate::ml::model::{TransformerIntentConfig, TransformerIntentModel};

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const METADATA_FILE: &str     = "build_metadata.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            anyhow::bail!(
                "Checkpoint dir '{}' does not exist. Have you run 'build' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ─── Model Weights ────────────────────────────────────────────────────────

    /// Save model weights for `epoch` and point latest_epoch.json at them.
    pub fn save_model<B: Backend>(
        &self,
        model: &TransformerIntentModel<B>,
        epoch: usize,
    ) -> Result<()> {
        // The recorder adds the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(LATEST_EPOCH_FILE, &epoch)?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the weights of the latest saved epoch into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  TransformerIntentModel<B>,
        device: &B::Device,
    ) -> Result<TransformerIntentModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you run 'build' first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
    }

    // ─── Configuration and Metadata ───────────────────────────────────────────

    pub fn save_model_config(&self, cfg: &TransformerIntentConfig) -> Result<()> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_model_config(&self) -> Result<TransformerIntentConfig> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        TransformerIntentConfig::load(&path).map_err(|e| {
            anyhow::anyhow!("Cannot read model config from '{}': {}", path.display(), e)
        })
    }

    pub fn save_config(&self, cfg: &BuildConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn save_metadata(&self, metadata: &BuildMetadata) -> Result<()> {
        self.write_json(METADATA_FILE, metadata)
    }

    pub fn load_metadata(&self) -> Result<BuildMetadata> {
        self.read_json(METADATA_FILE)
    }

    // ─── JSON Helpers ─────────────────────────────────────────────────────────

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Have you run 'build' first?", path.display())
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let meta = BuildMetadata {
            model_name:          "support-bot".into(),
            build_version:       "20240101".into(),
            ceiling:             128,
            max_sequence_length: 17,
            intents:             vec!["billing".into(), "greet".into()],
            text_column:         "text".into(),
            intent_column:       "intent".into(),
        };
        ckpt.save_metadata(&meta).unwrap();
        assert_eq!(ckpt.load_metadata().unwrap(), meta);
    }

    #[test]
    fn test_open_requires_existing_dir() {
        assert!(CheckpointManager::open("/nonexistent/build").is_err());
    }

    #[test]
    fn test_missing_metadata_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.load_metadata().is_err());
    }
}
