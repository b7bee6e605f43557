// ============================================================
// Layer 2 — BuildUseCase
// ============================================================
// Orchestrates one full build in order:
//
//   Step 1: Prepare the datasets           (Layer 2 - datasets)
//   Step 2: Write the intents summary      (Layer 6 - artifacts)
//   Step 3: Build the tokenizer            (Layer 6 - infra)
//   Step 4: Encode training + testing      (Layer 4 - encoder)
//   Step 5: Save metadata and config       (Layer 6 - infra)
//   Step 6: Split fit / validation         (Layer 4 - data)
//   Step 7: Save the model config          (Layer 6 - infra)
//   Step 8: Run the training loop          (Layer 5 - ml)
//   Step 9: Write the training charts      (Layer 6 - artifacts)
//   Step 10: Evaluate held-out splits      (evaluation - decoder)
//   Step 11: Regression tracking           (evaluation - decoder)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::application::datasets::{prepare_datasets, DatasetPaths};
use crate::application::evaluate_use_case::PassContext;
use crate::data::{
    dataset::{samples_from, IntentDataset},
    encoder::{EncodingPolicy, SequenceEncoder, DEFAULT_CEILING},
    registry::ConsistencyPolicy,
    splitter::{split_train_val, DEFAULT_SPLIT_SEED},
};
use crate::domain::metadata::BuildMetadata;
use crate::domain::utterance::SplitKind;
use crate::evaluation::{
    decoder::DEFAULT_BATCH_SIZE,
    report::{ClassificationReport, RegressionReport},
};
use crate::infra::{
    artifacts::ArtifactWriter,
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, TrainingHistory},
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    inferencer::BurnIntentClassifier,
    model::TransformerIntentConfig,
    trainer::run_training,
};

// ─── Build Configuration ─────────────────────────────────────────────────────
// All settings for one build. Saved next to the weights as
// train_config.json so a build can be inspected afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub datasets:         DatasetPaths,
    pub vocab_path:       String,
    pub output_dir:       String,
    pub model_name:       String,
    pub build_version:    String,
    /// Upper bound on max_sequence_length
    pub ceiling:          usize,
    pub batch_size:       usize,
    pub epochs:           usize,
    pub lr:               f64,
    /// Share of the training split held back for validation
    pub validation_split: f64,
    pub seed:             u64,
    pub d_model:          usize,
    pub num_heads:        usize,
    pub num_layers:       usize,
    pub d_ff:             usize,
    pub dropout:          f64,
    pub head_dropout:     f64,
    pub consistency:      ConsistencyPolicy,
    pub encoding:         EncodingPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            datasets:         DatasetPaths::default(),
            vocab_path:       "vocab.txt".to_string(),
            output_dir:       "output".to_string(),
            model_name:       "intent-classifier".to_string(),
            build_version:    "0.1.0".to_string(),
            ceiling:          DEFAULT_CEILING,
            batch_size:       16,
            epochs:           1,
            lr:               2e-4,
            validation_split: 0.1,
            seed:             DEFAULT_SPLIT_SEED,
            d_model:          256,
            num_heads:        8,
            num_layers:       6,
            d_ff:             1024,
            dropout:          0.1,
            head_dropout:     0.5,
            consistency:      ConsistencyPolicy::default(),
            encoding:         EncodingPolicy::default(),
        }
    }
}

impl BuildConfig {
    /// Reject settings the pipeline cannot run with before any
    /// file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            bail!("validation_split must be in [0, 1), got {}", self.validation_split);
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            bail!("d_model ({}) must be divisible by num_heads ({})", self.d_model, self.num_heads);
        }
        for (name, rate) in [("dropout", self.dropout), ("head_dropout", self.head_dropout)] {
            if !(0.0..1.0).contains(&rate) {
                bail!("{name} must be in [0, 1), got {rate}");
            }
        }
        Ok(())
    }
}

// ─── Build Outcome ────────────────────────────────────────────────────────────
pub struct BuildOutcome {
    pub metadata:   BuildMetadata,
    pub history:    TrainingHistory,
    pub reports:    Vec<ClassificationReport>,
    pub regression: Option<RegressionReport>,
}

// ─── BuildUseCase ─────────────────────────────────────────────────────────────
pub struct BuildUseCase {
    config: BuildConfig,
}

impl BuildUseCase {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Run the whole build and return what it produced.
    pub fn execute(&self) -> Result<BuildOutcome> {
        let cfg = &self.config;
        cfg.validate()?;

        let ckpt_manager = CheckpointManager::new(&cfg.output_dir)?;
        let artifacts    = ArtifactWriter::new(&cfg.output_dir);
        tracing::info!("Writing build output to '{}'", ckpt_manager.dir().display());

        // ── Step 1: Prepare the datasets ──────────────────────────────────────
        let prepared = prepare_datasets(&cfg.datasets, cfg.consistency)?;
        let registry = &prepared.registry;

        // ── Step 2: Intents summary ───────────────────────────────────────────
        let summary_path = artifacts.write_intents_summary(&prepared.summary)?;
        tracing::info!("Intents summary written to '{}'", summary_path.display());

        // ── Step 3: Tokenizer ─────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.output_dir).build_from_vocab(&cfg.vocab_path)?;
        tracing::info!("WordPiece tokenizer ready ({} tokens)", tokenizer.vocab_size());

        // ── Step 4: Encode training and testing together ──────────────────────
        let encoded = SequenceEncoder::new(&tokenizer, registry, cfg.ceiling)?
            .with_policy(cfg.encoding)
            .encode(&[&prepared.training, &prepared.testing])?;
        let max_len = encoded.max_sequence_length;
        for split in &encoded.splits {
            tracing::info!(
                "{}: {} rows encoded, {} truncated, {} skipped",
                split.kind, split.len(), split.truncated, split.skipped.len()
            );
        }

        // ── Step 5: Metadata and config ───────────────────────────────────────
        let metadata = BuildMetadata {
            model_name:          cfg.model_name.clone(),
            build_version:       cfg.build_version.clone(),
            ceiling:             cfg.ceiling,
            max_sequence_length: max_len,
            intents:             registry.intents().to_vec(),
            text_column:         cfg.datasets.text_column.clone(),
            intent_column:       cfg.datasets.intent_column.clone(),
        };
        ckpt_manager.save_metadata(&metadata)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 6: Fit / validation split ────────────────────────────────────
        let training = encoded
            .get(SplitKind::Training)
            .map(samples_from)
            .unwrap_or_default();
        let (fit, val) = split_train_val(training, cfg.validation_split, cfg.seed);
        if fit.is_empty() {
            bail!("No training rows left to fit after encoding and the validation split");
        }
        tracing::info!("Split: {} fit, {} validation", fit.len(), val.len());

        // ── Step 7: Model config ──────────────────────────────────────────────
        let model_cfg = TransformerIntentConfig::new(
            tokenizer.vocab_size(),
            max_len,
            registry.len(),
            cfg.d_model,
            cfg.num_heads,
            cfg.num_layers,
            cfg.d_ff,
            cfg.dropout,
        )
        .with_head_dropout(cfg.head_dropout);
        ckpt_manager.save_model_config(&model_cfg)?;

        // ── Step 8: Training loop (Layer 5) ───────────────────────────────────
        let logger  = MetricsLogger::new(&cfg.output_dir)?;
        let trained = run_training(
            cfg,
            &model_cfg,
            IntentDataset::new(fit),
            IntentDataset::new(val),
            &ckpt_manager,
            &logger,
        )?;

        // ── Step 9: Training charts ───────────────────────────────────────────
        artifacts.write_history(&trained.history)?;
        if let Some(best) = trained.history.best_epoch() {
            tracing::info!("Best epoch {} (val_loss={:.4})", best.epoch, best.val_loss);
        }

        // ── Step 10: Held-out evaluation ──────────────────────────────────────
        let classifier = BurnIntentClassifier::new(trained.model, registry.len());
        let passes = PassContext {
            classifier:          &classifier,
            tokenizer:           &tokenizer,
            registry,
            metadata:            &metadata,
            max_sequence_length: max_len,
            excluded:            &prepared.consistency.unseen_in_training,
            encoding:            cfg.encoding,
            batch_size:          DEFAULT_BATCH_SIZE,
        };

        let mut reports = vec![passes.evaluate(&prepared.testing)?];
        if let Some(evaluation) = &prepared.evaluation {
            reports.push(passes.evaluate(evaluation)?);
        }
        artifacts.write_classification_reports(&reports)?;

        // ── Step 11: Regression tracking ──────────────────────────────────────
        let regression = match &prepared.regression {
            Some(split) => {
                let report = passes.regress(split)?;
                artifacts.write_regression(&report)?;
                Some(report)
            }
            None => None,
        };

        tracing::info!("Build {} of '{}' complete", cfg.build_version, cfg.model_name);
        Ok(BuildOutcome { metadata, history: trained.history, reports, regression })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BuildConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_validation_split() {
        let cfg = BuildConfig { validation_split: 1.0, ..BuildConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_indivisible_heads() {
        let cfg = BuildConfig { d_model: 100, num_heads: 8, ..BuildConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let cfg  = BuildConfig { epochs: 3, ..BuildConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: BuildConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.epochs, 3);
        assert_eq!(back.datasets, cfg.datasets);
    }
}
