// ============================================================
// Layer 2 — Evaluate / Regress Use Case
// ============================================================
// Re-runs held-out evaluation or regression tracking against
// a finished build without retraining:
//
//   Step 1: Open the build output   (Layer 6 - checkpoint)
//   Step 2: Prepare the datasets    (Layer 2 - datasets)
//   Step 3: Reload the tokenizer    (Layer 6 - tokenizer_store)
//   Step 4: Reload the classifier   (Layer 5 - inferencer)
//   Step 5: Decode one split        (evaluation - decoder)
//   Step 6: Write the report        (Layer 6 - artifacts)
//
// The registry is rebuilt from the CSVs and must match the
// intents recorded in build_metadata.json exactly; the decoder
// refuses to start otherwise.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::application::datasets::{prepare_datasets, DatasetPaths, PreparedDatasets};
use crate::data::{
    encoder::EncodingPolicy,
    registry::{ConsistencyPolicy, LabelRegistry},
};
use crate::domain::metadata::BuildMetadata;
use crate::domain::traits::{IntentClassifier, TextTokenizer};
use crate::domain::utterance::{Split, SplitKind};
use crate::evaluation::{
    decoder::{Decoder, DEFAULT_BATCH_SIZE},
    report::{ClassificationReport, RegressionReport},
};
use crate::infra::{
    artifacts::ArtifactWriter,
    checkpoint::CheckpointManager,
    tokenizer_store::{TokenizerStore, WordPieceTokenizer},
};
use crate::ml::inferencer::BurnIntentClassifier;

// ─── Decode Passes ────────────────────────────────────────────────────────────
// Everything a Decoder needs, shared by the build and the
// stand-alone evaluate / regress commands. Each pass gets its
// own Decoder.
pub(crate) struct PassContext<'a, C: IntentClassifier + ?Sized, T: TextTokenizer + ?Sized> {
    pub classifier:          &'a C,
    pub tokenizer:           &'a T,
    pub registry:            &'a LabelRegistry,
    pub metadata:            &'a BuildMetadata,
    pub max_sequence_length: usize,
    pub excluded:            &'a BTreeSet<String>,
    pub encoding:            EncodingPolicy,
    pub batch_size:          usize,
}

impl<'a, C, T> PassContext<'a, C, T>
where
    C: IntentClassifier + ?Sized,
    T: TextTokenizer + ?Sized,
{
    fn decoder(&self) -> Result<Decoder<'a, C, T>> {
        let decoder = Decoder::new(
            self.classifier,
            self.tokenizer,
            self.registry,
            self.max_sequence_length,
            self.metadata,
        )?
        .with_policy(self.encoding)
        .with_batch_size(self.batch_size)
        .with_excluded_intents(self.excluded.clone());
        Ok(decoder)
    }

    pub fn evaluate(&self, split: &Split) -> Result<ClassificationReport> {
        let report = self
            .decoder()?
            .evaluate(split)
            .with_context(|| format!("Evaluation of the {} split failed", split.kind))?;
        tracing::info!(
            "{} accuracy {:.4} over {} rows",
            split.kind, report.accuracy, report.total
        );
        Ok(report)
    }

    pub fn regress(&self, split: &Split) -> Result<RegressionReport> {
        let report = self
            .decoder()?
            .regress(split)
            .with_context(|| format!("Regression pass over the {} split failed", split.kind))?;
        tracing::info!(
            "Regression match rate {:.4} over {} rows",
            report.match_rate,
            report.results.len()
        );
        Ok(report)
    }
}

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateConfig {
    pub datasets:    DatasetPaths,
    pub output_dir:  String,
    pub consistency: ConsistencyPolicy,
    pub encoding:    EncodingPolicy,
    pub batch_size:  usize,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            datasets:    DatasetPaths::default(),
            output_dir:  "output".to_string(),
            consistency: ConsistencyPolicy::default(),
            encoding:    EncodingPolicy::default(),
            batch_size:  DEFAULT_BATCH_SIZE,
        }
    }
}

// ─── EvaluateUseCase ──────────────────────────────────────────────────────────
pub struct EvaluateUseCase {
    config:     EvaluateConfig,
    prepared:   PreparedDatasets,
    metadata:   BuildMetadata,
    tokenizer:  WordPieceTokenizer,
    classifier: BurnIntentClassifier,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Result<Self> {
        // ── Step 1: Open the build output ─────────────────────────────────────
        let ckpt     = CheckpointManager::open(&config.output_dir)?;
        let metadata = ckpt.load_metadata()?;
        tracing::info!(
            "Loaded build {} of '{}' (max_sequence_length={})",
            metadata.build_version, metadata.model_name, metadata.max_sequence_length
        );

        if (config.datasets.text_column.as_str(), config.datasets.intent_column.as_str())
            != (metadata.text_column.as_str(), metadata.intent_column.as_str())
        {
            tracing::warn!(
                "Reading columns ({}, {}) but the build was trained on ({}, {})",
                config.datasets.text_column, config.datasets.intent_column,
                metadata.text_column, metadata.intent_column
            );
        }

        // ── Step 2: Prepare the datasets ──────────────────────────────────────
        let prepared = prepare_datasets(&config.datasets, config.consistency)?;

        // ── Step 3 / 4: Reload tokenizer and classifier ───────────────────────
        let tokenizer  = TokenizerStore::new(&config.output_dir).load()?;
        let classifier = BurnIntentClassifier::from_checkpoint(&ckpt)?;

        Ok(Self { config, prepared, metadata, tokenizer, classifier })
    }

    fn passes(&self) -> PassContext<'_, BurnIntentClassifier, WordPieceTokenizer> {
        PassContext {
            classifier:          &self.classifier,
            tokenizer:           &self.tokenizer,
            registry:            &self.prepared.registry,
            metadata:            &self.metadata,
            max_sequence_length: self.classifier.max_sequence_length(),
            excluded:            &self.prepared.consistency.unseen_in_training,
            encoding:            self.config.encoding,
            batch_size:          self.config.batch_size,
        }
    }

    /// Held-out evaluation of `kind`; writes classificationReport.json.
    pub fn evaluate(&self, kind: SplitKind) -> Result<ClassificationReport> {
        let split = self
            .prepared
            .get(kind)
            .with_context(|| format!("No {kind} split is available to evaluate"))?;

        // ── Step 5: Decode ────────────────────────────────────────────────────
        let report = self.passes().evaluate(split)?;

        // ── Step 6: Write the report ──────────────────────────────────────────
        ArtifactWriter::new(&self.config.output_dir)
            .write_classification_reports(std::slice::from_ref(&report))?;
        Ok(report)
    }

    /// Regression tracking; writes regressionTestResults.json.
    pub fn regress(&self) -> Result<RegressionReport> {
        let split = self
            .prepared
            .regression
            .as_ref()
            .context("No regression split is available")?;

        let report = self.passes().regress(split)?;

        ArtifactWriter::new(&self.config.output_dir).write_regression(&report)?;
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::IntentError;
    use crate::testing::{split, LookupClassifier, WhitespaceTokenizer};

    #[test]
    fn test_each_pass_gets_a_fresh_decoder() {
        let tok   = WhitespaceTokenizer::new(&["hello", "pay"]);
        let eval  = split(SplitKind::Evaluation, &[("hello", "greet"), ("pay", "billing")]);
        let reg   = LabelRegistry::build(&[&eval]).unwrap();
        let clf   = LookupClassifier::new(
            2,
            &[(tok.id("hello"), reg.index_of("greet").unwrap()), (tok.id("pay"), reg.index_of("billing").unwrap())],
        );
        let meta = BuildMetadata {
            model_name:          "m".into(),
            build_version:       "v".into(),
            ceiling:             128,
            max_sequence_length: 3,
            intents:             reg.intents().to_vec(),
            text_column:         "text".into(),
            intent_column:       "intent".into(),
        };
        let excluded = BTreeSet::new();
        let ctx = PassContext {
            classifier:          &clf,
            tokenizer:           &tok,
            registry:            &reg,
            metadata:            &meta,
            max_sequence_length: 3,
            excluded:            &excluded,
            encoding:            EncodingPolicy::Abort,
            batch_size:          8,
        };

        assert_eq!(ctx.evaluate(&eval).unwrap().accuracy, 1.0);
        assert_eq!(ctx.regress(&eval).unwrap().match_rate, 1.0);
    }

    #[test]
    fn test_drift_surfaces_as_typed_error() {
        let tok  = WhitespaceTokenizer::new(&["hello"]);
        let eval = split(SplitKind::Evaluation, &[("hello", "greet")]);
        let reg  = LabelRegistry::build(&[&eval]).unwrap();
        let clf  = LookupClassifier::new(1, &[]);
        let meta = BuildMetadata {
            model_name:          "m".into(),
            build_version:       "v".into(),
            ceiling:             128,
            max_sequence_length: 3,
            intents:             reg.intents().to_vec(),
            text_column:         "text".into(),
            intent_column:       "intent".into(),
        };
        let excluded = BTreeSet::new();
        let ctx = PassContext {
            classifier:          &clf,
            tokenizer:           &tok,
            registry:            &reg,
            metadata:            &meta,
            max_sequence_length: 8,
            excluded:            &excluded,
            encoding:            EncodingPolicy::Abort,
            batch_size:          8,
        };

        let err = ctx.evaluate(&eval).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IntentError>(),
            Some(IntentError::Drift { supplied: 8, recorded: 3 })
        ));
    }
}
