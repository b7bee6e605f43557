// ============================================================
// Layer 2 — Dataset Preparation
// ============================================================
// The steps every command shares before it touches a
// tokenizer or a model:
//
//   Step 1: Load the splits             (Layer 4 - loader)
//   Step 2: Build the label registry    (Layer 4 - registry)
//   Step 3: Check intent consistency    (Layer 4 - registry)
//   Step 4: Summarise intents per split (Layer 4 - summary)
//
// Training and testing are required. Evaluation and
// regression are loaded when their files exist and skipped
// with a warning otherwise.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::infra::artifacts::ArtifactWriter;
use crate::data::{
    loader::{CsvSplitLoader, DEFAULT_INTENT_COLUMN, DEFAULT_TEXT_COLUMN},
    registry::{ConsistencyPolicy, ConsistencyReport, LabelRegistry},
    summary::IntentsSummary,
};
use crate::domain::traits::SplitSource;
use crate::domain::utterance::{Split, SplitKind};

// ─── Dataset Paths ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPaths {
    pub training:      String,
    pub testing:       String,
    pub evaluation:    String,
    pub regression:    String,
    pub text_column:   String,
    pub intent_column: String,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            training:      "data/train/train.csv".to_string(),
            testing:       "data/test/test.csv".to_string(),
            evaluation:    "data/evaluate/evaluate.csv".to_string(),
            regression:    "data/regress/regress.csv".to_string(),
            text_column:   DEFAULT_TEXT_COLUMN.to_string(),
            intent_column: DEFAULT_INTENT_COLUMN.to_string(),
        }
    }
}

impl DatasetPaths {
    pub fn loader(&self) -> CsvSplitLoader {
        CsvSplitLoader::new(&self.text_column, &self.intent_column)
            .with_path(SplitKind::Training,   &self.training)
            .with_path(SplitKind::Testing,    &self.testing)
            .with_path(SplitKind::Evaluation, &self.evaluation)
            .with_path(SplitKind::Regression, &self.regression)
    }
}

// ─── Prepared Datasets ────────────────────────────────────────────────────────
pub struct PreparedDatasets {
    pub training:    Split,
    pub testing:     Split,
    pub evaluation:  Option<Split>,
    pub regression:  Option<Split>,
    pub registry:    LabelRegistry,
    pub consistency: ConsistencyReport,
    pub summary:     IntentsSummary,
}

impl PreparedDatasets {
    pub fn get(&self, kind: SplitKind) -> Option<&Split> {
        match kind {
            SplitKind::Training   => Some(&self.training),
            SplitKind::Testing    => Some(&self.testing),
            SplitKind::Evaluation => self.evaluation.as_ref(),
            SplitKind::Regression => self.regression.as_ref(),
        }
    }
}

pub fn prepare_datasets(paths: &DatasetPaths, policy: ConsistencyPolicy) -> Result<PreparedDatasets> {
    // ── Step 1: Load the splits ───────────────────────────────────────────────
    let loader = paths.loader();
    let load = |kind: SplitKind| {
        loader
            .load_split(kind)
            .with_context(|| format!("Cannot load the {kind} split"))
    };
    let load_optional = |kind: SplitKind| -> Result<Option<Split>> {
        if loader.has_split(kind) {
            load(kind).map(Some)
        } else {
            tracing::warn!("No {} split found, skipping it", kind);
            Ok(None)
        }
    };

    let training   = load(SplitKind::Training)?;
    let testing    = load(SplitKind::Testing)?;
    let evaluation = load_optional(SplitKind::Evaluation)?;
    let regression = load_optional(SplitKind::Regression)?;

    let mut all = vec![&training, &testing];
    all.extend(evaluation.as_ref());
    all.extend(regression.as_ref());

    // ── Step 2: Build the label registry ──────────────────────────────────────
    let registry = LabelRegistry::build(&all)?;
    tracing::info!("Label registry: {} intents across {} splits", registry.len(), all.len());

    // ── Step 3: Check intent consistency ──────────────────────────────────────
    let others: Vec<(SplitKind, _)> = all
        .iter()
        .filter(|s| s.kind != SplitKind::Training)
        .map(|s| (s.kind, s.intent_set()))
        .collect();
    let consistency = LabelRegistry::validate_consistency(&training.intent_set(), &others, policy)?;

    // ── Step 4: Summarise intents ─────────────────────────────────────────────
    let summary = IntentsSummary::new(&registry, &all);

    Ok(PreparedDatasets {
        training,
        testing,
        evaluation,
        regression,
        registry,
        consistency,
        summary,
    })
}

/// The `summarize` command: prepare the splits and write only
/// intentsData.json.
pub fn summarize_datasets(
    paths:      &DatasetPaths,
    policy:     ConsistencyPolicy,
    output_dir: &str,
) -> Result<(PreparedDatasets, PathBuf)> {
    let prepared = prepare_datasets(paths, policy)?;
    let path     = ArtifactWriter::new(output_dir).write_intents_summary(&prepared.summary)?;
    Ok((prepared, path))
}
