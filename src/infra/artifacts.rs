// ============================================================
// Layer 6 — Report Artifacts
// ============================================================
// Writes the JSON reports of a build into the output dir:
//
//   datasets_summary/intentsData.json
//   build_summary/lossOverEpochs.json
//   build_summary/accuracyOverEpochs.json
//   evaluation_summary/classificationReport.json
//   evaluation_summary/regressionTestResults.json
//
// Every file is rewritten on each run. Regression results in
// particular belong to one build; nothing is merged with a
// previous build's file.
//
// The chart files carry their own title, axis labels, and
// legend so a dashboard can plot them without extra context.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::summary::IntentsSummary;
use crate::evaluation::report::{ClassificationReport, RegressionReport};
use crate::infra::metrics::TrainingHistory;

pub const DATASETS_SUMMARY_DIR: &str   = "datasets_summary";
pub const BUILD_SUMMARY_DIR: &str      = "build_summary";
pub const EVALUATION_SUMMARY_DIR: &str = "evaluation_summary";

// ─── Chart Files ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossChart {
    pub loss:     Vec<f64>,
    pub val_loss: Vec<f64>,
    pub title:    String,
    pub y_label:  String,
    pub x_label:  String,
    pub legend:   Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyChart {
    pub acc:     Vec<f64>,
    pub val_acc: Vec<f64>,
    pub title:   String,
    pub y_label: String,
    pub x_label: String,
    pub legend:  Vec<String>,
}

fn legend() -> Vec<String> {
    vec!["train".into(), "test".into()]
}

impl From<&TrainingHistory> for LossChart {
    fn from(h: &TrainingHistory) -> Self {
        Self {
            loss:     h.loss(),
            val_loss: h.val_loss(),
            title:    "Loss over training epochs".into(),
            y_label:  "Loss".into(),
            x_label:  "Epoch".into(),
            legend:   legend(),
        }
    }
}

impl From<&TrainingHistory> for AccuracyChart {
    fn from(h: &TrainingHistory) -> Self {
        Self {
            acc:     h.acc(),
            val_acc: h.val_acc(),
            title:   "Accuracy over training epochs".into(),
            y_label: "Accuracy".into(),
            x_label: "Epoch".into(),
            legend:  legend(),
        }
    }
}

// ─── ArtifactWriter ───────────────────────────────────────────────────────────

pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn write_intents_summary(&self, summary: &IntentsSummary) -> Result<PathBuf> {
        self.write(DATASETS_SUMMARY_DIR, "intentsData.json", summary)
    }

    /// Both chart files; returns their paths in that order.
    pub fn write_history(&self, history: &TrainingHistory) -> Result<(PathBuf, PathBuf)> {
        let loss = self.write(BUILD_SUMMARY_DIR, "lossOverEpochs.json", &LossChart::from(history))?;
        let acc  = self.write(BUILD_SUMMARY_DIR, "accuracyOverEpochs.json", &AccuracyChart::from(history))?;
        Ok((loss, acc))
    }

    /// Reports keyed by split name.
    pub fn write_classification_reports(&self, reports: &[ClassificationReport]) -> Result<PathBuf> {
        let by_split: BTreeMap<String, &ClassificationReport> = reports
            .iter()
            .map(|r| (r.split.to_string(), r))
            .collect();
        self.write(EVALUATION_SUMMARY_DIR, "classificationReport.json", &by_split)
    }

    pub fn write_regression(&self, report: &RegressionReport) -> Result<PathBuf> {
        self.write(EVALUATION_SUMMARY_DIR, "regressionTestResults.json", report)
    }

    fn write<T: Serialize + ?Sized>(&self, dir: &str, name: &str, value: &T) -> Result<PathBuf> {
        let dir = self.root.join(dir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Wrote artifact '{}'", path.display());
        Ok(path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RegressionRecord;
    use crate::infra::metrics::EpochMetrics;

    fn read(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_chart_files_use_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = TrainingHistory::default();
        history.push(EpochMetrics::new(1, 1.2, 1.3, 0.4, 0.35));

        let (loss, acc) = ArtifactWriter::new(dir.path()).write_history(&history).unwrap();

        let loss = read(&loss);
        assert_eq!(loss["valLoss"], serde_json::json!([1.3]));
        assert_eq!(loss["yLabel"], "Loss");
        assert_eq!(loss["legend"], serde_json::json!(["train", "test"]));
        assert_eq!(read(&acc)["valAcc"], serde_json::json!([0.35]));
    }

    #[test]
    fn test_regression_file_is_overwritten() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let first  = RegressionReport::new(vec![RegressionRecord::new("hi", "greet", "greet")], 0);
        let second = RegressionReport::new(vec![RegressionRecord::new("pay", "billing", "greet")], 0);
        writer.write_regression(&first).unwrap();
        let path = writer.write_regression(&second).unwrap();

        let json = read(&path);
        assert_eq!(json["results"].as_array().unwrap().len(), 1);
        assert_eq!(json["results"][0]["text"], "pay");
        assert_eq!(json["results"][0]["match"], false);
    }
}
