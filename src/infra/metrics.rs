// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics after each epoch, both to a CSV
// file and to an in-memory TrainingHistory that the build
// summary charts are written from.
//
// Metrics recorded per epoch:
//   - epoch:    the epoch number (1, 2, 3, ...)
//   - loss:     average cross-entropy loss on the fit set
//   - val_loss: average cross-entropy loss on the validation set
//   - acc:      fraction of fit rows classified correctly
//   - val_acc:  fraction of validation rows classified correctly
//
// Output file: <output_dir>/metrics.csv
//
// Example CSV output:
//   epoch,loss,val_loss,acc,val_acc
//   1,2.124500,2.089200,0.323000,0.318000
//   2,1.490100,1.554300,0.584000,0.552000
//
// How to read the metrics:
//   - Loss should decrease each epoch
//   - If val_loss increases while loss decreases → overfitting
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all fit batches
    pub loss: f64,

    /// Average cross-entropy loss on the validation set
    pub val_loss: f64,

    /// Fit-set accuracy in [0.0, 1.0]
    pub acc: f64,

    /// Validation accuracy in [0.0, 1.0]
    pub val_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, val_loss: f64, acc: f64, val_acc: f64) -> Self {
        Self { epoch, loss, val_loss, acc, val_acc }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Every epoch of one training run, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn push(&mut self, m: EpochMetrics) {
        self.epochs.push(m);
    }

    pub fn loss(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.loss).collect()
    }

    pub fn val_loss(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_loss).collect()
    }

    pub fn acc(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.acc).collect()
    }

    pub fn val_acc(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_acc).collect()
    }

    /// Epoch with the lowest val_loss; NaN losses never win.
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        let mut best: Option<&EpochMetrics> = None;
        for m in &self.epochs {
            if m.val_loss.is_nan() {
                continue;
            }
            if best.map_or(true, |b| m.is_improvement(b.val_loss)) {
                best = Some(m);
            }
        }
        best
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        // Header only for a new file, so reruns append
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,loss,val_loss,acc,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.loss,
            m.val_loss,
            m.acc,
            m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.2, 0.2);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_best_epoch_skips_nan() {
        let mut h = TrainingHistory::default();
        h.push(EpochMetrics::new(1, 2.0, 1.8, 0.3, 0.3));
        h.push(EpochMetrics::new(2, 1.5, f64::NAN, 0.5, 0.0));
        h.push(EpochMetrics::new(3, 1.2, 1.4, 0.6, 0.5));
        assert_eq!(h.best_epoch().unwrap().epoch, 3);
        assert_eq!(h.loss(), vec![2.0, 1.5, 1.2]);
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.0, 1.1, 0.5, 0.4)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.8, 0.9, 0.6, 0.5)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,loss,val_loss,acc,val_acc");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2,0.800000"));
    }
}
