// ============================================================
// Evaluation — Metrics and Reports
// ============================================================
// Aggregates decoded predictions into:
//
//   ConfusionMatrix       counts[true_index][predicted_index]
//   ClassificationReport  accuracy, per-intent precision /
//                         recall / F1 / support, macro and
//                         support-weighted averages
//   RegressionReport      one RegressionRecord per row plus
//                         the match rate of this build
//
// Intents with neither support nor predictions are left out
// of the per-intent table and the averages. Scores with a
// zero denominator are 0.0.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::record::RegressionRecord;
use crate::domain::utterance::SplitKind;

// ─── ConfusionMatrix ──────────────────────────────────────────────────────────

/// Square count matrix indexed by registry class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// counts[true][predicted]
    pub counts:    Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![vec![0; n_classes]; n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        self.counts[truth][predicted] += 1;
    }

    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth][predicted]
    }

    /// Rows whose true class is `class`
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Rows predicted as `class`
    pub fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|row| row.iter().sum::<usize>()).sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.n_classes).map(|c| self.counts[c][c]).sum()
    }
}

// ─── ClassificationReport ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub intent:    String,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Averages {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub split:        SplitKind,
    pub accuracy:     f64,
    pub correct:      usize,
    pub total:        usize,
    pub per_intent:   Vec<IntentScore>,
    pub macro_avg:    Averages,
    pub weighted_avg: Averages,
    /// Row and column labels of `confusion`, registry order
    pub labels:       Vec<String>,
    pub confusion:    ConfusionMatrix,
    /// Intents left out of every metric above
    pub excluded:     Vec<String>,
    /// Rows the tokenizer rejected under the skip-row policy
    pub skipped_rows: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    pub fn from_confusion(
        split:        SplitKind,
        labels:       &[String],
        confusion:    ConfusionMatrix,
        excluded:     Vec<String>,
        skipped_rows: usize,
    ) -> Self {
        let mut per_intent = Vec::new();

        for (class, intent) in labels.iter().enumerate() {
            let support   = confusion.support(class);
            let predicted = confusion.predicted(class);
            if support == 0 && predicted == 0 {
                continue;
            }
            let hits      = confusion.get(class, class);
            let precision = ratio(hits, predicted);
            let recall    = ratio(hits, support);
            per_intent.push(IntentScore {
                intent: intent.clone(),
                precision,
                recall,
                f1: f1(precision, recall),
                support,
            });
        }

        let macro_avg = if per_intent.is_empty() {
            Averages::default()
        } else {
            let n = per_intent.len() as f64;
            Averages {
                precision: per_intent.iter().map(|s| s.precision).sum::<f64>() / n,
                recall:    per_intent.iter().map(|s| s.recall).sum::<f64>() / n,
                f1:        per_intent.iter().map(|s| s.f1).sum::<f64>() / n,
            }
        };

        let total = confusion.total();
        let weighted_avg = if total == 0 {
            Averages::default()
        } else {
            let w = |s: &IntentScore| s.support as f64 / total as f64;
            Averages {
                precision: per_intent.iter().map(|s| s.precision * w(s)).sum(),
                recall:    per_intent.iter().map(|s| s.recall * w(s)).sum(),
                f1:        per_intent.iter().map(|s| s.f1 * w(s)).sum(),
            }
        };

        Self {
            split,
            accuracy: ratio(confusion.correct(), total),
            correct: confusion.correct(),
            total,
            per_intent,
            macro_avg,
            weighted_avg,
            labels: labels.to_vec(),
            confusion,
            excluded,
            skipped_rows,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} accuracy: {:.4} ({}/{})",
            self.split, self.accuracy, self.correct, self.total
        )?;
        writeln!(
            f,
            "{:<24} {:>9} {:>9} {:>9} {:>9}",
            "intent", "precision", "recall", "f1", "support"
        )?;
        for s in &self.per_intent {
            writeln!(
                f,
                "{:<24} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                s.intent, s.precision, s.recall, s.f1, s.support
            )?;
        }
        for (name, avg) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{:<24} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        if !self.excluded.is_empty() {
            writeln!(f, "excluded intents: {}", self.excluded.join(", "))?;
        }
        if self.skipped_rows > 0 {
            writeln!(f, "skipped rows: {}", self.skipped_rows)?;
        }
        Ok(())
    }
}

// ─── RegressionReport ─────────────────────────────────────────────────────────

/// Results of one regression-tracking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub results:      Vec<RegressionRecord>,
    pub match_rate:   f64,
    pub skipped_rows: usize,
}

impl RegressionReport {
    pub fn new(results: Vec<RegressionRecord>, skipped_rows: usize) -> Self {
        let matched = results.iter().filter(|r| r.matched).count();
        Self {
            match_rate: ratio(matched, results.len()),
            results,
            skipped_rows,
        }
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &RegressionRecord> {
        self.results.iter().filter(|r| !r.matched)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_confusion_counts_are_true_by_predicted() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 1);
        cm.add(0, 1);
        cm.add(1, 1);
        assert_eq!(cm.get(0, 1), 2);
        assert_eq!(cm.get(1, 0), 0);
        assert_eq!(cm.support(0), 2);
        assert_eq!(cm.predicted(1), 3);
        assert_eq!(cm.correct(), 1);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn test_per_intent_scores() {
        // greet: 2 true, predicted greet once and billing once
        // billing: 1 true, predicted billing
        let mut cm = ConfusionMatrix::new(2);
        cm.add(1, 1);
        cm.add(1, 0);
        cm.add(0, 0);
        let report = ClassificationReport::from_confusion(
            SplitKind::Testing,
            &labels(&["billing", "greet"]),
            cm,
            vec![],
            0,
        );

        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-9);
        let billing = &report.per_intent[0];
        assert!((billing.precision - 0.5).abs() < 1e-9);
        assert!((billing.recall - 1.0).abs() < 1e-9);
        let greet = &report.per_intent[1];
        assert!((greet.precision - 1.0).abs() < 1e-9);
        assert!((greet.recall - 0.5).abs() < 1e-9);
        assert_eq!(greet.support, 2);
        // weighted: (1/3)*billing + (2/3)*greet
        let expected = (billing.f1 + 2.0 * greet.f1) / 3.0;
        assert!((report.weighted_avg.f1 - expected).abs() < 1e-9);
    }

    #[test]
    fn test_absent_intents_are_not_scored() {
        let mut cm = ConfusionMatrix::new(3);
        cm.add(2, 2);
        let report = ClassificationReport::from_confusion(
            SplitKind::Evaluation,
            &labels(&["a", "b", "c"]),
            cm,
            vec![],
            0,
        );
        assert_eq!(report.per_intent.len(), 1);
        assert_eq!(report.macro_avg.f1, 1.0);
    }

    #[test]
    fn test_empty_report_has_zero_scores() {
        let report = ClassificationReport::from_confusion(
            SplitKind::Testing,
            &labels(&["a"]),
            ConfusionMatrix::new(1),
            vec![],
            0,
        );
        assert_eq!(report.accuracy, 0.0);
        assert!(report.per_intent.is_empty());
    }

    #[test]
    fn test_regression_match_rate() {
        let report = RegressionReport::new(
            vec![
                RegressionRecord::new("hi", "greet", "greet"),
                RegressionRecord::new("pay", "billing", "greet"),
            ],
            0,
        );
        assert_eq!(report.match_rate, 0.5);
        assert_eq!(report.mismatches().count(), 1);
    }
}
