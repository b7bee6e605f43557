// ============================================================
// Layer 3 — Utterance and Split Domain Types
// ============================================================
// An Utterance is one labelled row: a short piece of text and
// the intent it expresses. A Split is the ordered collection
// of utterances loaded from one dataset file.
//
// There are exactly four splits per build:
//   training   — fitted by the classifier
//   testing    — held out, encoded alongside training
//   evaluation — held out, decoded after training
//   regression — tracked build over build
//
// Splits are immutable once loaded: nothing in the pipeline
// hands out a mutable reference to the rows.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One labelled example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// The raw utterance text, e.g. "what is my balance"
    pub text: String,

    /// The intent label, e.g. "check_balance"
    pub intent: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            text:   text.into(),
            intent: intent.into(),
        }
    }
}

/// Which of the four dataset partitions a split is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Training,
    Testing,
    Evaluation,
    Regression,
}

impl SplitKind {
    pub const ALL: [SplitKind; 4] = [
        SplitKind::Training,
        SplitKind::Testing,
        SplitKind::Evaluation,
        SplitKind::Regression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitKind::Training   => "training",
            SplitKind::Testing    => "testing",
            SplitKind::Evaluation => "evaluation",
            SplitKind::Regression => "regression",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered collection of utterances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    pub kind: SplitKind,
    rows:     Vec<Utterance>,
}

impl Split {
    pub fn new(kind: SplitKind, rows: Vec<Utterance>) -> Self {
        Self { kind, rows }
    }

    pub fn rows(&self) -> &[Utterance] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct intents in first-seen order.
    pub fn intents(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|u| seen.insert(u.intent.as_str()))
            .map(|u| u.intent.clone())
            .collect()
    }

    /// Distinct intents as a sorted set, for set comparisons.
    pub fn intent_set(&self) -> BTreeSet<String> {
        self.rows.iter().map(|u| u.intent.clone()).collect()
    }

    /// Number of rows per intent.
    pub fn intent_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for u in &self.rows {
            *counts.entry(u.intent.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> Split {
        Split::new(
            SplitKind::Training,
            vec![
                Utterance::new("hi", "greet"),
                Utterance::new("pay my bill", "billing"),
                Utterance::new("hello", "greet"),
            ],
        )
    }

    #[test]
    fn test_intents_first_seen_order() {
        assert_eq!(split().intents(), vec!["greet", "billing"]);
    }

    #[test]
    fn test_intent_counts() {
        let counts = split().intent_counts();
        assert_eq!(counts["greet"], 2);
        assert_eq!(counts["billing"], 1);
    }

    #[test]
    fn test_split_kind_display() {
        assert_eq!(SplitKind::Regression.to_string(), "regression");
        assert_eq!(SplitKind::ALL.len(), 4);
    }
}
