// ============================================================
// Layer 3 — Core Error Type
// ============================================================
// Every failure the encode/decode core can surface.
//
// The outer layers (application, infra, ml) work with
// anyhow::Result; IntentError implements std::error::Error
// so `?` converts it on the way out.
//
//   Schema            — a split is missing a column, is empty,
//                       or has a row with an empty intent
//   LabelConsistency  — splits disagree on intents, or an
//                       intent is unknown to the registry
//   Encoding          — the tokenizer rejected a specific row
//   Drift             — decode max length differs from the one
//                       recorded when the build was encoded

use thiserror::Error;

use crate::domain::utterance::SplitKind;

#[derive(Error, Debug)]
pub enum IntentError {
    #[error("schema error in {split} split: {reason}")]
    Schema { split: SplitKind, reason: String },

    #[error("label consistency error: {0}")]
    LabelConsistency(String),

    #[error("encoding error in {split} split, row {row}: {reason}")]
    Encoding {
        split:  SplitKind,
        /// 1-based data row number (header excluded)
        row:    usize,
        reason: String,
    },

    #[error("max sequence length drift: decoder was given {supplied}, build recorded {recorded}")]
    Drift { supplied: usize, recorded: usize },

    #[error("prediction error: {0}")]
    Prediction(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntentError {
    pub fn schema(split: SplitKind, reason: impl Into<String>) -> Self {
        IntentError::Schema { split, reason: reason.into() }
    }

    pub fn label_consistency(msg: impl Into<String>) -> Self {
        IntentError::LabelConsistency(msg.into())
    }
}
