// ============================================================
// Layer 3 — Regression Record Domain Type
// ============================================================
// One row of a regression-tracking pass: the utterance, the
// label the regression dataset expects, the label the current
// build predicted, and whether the two agree.
//
// Records are produced fresh by every pass and belong to one
// build only. Serialised field names follow the report format
// consumed downstream:
//
//   {"text": ..., "expected_label": ..., "actual_label": ..., "match": true}
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionRecord {
    pub text: String,

    pub expected_label: String,

    pub actual_label: String,

    /// `match` is a keyword, so the field is renamed on the wire
    #[serde(rename = "match")]
    pub matched: bool,
}

impl RegressionRecord {
    pub fn new(
        text:           impl Into<String>,
        expected_label: impl Into<String>,
        actual_label:   impl Into<String>,
    ) -> Self {
        let expected_label = expected_label.into();
        let actual_label   = actual_label.into();
        let matched        = expected_label == actual_label;
        Self {
            text: text.into(),
            expected_label,
            actual_label,
            matched,
        }
    }
}
