// ============================================================
// Evaluation Layer
// ============================================================
// Maps classifier output back onto intent strings and turns
// it into reports.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - Talks to the classifier only through IntentClassifier
//   - Encodes through the same fit_sequence as data::encoder
//
// Reference: scikit-learn classification_report conventions

// One-pass evaluation / regression harness
pub mod decoder;

// Confusion counts, per-intent scores, regression results
pub mod report;
