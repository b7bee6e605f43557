// ============================================================
// Layer 3 — Build Metadata
// ============================================================
// Facts recorded when a build is encoded and trained, which
// every later decode pass must agree with:
//
//   max_sequence_length — the length the encoder settled on
//   intents             — the registry's intents, index order
//
// Stored as build_metadata.json next to the checkpoint
// (see infra::checkpoint). This layer only defines the shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub model_name:          String,
    pub build_version:       String,
    pub ceiling:             usize,
    pub max_sequence_length: usize,
    /// Registry intents in index order
    pub intents:             Vec<String>,
    pub text_column:         String,
    pub intent_column:       String,
}
