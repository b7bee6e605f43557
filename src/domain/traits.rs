// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The encode/decode core never talks to a concrete tokenizer,
// model, or file format. It talks to these three traits:
//
//   SplitSource      — yields a labelled split
//                      (CsvSplitLoader in Layer 4)
//   TextTokenizer    — text → tokens → ids
//                      (WordPieceTokenizer in Layer 6)
//   IntentClassifier — id batches → probability vectors
//                      (BurnIntentClassifier in Layer 5)
//
// Unit tests swap in tiny in-memory implementations, so the
// whole core is testable without a vocabulary file or a GPU.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::error::IntentError;
use crate::domain::utterance::{Split, SplitKind};

// ─── SplitSource ──────────────────────────────────────────────────────────────
/// Any component that can load one dataset split.
pub trait SplitSource {
    fn load_split(&self, kind: SplitKind) -> Result<Split, IntentError>;
}

// ─── TextTokenizer ────────────────────────────────────────────────────────────
/// The tokenizer capability the encoder consumes.
///
/// `convert_tokens_to_ids` must return exactly one id per token,
/// in the same order.
pub trait TextTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32>;
}

// ─── IntentClassifier ─────────────────────────────────────────────────────────
/// The classifier capability the decoder consumes.
///
/// Returns one probability vector per input row; every vector
/// has one entry per registered intent.
pub trait IntentClassifier {
    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}
