// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs      — Saving and loading model weights
//                        (Burn's CompactRecorder), the model
//                        and build configs, and the build
//                        metadata the decoder checks against.
//
//   tokenizer_store.rs — Tokenizer persistence
//                        Builds a WordPiece tokenizer from
//                        vocab.txt, saves tokenizer.json, and
//                        reloads it so training and decoding
//                        share one vocabulary.
//
//   metrics.rs         — Training metrics logging
//                        Per-epoch loss / accuracy to CSV and
//                        an in-memory history.
//
//   artifacts.rs       — JSON report files (intents summary,
//                        loss / accuracy charts, evaluation
//                        and regression results).
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint, config, and metadata persistence
pub mod checkpoint;

/// WordPiece tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger and history
pub mod metrics;

/// JSON report writer
pub mod artifacts;
