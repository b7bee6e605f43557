// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw CSV splits all the
// way to tensor batches.
//
// The pipeline flows in this order:
//
//   train.csv / test.csv / evaluate.csv / regress.csv
//       │
//       ▼
//   CsvSplitLoader    → reads rows, cleans cells
//       │
//       ▼
//   LabelRegistry     → sorted intent → index mapping
//       │
//       ▼
//   SequenceEncoder   → [CLS] ids [SEP] [PAD]... + labels
//       │
//       ▼
//   split_train_val   → seeded fit / validation split
//       │
//       ▼
//   IntentDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   IntentBatcher     → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Loads labelled splits from CSV files
pub mod loader;

/// Cleans raw cell text
pub mod preprocessor;

/// Canonical intent ↔ index mapping
pub mod registry;

/// Two-phase text → fixed-length id sequence encoder
pub mod encoder;

/// Per-split intent lists and counts
pub mod summary;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into fit/validation sets
pub mod splitter;
