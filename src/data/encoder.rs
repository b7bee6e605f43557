// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Turns labelled utterances into fixed-length token-id
// sequences plus integer class labels.
//
// Every encoded sequence has the BERT classification layout:
//
//   [CLS] body tokens ... [SEP] [PAD] [PAD] ...
//   └──────────── max_sequence_length ─────────┘
//
// Encoding is two-phase:
//
//   Phase 1 (scan)  — tokenize every row of every split passed
//                     in, and track the longest wrapped length
//                     (body + [CLS] + [SEP]). This is a reduction
//                     over the whole call, so row order does not
//                     matter.
//
//   Phase 2 (fit)   — max_sequence_length = min(longest, ceiling);
//                     each row's body is truncated to
//                     max_sequence_length - 2, wrapped, and
//                     right-padded with 0.
//
// Training and testing are encoded in ONE call so they share a
// single max_sequence_length. That value is recorded in the
// build metadata and the decoder reuses it verbatim.
//
// `fit_sequence` is the one and only wrap/truncate/pad routine.
// The decoder calls the same function, so the encode and
// decode paths cannot drift apart.
//
// Reference: Devlin et al. (2019) BERT, §3 input representation
//            Rust Book §8 (Vectors)

use serde::{Deserialize, Serialize};

use crate::data::registry::LabelRegistry;
use crate::domain::error::IntentError;
use crate::domain::traits::TextTokenizer;
use crate::domain::utterance::{Split, SplitKind};

/// Padding id appended after [SEP]
pub const PAD_ID: u32 = 0;

/// Default upper bound on encoded sequence length
pub const DEFAULT_CEILING: usize = 128;

/// What to do when the tokenizer rejects a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingPolicy {
    /// The first failing row aborts the whole call
    #[default]
    Abort,
    /// Failing rows are logged, recorded, and left out
    SkipRow,
}

/// Vocabulary ids of the two wrapping tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialIds {
    pub cls: u32,
    pub sep: u32,
}

impl SpecialIds {
    /// Look up `[CLS]` and `[SEP]` through the tokenizer.
    pub fn resolve<T: TextTokenizer + ?Sized>(tokenizer: &T) -> Result<Self, IntentError> {
        let ids = tokenizer.convert_tokens_to_ids(&["[CLS]".to_string(), "[SEP]".to_string()]);
        match ids.as_slice() {
            [cls, sep] => Ok(Self { cls: *cls, sep: *sep }),
            _ => Err(IntentError::InvalidConfig(format!(
                "tokenizer returned {} ids for [CLS] and [SEP]",
                ids.len()
            ))),
        }
    }
}

/// A sequence length must leave room for [CLS] and [SEP].
pub fn check_sequence_length(len: usize) -> Result<(), IntentError> {
    if len < 2 {
        return Err(IntentError::InvalidConfig(format!(
            "sequence length {len} cannot hold [CLS] and [SEP]"
        )));
    }
    Ok(())
}

/// Truncate `body` to `max_len - 2` ids, wrap it in [CLS]/[SEP],
/// and right-pad with `PAD_ID` to exactly `max_len`.
///
/// Truncation happens before wrapping, so [SEP] is never cut.
/// `max_len` must be at least 2.
pub fn fit_sequence(body: &[u32], max_len: usize, special: SpecialIds) -> Vec<u32> {
    let keep = body.len().min(max_len.saturating_sub(2));

    let mut ids = Vec::with_capacity(max_len);
    ids.push(special.cls);
    ids.extend_from_slice(&body[..keep]);
    ids.push(special.sep);
    ids.resize(max_len, PAD_ID);
    ids
}

/// A row whose text could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub split:  SplitKind,
    /// 1-based data row number
    pub row:    usize,
    pub reason: String,
}

/// One tokenized row, before fitting.
#[derive(Debug, Clone)]
pub(crate) struct TokenizedRow {
    /// 0-based index into `Split::rows()`
    pub index: usize,
    pub body:  Vec<u32>,
}

/// Phase 1 for a single split: tokenize every row and convert
/// the body tokens to ids. Shared with the decoder.
pub(crate) fn tokenize_split<T: TextTokenizer + ?Sized>(
    tokenizer: &T,
    split:     &Split,
    policy:    EncodingPolicy,
) -> Result<(Vec<TokenizedRow>, Vec<SkippedRow>), IntentError> {
    let mut rows    = Vec::with_capacity(split.len());
    let mut skipped = Vec::new();

    for (index, utterance) in split.rows().iter().enumerate() {
        match tokenize_row(tokenizer, &utterance.text) {
            Ok(body) => rows.push(TokenizedRow { index, body }),
            Err(reason) => {
                let row = index + 1;
                match policy {
                    EncodingPolicy::Abort => {
                        return Err(IntentError::Encoding { split: split.kind, row, reason });
                    }
                    EncodingPolicy::SkipRow => {
                        tracing::warn!("Skipping {} row {}: {}", split.kind, row, reason);
                        skipped.push(SkippedRow { split: split.kind, row, reason });
                    }
                }
            }
        }
    }

    Ok((rows, skipped))
}

fn tokenize_row<T: TextTokenizer + ?Sized>(tokenizer: &T, text: &str) -> Result<Vec<u32>, String> {
    let tokens = tokenizer.tokenize(text).map_err(|e| e.to_string())?;
    let ids    = tokenizer.convert_tokens_to_ids(&tokens);
    if ids.len() != tokens.len() {
        return Err(format!(
            "tokenizer produced {} ids for {} tokens",
            ids.len(),
            tokens.len()
        ));
    }
    Ok(ids)
}

// ─── Encoder Output ───────────────────────────────────────────────────────────

/// Parallel arrays for one split: `x[i]` is the sequence for
/// label `y[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSplit {
    pub kind:      SplitKind,
    pub x:         Vec<Vec<u32>>,
    pub y:         Vec<usize>,
    pub skipped:   Vec<SkippedRow>,
    /// Rows whose body was cut to fit
    pub truncated: usize,
}

impl EncodedSplit {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Everything produced by one `SequenceEncoder::encode` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSplits {
    pub splits:              Vec<EncodedSplit>,
    pub max_sequence_length: usize,
}

impl EncodedSplits {
    pub fn get(&self, kind: SplitKind) -> Option<&EncodedSplit> {
        self.splits.iter().find(|s| s.kind == kind)
    }
}

// ─── SequenceEncoder ──────────────────────────────────────────────────────────

pub struct SequenceEncoder<'a, T: TextTokenizer + ?Sized> {
    tokenizer: &'a T,
    registry:  &'a LabelRegistry,
    ceiling:   usize,
    policy:    EncodingPolicy,
}

impl<'a, T: TextTokenizer + ?Sized> SequenceEncoder<'a, T> {
    pub fn new(
        tokenizer: &'a T,
        registry:  &'a LabelRegistry,
        ceiling:   usize,
    ) -> Result<Self, IntentError> {
        check_sequence_length(ceiling)?;
        Ok(Self {
            tokenizer,
            registry,
            ceiling,
            policy: EncodingPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: EncodingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Encode all `splits` together so they share one
    /// max_sequence_length.
    pub fn encode(&self, splits: &[&Split]) -> Result<EncodedSplits, IntentError> {
        if splits.is_empty() {
            return Err(IntentError::InvalidConfig("no splits given to encode".into()));
        }
        let special = SpecialIds::resolve(self.tokenizer)?;

        // ── Phase 1: tokenize and find the longest wrapped row ────────────────
        // Empty input still wraps to [CLS][SEP], hence the floor of 2.
        let mut scanned  = Vec::with_capacity(splits.len());
        let mut observed = 2usize;

        for split in splits {
            let (rows, skipped) = tokenize_split(self.tokenizer, split, self.policy)?;
            for row in &rows {
                observed = observed.max(row.body.len() + 2);
            }
            scanned.push((*split, rows, skipped));
        }

        let max_len = observed.min(self.ceiling);
        tracing::info!(
            "Longest wrapped sequence {} tokens, ceiling {}, using max_sequence_length={}",
            observed, self.ceiling, max_len
        );

        // ── Phase 2: label, truncate, wrap, and pad every row ─────────────────
        let mut encoded = Vec::with_capacity(scanned.len());

        for (split, rows, skipped) in scanned {
            let mut x         = Vec::with_capacity(rows.len());
            let mut y         = Vec::with_capacity(rows.len());
            let mut truncated = 0usize;

            for row in &rows {
                let intent = &split.rows()[row.index].intent;
                y.push(self.registry.index_of(intent)?);

                if row.body.len() + 2 > max_len {
                    truncated += 1;
                }
                x.push(fit_sequence(&row.body, max_len, special));
            }

            if truncated > 0 {
                tracing::info!("Truncated {} of {} {} rows", truncated, rows.len(), split.kind);
            }

            encoded.push(EncodedSplit { kind: split.kind, x, y, skipped, truncated });
        }

        Ok(EncodedSplits { splits: encoded, max_sequence_length: max_len })
    }
}
