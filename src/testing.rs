// ============================================================
// Test Support
// ============================================================
// In-memory stand-ins for the tokenizer and classifier so the
// encode/decode core can be unit tested without a vocab file,
// a checkpoint, or a GPU.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::domain::traits::{IntentClassifier, TextTokenizer};
use crate::domain::utterance::{Split, SplitKind, Utterance};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 100;
pub const CLS_ID: u32 = 101;
pub const SEP_ID: u32 = 102;

/// Lowercases, splits on whitespace, and looks words up in a
/// fixed vocabulary. Words are numbered from 1000 upwards.
/// Any text containing "<fail>" is rejected.
pub struct WhitespaceTokenizer {
    vocab: HashMap<String, u32>,
}

impl WhitespaceTokenizer {
    pub fn new(words: &[&str]) -> Self {
        let mut vocab: HashMap<String, u32> = HashMap::new();
        vocab.insert("[PAD]".into(), PAD_ID);
        vocab.insert("[UNK]".into(), UNK_ID);
        vocab.insert("[CLS]".into(), CLS_ID);
        vocab.insert("[SEP]".into(), SEP_ID);
        for (i, w) in words.iter().enumerate() {
            vocab.insert(w.to_string(), 1000 + i as u32);
        }
        Self { vocab }
    }

    pub fn id(&self, word: &str) -> u32 {
        self.vocab[word]
    }
}

impl TextTokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        if text.contains("<fail>") {
            bail!("cannot tokenize '{text}'");
        }
        Ok(text.split_whitespace().map(|w| w.to_lowercase()).collect())
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.vocab.get(t).copied().unwrap_or(UNK_ID))
            .collect()
    }
}

/// Predicts the class mapped to the first body token of each
/// row (position 1, right after [CLS]); class 0 otherwise.
pub struct LookupClassifier {
    pub num_classes: usize,
    pub rules:       HashMap<u32, usize>,
}

impl LookupClassifier {
    pub fn new(num_classes: usize, rules: &[(u32, usize)]) -> Self {
        Self {
            num_classes,
            rules: rules.iter().copied().collect(),
        }
    }
}

impl IntentClassifier for LookupClassifier {
    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        Ok(batch
            .iter()
            .map(|row| {
                let class = row
                    .get(1)
                    .and_then(|id| self.rules.get(id))
                    .copied()
                    .unwrap_or(0);
                let mut probs = vec![0.1 / self.num_classes as f32; self.num_classes];
                probs[class] = 0.9;
                probs
            })
            .collect())
    }
}

/// Returns probability vectors of the wrong width.
pub struct MisshapenClassifier;

impl IntentClassifier for MisshapenClassifier {
    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        Ok(batch.iter().map(|_| vec![1.0]).collect())
    }
}

pub fn split(kind: SplitKind, rows: &[(&str, &str)]) -> Split {
    Split::new(
        kind,
        rows.iter().map(|(t, i)| Utterance::new(*t, *i)).collect(),
    )
}
