// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds a BERT-style WordPiece tokenizer from a vocab.txt
// file, saves it as tokenizer.json in the build output, and
// reloads that exact file for every later decode pass.
//
// vocab.txt has one token per line; the line number is the
// token id. It must contain [PAD] at id 0 (the padding id
// the encoder writes) plus [UNK], [CLS] and [SEP].
//
// The tokenizer JSON is written by hand and loaded with
// Tokenizer::from_file, which keeps us independent of the
// tokenizers crate's builder generics.
//
//   normalizer     BertNormalizer (lowercase, clean text)
//   pre_tokenizer  BertPreTokenizer (whitespace + punctuation)
//   model          WordPiece, "##" continuation prefix
//
// Reference: Wu et al. (2016) WordPiece
//            Devlin et al. (2019) BERT

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::domain::traits::TextTokenizer;

const TOKENIZER_FILE: &str = "tokenizer.json";
const SPECIAL_TOKENS: [&str; 4] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load the tokenizer.json saved by a previous build.
    pub fn load(&self) -> Result<WordPieceTokenizer> {
        let path = self.path();
        let inner = Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })?;
        WordPieceTokenizer::new(inner)
    }

    /// Build a WordPiece tokenizer from `vocab_path`, write it to
    /// tokenizer.json, and load it back.
    pub fn build_from_vocab(&self, vocab_path: impl AsRef<Path>) -> Result<WordPieceTokenizer> {
        let vocab_path = vocab_path.as_ref();
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Read vocab.txt ────────────────────────────────────────────
        let text = std::fs::read_to_string(vocab_path)
            .with_context(|| format!("Cannot read vocabulary '{}'", vocab_path.display()))?;

        // Ids are line numbers, so a skipped line would leave a gap
        // past the embedding table.
        let mut vocab = serde_json::Map::new();
        for (id, line) in text.lines().enumerate() {
            let token = line.trim_end_matches('\r');
            if token.is_empty() {
                anyhow::bail!("Vocabulary '{}' has a blank line {}", vocab_path.display(), id + 1);
            }
            if vocab.contains_key(token) {
                anyhow::bail!(
                    "Vocabulary '{}' repeats '{}' on line {}",
                    vocab_path.display(), token, id + 1
                );
            }
            vocab.insert(token.to_string(), serde_json::json!(id));
        }

        // ── Step 2: Check the special tokens ──────────────────────────────────
        for token in SPECIAL_TOKENS {
            if !vocab.contains_key(token) {
                anyhow::bail!("Vocabulary '{}' has no {} token", vocab_path.display(), token);
            }
        }
        if vocab.get("[PAD]") != Some(&serde_json::json!(0)) {
            anyhow::bail!("Vocabulary '{}' must have [PAD] on its first line", vocab_path.display());
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .map(|t| {
                let id = vocab[*t].clone();
                serde_json::json!({
                    "id": id, "content": t, "single_word": false, "lstrip": false,
                    "rstrip": false, "normalized": false, "special": true
                })
            })
            .collect();

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "BertPreTokenizer"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordPiece",
                "unk_token": "[UNK]",
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": 100,
                "vocab": vocab
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built from '{}' ({} tokens), saved to '{}'",
            vocab_path.display(),
            vocab.len(),
            tok_path.display()
        );

        self.load()
    }
}

// ─── WordPieceTokenizer ───────────────────────────────────────────────────────

/// TextTokenizer over a HuggingFace tokenizer.
pub struct WordPieceTokenizer {
    inner:  Tokenizer,
    unk_id: u32,
}

impl WordPieceTokenizer {
    pub fn new(inner: Tokenizer) -> Result<Self> {
        let unk_id = inner
            .token_to_id("[UNK]")
            .ok_or_else(|| anyhow::anyhow!("Tokenizer has no [UNK] token"))?;
        Ok(Self { inner, unk_id })
    }

    /// Rows the token embedding needs: one past the largest id.
    pub fn vocab_size(&self) -> usize {
        self.inner
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |&id| id as usize + 1)
    }
}

impl TextTokenizer for WordPieceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.inner.token_to_id(t).unwrap_or(self.unk_id))
            .collect()
    }
}
