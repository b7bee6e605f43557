// ============================================================
// Evaluation — Decoder
// ============================================================
// Turns classifier output on a held-out split back into
// intent strings.
//
// One pass through the decoder:
//
//   Idle ──► Encoding ──► Predicting ──► Decoding ──► Aggregated
//              │              │              │
//              └──────────────┴──────────────┴──► Failed
//
//   Encoding    same tokenizer, same `fit_sequence`, and the
//               max_sequence_length recorded at build time
//   Predicting  classifier.predict() in batches
//   Decoding    argmax → registry.intent_of()
//   Aggregated  ClassificationReport or RegressionReport
//
// Aggregated and Failed are terminal: a decoder runs exactly
// one pass. Nothing is retried.
//
// The recorded length is cross-checked at construction, so a
// decoder that would pad differently from the encoder can
// never be built.

use std::collections::BTreeSet;

use crate::data::encoder::{
    check_sequence_length, fit_sequence, tokenize_split, EncodingPolicy, SpecialIds,
};
use crate::data::registry::LabelRegistry;
use crate::domain::error::IntentError;
use crate::domain::metadata::BuildMetadata;
use crate::domain::record::RegressionRecord;
use crate::domain::traits::{IntentClassifier, TextTokenizer};
use crate::domain::utterance::Split;
use crate::evaluation::report::{ClassificationReport, ConfusionMatrix, RegressionReport};

/// Rows per `predict` call
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Idle,
    Encoding,
    Predicting,
    Decoding,
    Aggregated,
    Failed,
}

/// One decoded row: position in the split and predicted class.
struct DecodedRow {
    index:     usize,
    predicted: usize,
}

pub struct Decoder<'a, C: IntentClassifier + ?Sized, T: TextTokenizer + ?Sized> {
    classifier:          &'a C,
    tokenizer:           &'a T,
    registry:            &'a LabelRegistry,
    max_sequence_length: usize,
    batch_size:          usize,
    policy:              EncodingPolicy,
    excluded:            BTreeSet<String>,
    state:               DecoderState,
}

impl<'a, C, T> Decoder<'a, C, T>
where
    C: IntentClassifier + ?Sized,
    T: TextTokenizer + ?Sized,
{
    /// Fails with `Drift` when `max_sequence_length` differs from
    /// the recorded one, and with `LabelConsistency` when the
    /// registry's intents differ from the recorded intents.
    pub fn new(
        classifier:          &'a C,
        tokenizer:           &'a T,
        registry:            &'a LabelRegistry,
        max_sequence_length: usize,
        metadata:            &BuildMetadata,
    ) -> Result<Self, IntentError> {
        if max_sequence_length != metadata.max_sequence_length {
            return Err(IntentError::Drift {
                supplied: max_sequence_length,
                recorded: metadata.max_sequence_length,
            });
        }
        check_sequence_length(max_sequence_length)?;

        if registry.intents() != metadata.intents.as_slice() {
            return Err(IntentError::label_consistency(format!(
                "registry intents {:?} differ from the {} intents recorded by build {}",
                registry.intents(),
                metadata.intents.len(),
                metadata.build_version
            )));
        }

        Ok(Self {
            classifier,
            tokenizer,
            registry,
            max_sequence_length,
            batch_size: DEFAULT_BATCH_SIZE,
            policy: EncodingPolicy::default(),
            excluded: BTreeSet::new(),
            state: DecoderState::Idle,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_policy(mut self, policy: EncodingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Intents whose rows are left out of accuracy metrics
    /// (lenient consistency). Regression records are still
    /// produced for them.
    pub fn with_excluded_intents(mut self, excluded: BTreeSet<String>) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    // ─── Passes ───────────────────────────────────────────────────────────────

    /// Held-out evaluation: accuracy, per-intent scores, and
    /// confusion counts.
    pub fn evaluate(&mut self, split: &Split) -> Result<ClassificationReport, IntentError> {
        let (decoded, skipped) = self.run(split)?;

        let result = (|| -> Result<ClassificationReport, IntentError> {
            let mut confusion = ConfusionMatrix::new(self.registry.len());
            let mut left_out  = 0usize;

            for row in &decoded {
                let expected = &split.rows()[row.index].intent;
                if self.excluded.contains(expected) {
                    left_out += 1;
                    continue;
                }
                let truth = self.registry.index_of(expected)?;
                confusion.add(truth, row.predicted);
            }

            if left_out > 0 {
                tracing::warn!(
                    "Left {} {} rows with intents unseen in training out of the metrics",
                    left_out, split.kind
                );
            }

            Ok(ClassificationReport::from_confusion(
                split.kind,
                self.registry.intents(),
                confusion,
                self.excluded.iter().cloned().collect(),
                skipped,
            ))
        })();

        self.finish(result)
    }

    /// Regression tracking: one record per row plus the match
    /// rate. Records belong to this pass only.
    pub fn regress(&mut self, split: &Split) -> Result<RegressionReport, IntentError> {
        let (decoded, skipped) = self.run(split)?;

        let result = (|| -> Result<RegressionReport, IntentError> {
            let mut results = Vec::with_capacity(decoded.len());
            for row in &decoded {
                let utterance = &split.rows()[row.index];
                let actual    = self.registry.intent_of(row.predicted)?;
                results.push(RegressionRecord::new(
                    utterance.text.clone(),
                    utterance.intent.clone(),
                    actual,
                ));
            }
            Ok(RegressionReport::new(results, skipped))
        })();

        self.finish(result)
    }

    // ─── Shared Pass Steps ────────────────────────────────────────────────────

    fn finish<R>(&mut self, result: Result<R, IntentError>) -> Result<R, IntentError> {
        self.state = match &result {
            Ok(_)  => DecoderState::Aggregated,
            Err(_) => DecoderState::Failed,
        };
        result
    }

    /// Encoding → Predicting → Decoding. Leaves the decoder in
    /// `Decoding` on success and `Failed` on error.
    fn run(&mut self, split: &Split) -> Result<(Vec<DecodedRow>, usize), IntentError> {
        if self.state != DecoderState::Idle {
            return Err(IntentError::InvalidState(format!(
                "decoder already ran a pass (state {:?})",
                self.state
            )));
        }

        let result = self.run_steps(split);
        if result.is_err() {
            self.state = DecoderState::Failed;
        }
        result
    }

    fn run_steps(&mut self, split: &Split) -> Result<(Vec<DecodedRow>, usize), IntentError> {
        // ── Step 1: Encode with the recorded length ───────────────────────────
        self.state = DecoderState::Encoding;
        let special = SpecialIds::resolve(self.tokenizer)?;
        let (rows, skipped) = tokenize_split(self.tokenizer, split, self.policy)?;
        let x: Vec<Vec<u32>> = rows
            .iter()
            .map(|row| fit_sequence(&row.body, self.max_sequence_length, special))
            .collect();
        tracing::debug!("Encoded {} {} rows at length {}", x.len(), split.kind, self.max_sequence_length);

        // ── Step 2: Predict in batches ────────────────────────────────────────
        self.state = DecoderState::Predicting;
        let mut probabilities = Vec::with_capacity(x.len());
        for batch in x.chunks(self.batch_size) {
            let out = self
                .classifier
                .predict(batch)
                .map_err(|e| IntentError::Prediction(e.to_string()))?;
            if out.len() != batch.len() {
                return Err(IntentError::Prediction(format!(
                    "classifier returned {} rows for a batch of {}",
                    out.len(),
                    batch.len()
                )));
            }
            probabilities.extend(out);
        }

        // ── Step 3: argmax each row ───────────────────────────────────────────
        self.state = DecoderState::Decoding;
        let mut decoded = Vec::with_capacity(rows.len());
        for (row, probs) in rows.iter().zip(&probabilities) {
            if probs.len() != self.registry.len() {
                return Err(IntentError::Prediction(format!(
                    "probability vector has {} entries, registry has {} intents",
                    probs.len(),
                    self.registry.len()
                )));
            }
            decoded.push(DecodedRow { index: row.index, predicted: argmax(probs)? });
        }

        Ok((decoded, skipped.len()))
    }
}

/// Index of the largest probability; the first wins on ties.
fn argmax(probs: &[f32]) -> Result<usize, IntentError> {
    let mut best = 0usize;
    for (i, &p) in probs.iter().enumerate() {
        if p.is_nan() {
            return Err(IntentError::Prediction("probability vector contains NaN".into()));
        }
        if p > probs[best] {
            best = i;
        }
    }
    Ok(best)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::{SequenceEncoder, DEFAULT_CEILING};
    use crate::domain::utterance::SplitKind;
    use crate::testing::{split, LookupClassifier, MisshapenClassifier, WhitespaceTokenizer};

    fn tokenizer() -> WhitespaceTokenizer {
        WhitespaceTokenizer::new(&["hello", "world", "pay", "my", "bill"])
    }

    fn metadata(registry: &LabelRegistry, max_sequence_length: usize) -> BuildMetadata {
        BuildMetadata {
            model_name:          "intent-model".into(),
            build_version:       "test".into(),
            ceiling:             DEFAULT_CEILING,
            max_sequence_length,
            intents:             registry.intents().to_vec(),
            text_column:         "text".into(),
            intent_column:       "intent".into(),
        }
    }

    #[test]
    fn test_scenario_c_regression_match() {
        let tok   = tokenizer();
        let train = split(SplitKind::Training,   &[("hello world", "greet")]);
        let test  = split(SplitKind::Testing,    &[("hello world", "greet")]);
        let regr  = split(SplitKind::Regression, &[("hello world", "greet")]);
        let reg   = LabelRegistry::build(&[&train, &test, &regr]).unwrap();

        let encoded = SequenceEncoder::new(&tok, &reg, DEFAULT_CEILING)
            .unwrap()
            .encode(&[&train, &test])
            .unwrap();
        let meta = metadata(&reg, encoded.max_sequence_length);
        let clf  = LookupClassifier::new(1, &[(tok.id("hello"), 0)]);

        let mut decoder = Decoder::new(&clf, &tok, &reg, encoded.max_sequence_length, &meta).unwrap();
        let report = decoder.regress(&regr).unwrap();

        assert_eq!(report.results[0].actual_label, "greet");
        assert!(report.results[0].matched);
        assert_eq!(report.match_rate, 1.0);
        assert_eq!(decoder.state(), DecoderState::Aggregated);
    }

    #[test]
    fn test_scenario_d_lenient_excludes_unseen_intent() {
        let tok   = tokenizer();
        let train = split(SplitKind::Training,   &[("hello world", "greet")]);
        let eval  = split(SplitKind::Evaluation, &[("hello", "greet"), ("pay my bill", "billing")]);
        let reg   = LabelRegistry::build(&[&train, &eval]).unwrap();

        let report = LabelRegistry::validate_consistency(
            &train.intent_set(),
            &[(SplitKind::Evaluation, eval.intent_set())],
            crate::data::registry::ConsistencyPolicy::Lenient,
        )
        .unwrap();

        let greet = reg.index_of("greet").unwrap();
        let clf   = LookupClassifier::new(reg.len(), &[(tok.id("hello"), greet), (tok.id("pay"), greet)]);
        let meta  = metadata(&reg, 5);

        let mut decoder = Decoder::new(&clf, &tok, &reg, 5, &meta)
            .unwrap()
            .with_excluded_intents(report.unseen_in_training);
        let out = decoder.evaluate(&eval).unwrap();

        assert_eq!(out.total, 1);
        assert_eq!(out.accuracy, 1.0);
        assert_eq!(out.excluded, vec!["billing".to_string()]);
    }

    #[test]
    fn test_drift_is_rejected_at_construction() {
        let tok   = tokenizer();
        let train = split(SplitKind::Training, &[("hello", "greet")]);
        let reg   = LabelRegistry::build(&[&train]).unwrap();
        let clf   = LookupClassifier::new(1, &[]);
        let meta  = metadata(&reg, 4);

        let err = Decoder::new(&clf, &tok, &reg, 6, &meta).err().unwrap();
        assert!(matches!(err, IntentError::Drift { supplied: 6, recorded: 4 }));
    }

    #[test]
    fn test_registry_mismatch_is_rejected() {
        let tok   = tokenizer();
        let train = split(SplitKind::Training, &[("hello", "greet")]);
        let reg   = LabelRegistry::build(&[&train]).unwrap();
        let clf   = LookupClassifier::new(1, &[]);
        let mut meta = metadata(&reg, 4);
        meta.intents.push("billing".into());

        let err = Decoder::new(&clf, &tok, &reg, 4, &meta).err().unwrap();
        assert!(matches!(err, IntentError::LabelConsistency(_)));
    }

    #[test]
    fn test_second_pass_is_invalid_state() {
        let tok   = tokenizer();
        let train = split(SplitKind::Training, &[("hello", "greet")]);
        let reg   = LabelRegistry::build(&[&train]).unwrap();
        let clf   = LookupClassifier::new(1, &[]);
        let meta  = metadata(&reg, 4);

        let mut decoder = Decoder::new(&clf, &tok, &reg, 4, &meta).unwrap();
        decoder.evaluate(&train).unwrap();
        assert!(matches!(decoder.regress(&train), Err(IntentError::InvalidState(_))));
    }

    #[test]
    fn test_misshapen_predictions_fail_the_pass() {
        let tok   = tokenizer();
        let train = split(SplitKind::Training, &[("hello", "greet"), ("pay", "billing")]);
        let reg   = LabelRegistry::build(&[&train]).unwrap();
        let meta  = metadata(&reg, 4);

        let mut decoder = Decoder::new(&MisshapenClassifier, &tok, &reg, 4, &meta).unwrap();
        assert!(matches!(decoder.evaluate(&train), Err(IntentError::Prediction(_))));
        assert_eq!(decoder.state(), DecoderState::Failed);
    }

    #[test]
    fn test_confusion_counts_mispredictions() {
        let tok   = tokenizer();
        let eval  = split(
            SplitKind::Evaluation,
            &[("hello", "greet"), ("pay my bill", "billing"), ("my bill", "billing")],
        );
        let reg   = LabelRegistry::build(&[&eval]).unwrap();
        let greet   = reg.index_of("greet").unwrap();
        let billing = reg.index_of("billing").unwrap();
        // "my bill" starts with "my", which maps to greet
        let clf = LookupClassifier::new(
            2,
            &[(tok.id("hello"), greet), (tok.id("pay"), billing), (tok.id("my"), greet)],
        );
        let meta = metadata(&reg, 5);

        let mut decoder = Decoder::new(&clf, &tok, &reg, 5, &meta).unwrap().with_batch_size(2);
        let report = decoder.evaluate(&eval).unwrap();

        assert_eq!(report.confusion.get(billing, greet), 1);
        assert_eq!(report.confusion.get(billing, billing), 1);
        assert_eq!(report.confusion.get(greet, greet), 1);
        assert_eq!(report.correct, 2);
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]).unwrap(), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.2]).unwrap(), 1);
        assert!(argmax(&[0.1, f32::NAN]).is_err());
    }
}
