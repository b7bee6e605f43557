// ============================================================
// Layer 4 — Label Registry
// ============================================================
// The single canonical mapping between intent strings and the
// integer class indices the classifier is trained on.
//
// How indices are assigned:
//   1. Collect the distinct intents of EVERY split given
//   2. Sort them lexicographically
//   3. index = position in the sorted list
//
// Sorting makes the assignment a pure function of the intent
// set: the same splits always produce the same indices,
// whatever order rows or splits arrive in.
//
// The registry has no mutating methods. It is built once per
// build and shared by `&LabelRegistry` with the encoder and
// the decoder, so both read labels through the same instance.
// Adding intents means building a new registry.
//
// Reference: Rust Book §8 (Hash Maps)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::error::IntentError;
use crate::domain::utterance::{Split, SplitKind};

/// How `validate_consistency` treats splits whose intent set
/// differs from the training split's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyPolicy {
    /// Any mismatch aborts the build
    #[default]
    Strict,
    /// Mismatches are logged; intents unseen in training are
    /// excluded from accuracy metrics
    Lenient,
}

/// Result of a consistency check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Intents that appear in some non-training split but never
    /// in training. Always empty under the strict policy.
    pub unseen_in_training: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRegistry {
    intents: Vec<String>,
    index:   HashMap<String, usize>,
}

impl LabelRegistry {
    /// Build the registry from the union of intents in `splits`.
    ///
    /// Fails with `Schema` if any split has no rows or contains
    /// a row whose intent is empty.
    pub fn build(splits: &[&Split]) -> Result<Self, IntentError> {
        let mut all = BTreeSet::new();

        for split in splits {
            if split.is_empty() {
                return Err(IntentError::schema(split.kind, "split has no rows"));
            }
            for (i, row) in split.rows().iter().enumerate() {
                if row.intent.trim().is_empty() {
                    return Err(IntentError::schema(
                        split.kind,
                        format!("row {} has an empty intent", i + 1),
                    ));
                }
                all.insert(row.intent.clone());
            }
        }

        // BTreeSet iterates in sorted order
        let intents: Vec<String> = all.into_iter().collect();
        let index = intents
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        tracing::debug!("Label registry built with {} intents", intents.len());
        Ok(Self { intents, index })
    }

    /// Compare every non-training split's intent set against the
    /// training set.
    pub fn validate_consistency(
        training_intents: &BTreeSet<String>,
        others:           &[(SplitKind, BTreeSet<String>)],
        policy:           ConsistencyPolicy,
    ) -> Result<ConsistencyReport, IntentError> {
        let mut report = ConsistencyReport::default();

        for (kind, intents) in others {
            if intents == training_intents {
                continue;
            }

            let unseen: Vec<&String> = intents.difference(training_intents).collect();
            let missing: Vec<&String> = training_intents.difference(intents).collect();

            match policy {
                ConsistencyPolicy::Strict => {
                    return Err(IntentError::label_consistency(format!(
                        "{kind} intents differ from training intents \
                         (not in training: {unseen:?}, absent from {kind}: {missing:?})"
                    )));
                }
                ConsistencyPolicy::Lenient => {
                    tracing::warn!(
                        "{} intents differ from training intents (not in training: {:?}, absent from {}: {:?})",
                        kind, unseen, kind, missing
                    );
                    report
                        .unseen_in_training
                        .extend(unseen.into_iter().cloned());
                }
            }
        }

        if !report.unseen_in_training.is_empty() {
            tracing::warn!(
                "Excluding intents unseen in training from accuracy metrics: {:?}",
                report.unseen_in_training
            );
        }

        Ok(report)
    }

    pub fn index_of(&self, intent: &str) -> Result<usize, IntentError> {
        self.index.get(intent).copied().ok_or_else(|| {
            IntentError::label_consistency(format!("intent '{intent}' is not in the registry"))
        })
    }

    pub fn intent_of(&self, index: usize) -> Result<&str, IntentError> {
        self.intents.get(index).map(String::as_str).ok_or_else(|| {
            IntentError::label_consistency(format!(
                "index {index} is out of range for {} intents",
                self.intents.len()
            ))
        })
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.index.contains_key(intent)
    }

    /// All intents in index order.
    pub fn intents(&self) -> &[String] {
        &self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utterance::Utterance;

    fn split(kind: SplitKind, rows: &[(&str, &str)]) -> Split {
        Split::new(
            kind,
            rows.iter().map(|(t, i)| Utterance::new(*t, *i)).collect(),
        )
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorted_union_of_all_splits() {
        let train = split(SplitKind::Training, &[("a", "weather"), ("b", "greet")]);
        let test  = split(SplitKind::Testing,  &[("c", "billing")]);
        let reg   = LabelRegistry::build(&[&train, &test]).unwrap();
        assert_eq!(reg.intents(), &["billing", "greet", "weather"]);
        assert_eq!(reg.index_of("greet").unwrap(), 1);
    }

    #[test]
    fn test_round_trip_both_directions() {
        let train = split(SplitKind::Training, &[("a", "x"), ("b", "y"), ("c", "z")]);
        let reg   = LabelRegistry::build(&[&train]).unwrap();
        for s in reg.intents() {
            assert_eq!(reg.intent_of(reg.index_of(s).unwrap()).unwrap(), s);
        }
        for i in 0..reg.len() {
            assert_eq!(reg.index_of(reg.intent_of(i).unwrap()).unwrap(), i);
        }
    }

    #[test]
    fn test_deterministic_regardless_of_order() {
        let a = split(SplitKind::Training, &[("1", "b"), ("2", "a"), ("3", "c")]);
        let b = split(SplitKind::Training, &[("3", "c"), ("1", "b"), ("2", "a")]);
        let t = split(SplitKind::Testing,  &[("4", "a")]);
        let first  = LabelRegistry::build(&[&a, &t]).unwrap();
        let second = LabelRegistry::build(&[&t, &b]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_split_is_schema_error() {
        let train = split(SplitKind::Training, &[("a", "greet")]);
        let empty = split(SplitKind::Evaluation, &[]);
        let err   = LabelRegistry::build(&[&train, &empty]).unwrap_err();
        assert!(matches!(err, IntentError::Schema { split: SplitKind::Evaluation, .. }));
    }

    #[test]
    fn test_empty_intent_is_schema_error() {
        let train = split(SplitKind::Training, &[("a", "greet"), ("b", "  ")]);
        assert!(matches!(
            LabelRegistry::build(&[&train]),
            Err(IntentError::Schema { .. })
        ));
    }

    #[test]
    fn test_unknown_lookups_are_typed() {
        let train = split(SplitKind::Training, &[("a", "greet")]);
        let reg   = LabelRegistry::build(&[&train]).unwrap();
        assert!(matches!(reg.index_of("billing"), Err(IntentError::LabelConsistency(_))));
        assert!(matches!(reg.intent_of(5), Err(IntentError::LabelConsistency(_))));
    }

    #[test]
    fn test_strict_rejects_mismatch() {
        let err = LabelRegistry::validate_consistency(
            &set(&["greet"]),
            &[(SplitKind::Evaluation, set(&["greet", "billing"]))],
            ConsistencyPolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, IntentError::LabelConsistency(_)));
    }

    #[test]
    fn test_strict_accepts_identical_sets() {
        let report = LabelRegistry::validate_consistency(
            &set(&["greet", "billing"]),
            &[
                (SplitKind::Testing,    set(&["billing", "greet"])),
                (SplitKind::Regression, set(&["greet", "billing"])),
            ],
            ConsistencyPolicy::Strict,
        )
        .unwrap();
        assert!(report.unseen_in_training.is_empty());
    }

    #[test]
    fn test_lenient_reports_unseen_intents() {
        let report = LabelRegistry::validate_consistency(
            &set(&["greet"]),
            &[
                (SplitKind::Evaluation, set(&["greet", "billing"])),
                (SplitKind::Testing,    set(&[])),
            ],
            ConsistencyPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(report.unseen_in_training, set(&["billing"]));
    }
}
