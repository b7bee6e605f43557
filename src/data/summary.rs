// ============================================================
// Layer 4 — Intents Summary
// ============================================================
// Describes the label space of a build before anything is
// encoded:
//
//   {
//     "intents": ["billing", "greet"],
//     "training_set": {
//       "intent": ["greet", "billing"],
//       "count":  {"billing": 12, "greet": 30}
//     },
//     "testing_set": { ... },
//     ...
//   }
//
// `intents` is the registry order. Each `<split>_set.intent`
// lists that split's intents in first-seen order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::registry::LabelRegistry;
use crate::domain::utterance::Split;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIntents {
    pub intent: Vec<String>,
    pub count:  BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentsSummary {
    pub intents: Vec<String>,

    /// Keyed "<split>_set"
    #[serde(flatten)]
    pub splits: BTreeMap<String, SplitIntents>,
}

impl IntentsSummary {
    pub fn new(registry: &LabelRegistry, splits: &[&Split]) -> Self {
        let splits = splits
            .iter()
            .map(|split| {
                (
                    format!("{}_set", split.kind),
                    SplitIntents {
                        intent: split.intents(),
                        count:  split.intent_counts(),
                    },
                )
            })
            .collect();

        Self {
            intents: registry.intents().to_vec(),
            splits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utterance::SplitKind;
    use crate::testing::split;

    #[test]
    fn test_summary_json_shape() {
        let train = split(SplitKind::Training, &[("a", "greet"), ("b", "billing"), ("c", "greet")]);
        let test  = split(SplitKind::Testing,  &[("d", "billing")]);
        let reg   = LabelRegistry::build(&[&train, &test]).unwrap();

        let summary = IntentsSummary::new(&reg, &[&train, &test]);
        let json    = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["intents"], serde_json::json!(["billing", "greet"]));
        assert_eq!(json["training_set"]["intent"], serde_json::json!(["greet", "billing"]));
        assert_eq!(json["training_set"]["count"]["greet"], 2);
        assert_eq!(json["testing_set"]["count"]["billing"], 1);
    }
}
