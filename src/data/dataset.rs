use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoder::EncodedSplit;

/// One encoded training example.
/// Sequence format: [CLS] utterance [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSample {
    pub input_ids: Vec<u32>,
    pub label:     usize,
}

/// Zip an encoded split's parallel `x` / `y` arrays into samples.
pub fn samples_from(encoded: &EncodedSplit) -> Vec<IntentSample> {
    encoded
        .x
        .iter()
        .zip(&encoded.y)
        .map(|(ids, &label)| IntentSample { input_ids: ids.clone(), label })
        .collect()
}

pub struct IntentDataset {
    samples: Vec<IntentSample>,
}

impl IntentDataset {
    pub fn new(samples: Vec<IntentSample>) -> Self { Self { samples } }
}

impl Dataset<IntentSample> for IntentDataset {
    fn get(&self, index: usize) -> Option<IntentSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utterance::SplitKind;

    #[test]
    fn test_samples_pair_rows_with_labels() {
        let encoded = EncodedSplit {
            kind:      SplitKind::Training,
            x:         vec![vec![101, 7, 102, 0], vec![101, 8, 9, 102]],
            y:         vec![1, 0],
            skipped:   vec![],
            truncated: 0,
        };
        let samples = samples_from(&encoded);
        assert_eq!(samples[1], IntentSample { input_ids: vec![101, 8, 9, 102], label: 0 });
        assert_eq!(samples[0].label, 1);

        let dataset = IntentDataset::new(samples);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.get(2).is_none());
    }
}
