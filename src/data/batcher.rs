// ============================================================
// Layer 4 — Intent Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<IntentSample>
// into tensors.
//
//   Input:  Vec of N IntentSamples, each of length S
//   Output: IntentBatch with input_ids [N, S] and labels [N]
//
// Every sequence is already padded to max_sequence_length by
// the encoder, so the flat id buffer reshapes directly:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// The model derives its padding mask from input_ids (id 0),
// so no separate mask tensor travels with the batch.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::IntentSample;

// ─── IntentBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct IntentBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Registry class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── IntentBatcher ────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct IntentBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> IntentBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Build an [N, S] id tensor from already-padded rows.
pub fn ids_tensor<B: Backend>(rows: &[Vec<u32>], device: &B::Device) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();
    let seq_len    = rows.first().map_or(0, Vec::len);

    // Burn Int tensors take i32
    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|row| row.iter().map(|&id| id as i32))
        .collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([batch_size, seq_len])
}

impl<B: Backend> Batcher<IntentSample, IntentBatch<B>> for IntentBatcher<B> {
    fn batch(&self, items: Vec<IntentSample>) -> IntentBatch<B> {
        let rows: Vec<Vec<u32>> = items.iter().map(|s| s.input_ids.clone()).collect();
        let input_ids = ids_tensor::<B>(&rows, &self.device);

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        IntentBatch { input_ids, labels }
    }
}
