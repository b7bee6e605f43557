// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles the encoded training samples and splits them:
//   - Fit set:        used to update model weights
//   - Validation set: scored each epoch (val_loss, val_acc)
//
// Intent CSVs are usually grouped by intent, so splitting
// without a shuffle would hold out whole intents.
//
// The validation fraction comes from VALIDATION_SPLIT
// (default 0.1, i.e. 90% fit / 10% validation).
//
// The shuffle is seeded, so the same build configuration
// always holds out the same rows and two builds can be
// compared epoch by epoch.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Default seed for the fit/validation shuffle
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Shuffle `samples` with `seed` and split into (fit, validation).
///
/// `validation_fraction` is clamped to [0, 1].
pub fn split_train_val<T>(
    mut samples:         Vec<T>,
    validation_fraction: f64,
    seed:                u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let held_out = ((total as f64) * validation_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = total - held_out.min(total);

    // split_off(n) leaves [0..n] in place and returns [n..]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} fit, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.2, DEFAULT_SPLIT_SEED);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        // No items should be lost in the split
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.3, DEFAULT_SPLIT_SEED);
        assert_eq!(train.len() + val.len(), 50);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.2, DEFAULT_SPLIT_SEED);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_validation_fraction() {
        // 0.0 fraction means everything goes to training
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 0.0, DEFAULT_SPLIT_SEED);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_same_seed_same_split() {
        let items: Vec<usize> = (0..40).collect();
        let first  = split_train_val(items.clone(), 0.1, 7);
        let second = split_train_val(items, 0.1, 7);
        assert_eq!(first, second);
        assert_eq!(first.1.len(), 4);
    }
}
