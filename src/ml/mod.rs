// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model, training loop, and
// inference wrapper. Only this layer and the Burn-facing data
// modules (dataset, batcher) import burn.
//
// What's in this layer:
//
//   model.rs      — The transformer encoder classifier
//                   • Token + positional embeddings
//                   • Multi-head self-attention with padding mask
//                   • Feed-forward networks (GELU activation)
//                   • Layer normalisation, residual connections
//                   • [CLS] pooler (dense + tanh), dropout,
//                     linear projection to one logit per intent
//
//   trainer.rs    — The training loop
//                   Forward pass, cross-entropy, backward pass,
//                   Adam step, validation, and a checkpoint
//                   per epoch
//
//   inferencer.rs — BurnIntentClassifier
//                   Implements the IntentClassifier trait over
//                   softmax probabilities
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

/// Transformer encoder intent classifier
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Probability-vector inference over encoded rows
pub mod inferencer;
