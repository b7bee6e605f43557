// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full fit + validation loop using Burn's DataLoader and Adam.
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns model on MyInnerBackend (Wgpu)
//   - Validation batcher must also use MyInnerBackend
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Each epoch:
//   fit batches      → loss, acc (dropout on)
//   validation       → val_loss, val_acc (dropout off)
//   metrics.csv row  → MetricsLogger
//   checkpoint       → model_epoch_N.mpk.gz
//
// Returns the final model on the inner backend, ready for
// prediction, plus the full TrainingHistory.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::build_use_case::BuildConfig;
use crate::data::{batcher::IntentBatcher, dataset::IntentDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger, TrainingHistory};
use crate::ml::model::{TransformerIntentConfig, TransformerIntentModel};

pub type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type MyInnerBackend = burn::backend::Wgpu;

pub struct TrainedModel {
    pub model:   TransformerIntentModel<MyInnerBackend>,
    pub history: TrainingHistory,
}

pub fn run_training(
    cfg:           &BuildConfig,
    model_cfg:     &TransformerIntentConfig,
    train_dataset: IntentDataset,
    val_dataset:   IntentDataset,
    ckpt_manager:  &CheckpointManager,
    logger:        &MetricsLogger,
) -> Result<TrainedModel> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop(cfg, model_cfg, train_dataset, val_dataset, ckpt_manager, logger, device)
}

/// Number of rows in `labels` whose argmax matches.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

fn mean(sum: f64, n: usize) -> f64 {
    if n > 0 { sum / n as f64 } else { f64::NAN }
}

fn train_loop(
    cfg:           &BuildConfig,
    model_cfg:     &TransformerIntentConfig,
    train_dataset: IntentDataset,
    val_dataset:   IntentDataset,
    ckpt_manager:  &CheckpointManager,
    logger:        &MetricsLogger,
    device:        burn::backend::wgpu::WgpuDevice,
) -> Result<TrainedModel> {

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: TransformerIntentModel<MyBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} intents, seq_len={}",
        model_cfg.num_layers, model_cfg.d_model, model_cfg.num_classes, model_cfg.max_seq_len
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Fit data loader (AutodiffBackend) ─────────────────────────────────────
    let train_batcher = IntentBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_batcher = IntentBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut history = TrainingHistory::default();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Fit phase ─────────────────────────────────────────────────────────
        let mut loss_sum    = 0.0f64;
        let mut batches     = 0usize;
        let mut correct     = 0usize;
        let mut seen        = 0usize;

        for batch in train_loader.iter() {
            seen += batch.labels.dims()[0];
            let (loss, logits) = model.forward_loss(batch.input_ids, batch.labels.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;
            correct  += count_correct(logits, batch.labels);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → TransformerIntentModel<MyInnerBackend>, dropout off
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_seen     = 0usize;

        for batch in val_loader.iter() {
            val_seen += batch.labels.dims()[0];
            let (loss, logits) = model_valid.forward_loss(batch.input_ids, batch.labels.clone());

            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
            val_correct  += count_correct(logits, batch.labels);
        }

        let metrics = EpochMetrics::new(
            epoch,
            mean(loss_sum, batches),
            mean(val_loss_sum, val_batches),
            if seen > 0 { correct as f64 / seen as f64 } else { 0.0 },
            if val_seen > 0 { val_correct as f64 / val_seen as f64 } else { 0.0 },
        );

        println!(
            "Epoch {:>3}/{} | loss={:.4} | val_loss={:.4} | acc={:.1}% | val_acc={:.1}%",
            epoch, cfg.epochs, metrics.loss, metrics.val_loss,
            metrics.acc * 100.0, metrics.val_acc * 100.0,
        );

        logger.log(&metrics)?;
        history.push(metrics);

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(TrainedModel { model: model.valid(), history })
}
