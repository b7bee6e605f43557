// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//
//   build      — encode, train, evaluate and regress
//   evaluate   — re-score a held-out split against a build
//   regress    — re-run regression tracking against a build
//   summarize  — write the intents summary only
//
// Every flag also reads an environment variable, so a build
// can be driven from a .env-style deployment without flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    build_use_case::BuildConfig,
    datasets::DatasetPaths,
    evaluate_use_case::EvaluateConfig,
};
use crate::data::{
    encoder::{EncodingPolicy, DEFAULT_CEILING},
    registry::ConsistencyPolicy,
};
use crate::domain::utterance::SplitKind;
use crate::evaluation::decoder::DEFAULT_BATCH_SIZE;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode the datasets, train a classifier and evaluate it
    Build(BuildArgs),

    /// Evaluate a finished build on a held-out split
    Evaluate(EvaluateArgs),

    /// Re-run regression tracking against a finished build
    Regress(RegressArgs),

    /// Write intentsData.json for the datasets without training
    Summarize(SummarizeArgs),
}

// ─── Shared Flags ─────────────────────────────────────────────────────────────

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyArg {
    /// Fail if a held-out split has an intent training lacks
    Strict,
    /// Warn and leave such intents out of the averages
    Lenient,
}

impl From<ConsistencyArg> for ConsistencyPolicy {
    fn from(a: ConsistencyArg) -> Self {
        match a {
            ConsistencyArg::Strict  => ConsistencyPolicy::Strict,
            ConsistencyArg::Lenient => ConsistencyPolicy::Lenient,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldOutSplit {
    Testing,
    Evaluation,
}

impl From<HeldOutSplit> for SplitKind {
    fn from(s: HeldOutSplit) -> Self {
        match s {
            HeldOutSplit::Testing    => SplitKind::Testing,
            HeldOutSplit::Evaluation => SplitKind::Evaluation,
        }
    }
}

/// Where the CSV splits live and which columns to read
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    #[arg(long, env = "TRAINING_PATH", default_value = "data/train/train.csv")]
    pub training_path: String,

    #[arg(long, env = "TESTING_PATH", default_value = "data/test/test.csv")]
    pub testing_path: String,

    /// Optional; skipped with a warning when the file is missing
    #[arg(long, env = "EVALUATION_PATH", default_value = "data/evaluate/evaluate.csv")]
    pub evaluation_path: String,

    /// Optional; skipped with a warning when the file is missing
    #[arg(long, env = "REGRESSION_PATH", default_value = "data/regress/regress.csv")]
    pub regression_path: String,

    /// Column holding the utterance text
    #[arg(long, env = "DATA_COLUMN_TITLE", default_value = "text")]
    pub text_column: String,

    /// Column holding the intent label
    #[arg(long, env = "LABEL_COLUMN_TITLE", default_value = "intent")]
    pub intent_column: String,

    #[arg(long, value_enum, env = "INTENT_CONSISTENCY", default_value_t = ConsistencyArg::Strict)]
    pub consistency: ConsistencyArg,
}

impl From<DatasetArgs> for DatasetPaths {
    fn from(a: DatasetArgs) -> Self {
        DatasetPaths {
            training:      a.training_path,
            testing:       a.testing_path,
            evaluation:    a.evaluation_path,
            regression:    a.regression_path,
            text_column:   a.text_column,
            intent_column: a.intent_column,
        }
    }
}

/// Arguments shared by the commands that load a finished build
#[derive(Args, Debug, Clone)]
pub struct BuildOutputArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// Directory the build wrote its weights and metadata to
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    /// Rows per prediction call
    #[arg(long, env = "EVAL_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Skip rows the tokenizer rejects instead of aborting
    #[arg(long)]
    pub skip_unencodable: bool,
}

fn encoding_policy(skip_unencodable: bool) -> EncodingPolicy {
    if skip_unencodable { EncodingPolicy::SkipRow } else { EncodingPolicy::Abort }
}

impl From<BuildOutputArgs> for EvaluateConfig {
    fn from(a: BuildOutputArgs) -> Self {
        EvaluateConfig {
            consistency: a.datasets.consistency.into(),
            datasets:    a.datasets.into(),
            output_dir:  a.output_dir,
            encoding:    encoding_policy(a.skip_unencodable),
            batch_size:  a.batch_size,
        }
    }
}

// ─── build ────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// WordPiece vocabulary, one token per line
    #[arg(long, env = "BERT_VOCAB_PATH", default_value = "vocab.txt")]
    pub vocab_path: String,

    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    #[arg(long, env = "MODEL_NAME", default_value = "intent-classifier")]
    pub model_name: String,

    #[arg(long, env = "BUILD_VERSION", default_value = "0.1.0")]
    pub build_version: String,

    /// Upper bound on the encoded sequence length
    #[arg(long, env = "MAX_SEQUENCE_LENGTH", default_value_t = DEFAULT_CEILING)]
    pub max_sequence_length: usize,

    #[arg(long, env = "BATCH_SIZE", default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, env = "EPOCHS", default_value_t = 1)]
    pub epochs: usize,

    #[arg(long, env = "OPTIMIZER_LEARNING_RATE", default_value_t = 2e-4)]
    pub lr: f64,

    /// Share of the training split held back for validation
    #[arg(long, env = "VALIDATION_SPLIT", default_value_t = 0.1)]
    pub validation_split: f64,

    /// Seed for the validation split and batch shuffling
    #[arg(long, env = "SEED", default_value_t = 42)]
    pub seed: u64,

    /// Hidden dimension; must be divisible by num_heads
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout inside the encoder blocks
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Dropout in front of the classifier head
    #[arg(long, env = "CLF_OUT_DROPOUT_RATE", default_value_t = 0.5)]
    pub head_dropout: f64,

    /// Skip rows the tokenizer rejects instead of aborting
    #[arg(long)]
    pub skip_unencodable: bool,
}

impl From<BuildArgs> for BuildConfig {
    fn from(a: BuildArgs) -> Self {
        BuildConfig {
            consistency:      a.datasets.consistency.into(),
            datasets:         a.datasets.into(),
            vocab_path:       a.vocab_path,
            output_dir:       a.output_dir,
            model_name:       a.model_name,
            build_version:    a.build_version,
            ceiling:          a.max_sequence_length,
            batch_size:       a.batch_size,
            epochs:           a.epochs,
            lr:               a.lr,
            validation_split: a.validation_split,
            seed:             a.seed,
            d_model:          a.d_model,
            num_heads:        a.num_heads,
            num_layers:       a.num_layers,
            d_ff:             a.d_ff,
            dropout:          a.dropout,
            head_dropout:     a.head_dropout,
            encoding:         encoding_policy(a.skip_unencodable),
        }
    }
}

// ─── evaluate / regress / summarize ───────────────────────────────────────────

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Which held-out split to score
    #[arg(long, value_enum, default_value_t = HeldOutSplit::Testing)]
    pub split: HeldOutSplit,

    #[command(flatten)]
    pub build: BuildOutputArgs,
}

#[derive(Args, Debug)]
pub struct RegressArgs {
    #[command(flatten)]
    pub build: BuildOutputArgs,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_build_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "intent-tuner", "build",
            "--training-path", "t.csv",
            "--max-sequence-length", "64",
            "--consistency", "lenient",
            "--skip-unencodable",
        ])
        .unwrap();

        let Commands::Build(args) = cli.command else { panic!("expected build") };
        let cfg: BuildConfig = args.into();
        assert_eq!(cfg.datasets.training, "t.csv");
        assert_eq!(cfg.ceiling, 64);
        assert_eq!(cfg.consistency, ConsistencyPolicy::Lenient);
        assert_eq!(cfg.encoding, EncodingPolicy::SkipRow);
    }

    #[test]
    fn test_evaluate_defaults_to_testing_split() {
        let cli = Cli::try_parse_from(["intent-tuner", "evaluate"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(SplitKind::from(args.split), SplitKind::Testing);

        let cfg: EvaluateConfig = args.build.into();
        assert_eq!(cfg.encoding, EncodingPolicy::Abort);
        assert_eq!(cfg.consistency, ConsistencyPolicy::Strict);
    }

    #[test]
    fn test_rejects_training_as_held_out_split() {
        assert!(Cli::try_parse_from(["intent-tuner", "evaluate", "--split", "training"]).is_err());
    }
}
