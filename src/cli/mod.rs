// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands a config to Layer 2 and
// prints what comes back. No business logic lives here.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BuildArgs, Commands, EvaluateArgs, RegressArgs, SummarizeArgs};

use crate::evaluation::report::RegressionReport;

#[derive(Parser, Debug)]
#[command(
    name = "intent-tuner",
    version,
    about = "Encode intent datasets, train a transformer classifier, and evaluate it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Build(args)     => run_build(args),
            Commands::Evaluate(args)  => run_evaluate(args),
            Commands::Regress(args)   => run_regress(args),
            Commands::Summarize(args) => run_summarize(args),
        }
    }
}

fn run_build(args: BuildArgs) -> Result<()> {
    use crate::application::build_use_case::BuildUseCase;

    tracing::info!("Starting build from '{}'", args.datasets.training_path);
    let outcome = BuildUseCase::new(args.into()).execute()?;

    println!(
        "\nBuild {} of '{}' complete (max_sequence_length={}, {} intents).",
        outcome.metadata.build_version,
        outcome.metadata.model_name,
        outcome.metadata.max_sequence_length,
        outcome.metadata.intents.len(),
    );
    if let Some(best) = outcome.history.best_epoch() {
        println!("Best epoch: {} (val_loss={:.4})", best.epoch, best.val_loss);
    }
    for report in &outcome.reports {
        println!("\n{report}");
    }
    if let Some(regression) = &outcome.regression {
        print_regression(regression);
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.build.into())?;
    let report   = use_case.evaluate(args.split.into())?;
    println!("\n{report}");
    Ok(())
}

fn run_regress(args: RegressArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.build.into())?;
    print_regression(&use_case.regress()?);
    Ok(())
}

fn run_summarize(args: SummarizeArgs) -> Result<()> {
    use crate::application::datasets::{summarize_datasets, DatasetPaths};

    let policy = args.datasets.consistency.into();
    let paths: DatasetPaths = args.datasets.into();
    let (prepared, path) = summarize_datasets(&paths, policy, &args.output_dir)?;

    println!("{} intents: {}", prepared.registry.len(), prepared.registry.intents().join(", "));
    for (split, intents) in &prepared.summary.splits {
        let rows: usize = intents.count.values().sum();
        println!("  {split:<16} {rows:>6} rows, {:>4} intents", intents.intent.len());
    }
    println!("Written to '{}'", path.display());
    Ok(())
}

fn print_regression(report: &RegressionReport) {
    println!(
        "\nRegression match rate: {:.4} ({} rows, {} skipped)",
        report.match_rate,
        report.results.len(),
        report.skipped_rows,
    );
    for miss in report.mismatches() {
        println!("  expected {:<20} got {:<20} {}", miss.expected_label, miss.actual_label, miss.text);
    }
}
