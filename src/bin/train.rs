//! Companion trainer: fits the survival pipeline on a Titanic CSV and
//! persists the artifact the serving process loads.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lifeboat::dataset::load_titanic_csv;
use lifeboat::model_selection::train_test_split;
use lifeboat::pipeline::SurvivalPipeline;
use lifeboat::preprocessing::UnseenAgePolicy;
use lifeboat::serialization::save_pipeline;

/// Train the Titanic survival pipeline and save the model artifact.
#[derive(Debug, Parser)]
#[command(name = "train", version)]
struct Args {
    /// Path to the Titanic CSV (seaborn format, with a `survived` column)
    #[arg(long)]
    data: PathBuf,

    /// Output path for the pipeline artifact
    #[arg(long, default_value = "titanic_pipeline.lfb")]
    out: PathBuf,

    /// Fraction of rows held out for the test score
    #[arg(long, default_value_t = 0.2)]
    test_size: f32,

    /// Random seed for the train/test shuffle
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Boosting rounds
    #[arg(long, default_value_t = 221)]
    n_estimators: usize,

    /// Boosting learning rate
    #[arg(long, default_value_t = 0.1022)]
    learning_rate: f32,

    /// Weak learner depth
    #[arg(long, default_value_t = 5)]
    max_depth: usize,

    /// Impute unseen (sex, pclass, alone) groups with the global mean
    /// instead of failing
    #[arg(long)]
    global_mean_fallback: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> lifeboat::Result<()> {
    println!("Loading dataset from {}", args.data.display());
    let (frame, labels) = load_titanic_csv(&args.data)?;
    println!("{} rows, {} columns", frame.n_rows(), frame.n_cols());

    let (x_train, x_test, y_train, y_test) =
        train_test_split(&frame, &labels, args.test_size, Some(args.seed))?;
    println!(
        "Split: {} train / {} test",
        x_train.n_rows(),
        x_test.n_rows()
    );

    let policy = if args.global_mean_fallback {
        UnseenAgePolicy::GlobalMean
    } else {
        UnseenAgePolicy::Error
    };

    println!(
        "Fitting: {} estimators, learning rate {}, max depth {}",
        args.n_estimators, args.learning_rate, args.max_depth
    );
    let fitted = SurvivalPipeline::new()
        .with_n_estimators(args.n_estimators)
        .with_learning_rate(args.learning_rate)
        .with_max_depth(args.max_depth)
        .with_unseen_age_policy(policy)
        .fit(&x_train, &y_train)?;

    let train_acc = fitted.score(&x_train, &y_train)?;
    let test_acc = fitted.score(&x_test, &y_test)?;
    println!("Train accuracy: {train_acc:.4}");
    println!("Test accuracy:  {test_acc:.4}");

    save_pipeline(&args.out, &fitted)?;
    println!("Model saved to {}", args.out.display());
    Ok(())
}
