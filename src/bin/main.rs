//! ranalytics Command Line Interface
//!
//! Train, apply and evaluate batch models on JSON Lines record files.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use ranalytics::core::{AnalyticsError, Result};
use ranalytics::eval::{cross_validate, evaluate};
use ranalytics::persistence::{open_file, ModelHeader};
use ranalytics::{BatchModel, RecordSet, Trainer, TrainingConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "ranalytics")]
#[command(about = "Batch, active and online learning on JSON records")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ranalytics contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a batch model
    Train(TrainArgs),
    /// Score records with a trained model
    Predict(PredictArgs),
    /// Score a model's labels against the records' own
    Evaluate(EvaluateArgs),
    /// k-fold cross-validation
    Cv(CvArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training records (JSON Lines)
    #[arg(long)]
    records: PathBuf,

    /// Training configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Regularization parameter C, overrides the config file
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Minimum examples per category, overrides the config file
    #[arg(long)]
    min_support: Option<usize>,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input records (JSON Lines)
    #[arg(long)]
    records: PathBuf,

    /// Output file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print only the categories with a positive score
    #[arg(long, conflicts_with = "top")]
    labels: bool,

    /// Print only the lowest-scoring category
    #[arg(long)]
    top: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Labeled test records (JSON Lines)
    #[arg(long)]
    records: PathBuf,

    /// Print CSV instead of a table
    #[arg(long)]
    csv: bool,
}

#[derive(Args)]
struct CvArgs {
    /// Labeled records (JSON Lines)
    #[arg(long)]
    records: PathBuf,

    /// Training configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Number of folds
    #[arg(long, default_value = "5")]
    folds: usize,

    /// Shuffle seed
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Print CSV instead of a table
    #[arg(long)]
    csv: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Cv(args) => cv_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<TrainingConfig> {
    info!("Loading configuration from: {path:?}");
    TrainingConfig::from_file(path)
}

fn load_records(path: &Path) -> Result<RecordSet> {
    info!("Loading records from: {path:?}");
    let records = RecordSet::from_file(path)?;
    info!("Loaded {} records", records.len());
    Ok(records)
}

fn train_command(args: TrainArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(c) = args.c {
        config.solver.c = c;
    }
    if let Some(min_support) = args.min_support {
        config.min_support = min_support;
    }
    info!(
        "Parameters: C={}, j={}, min_support={}",
        config.solver.c, config.solver.j, config.min_support
    );

    let records = load_records(&args.records)?;
    let model = Trainer::with_config(config.to_batch_config()).train(
        &records,
        &config.features,
        &config.target,
    )?;
    if model.is_empty() {
        return Err(AnalyticsError::InvalidDataset(format!(
            "no category of '{}' reached {} examples",
            config.target.name, config.min_support
        )));
    }

    info!("Training completed: {} categories", model.models().len());
    model.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);
    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = BatchModel::load_from_file(&args.model)?;
    let records = load_records(&args.records)?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(AnalyticsError::IoError)?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    for record in records.iter() {
        let line = if args.top {
            model.predict_top(record).unwrap_or_default()
        } else if args.labels {
            model.predict_labels(record).join(",")
        } else {
            model
                .predict(record)
                .iter()
                .map(|(name, score)| format!("{name}:{score:.6}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(writer, "{}\t{}", record.id, line).map_err(AnalyticsError::IoError)?;
    }
    writer.flush().map_err(AnalyticsError::IoError)?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = BatchModel::load_from_file(&args.model)?;
    let records = load_records(&args.records)?;

    let score = evaluate(&model, &records)?;
    if args.csv {
        print!("{}", score.to_csv());
    } else {
        println!("=== Model Evaluation ===");
        print!("{}", score.report());
    }
    Ok(())
}

fn cv_command(args: CvArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let records = load_records(&args.records)?;

    info!("Cross-validation with {} folds, seed {}", args.folds, args.seed);
    let result = cross_validate(
        &records,
        &config.features,
        &config.target,
        args.folds,
        &config.to_batch_config(),
        args.seed,
    )?;

    if args.csv {
        print!("{}", result.total.to_csv());
    } else {
        println!("=== Cross-Validation Results ===");
        println!("Folds: {}", args.folds);
        print!("{}", result.total.report());
    }
    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let mut reader = open_file(&args.model)?;
    let header = ModelHeader::read(&mut reader)?;
    header.print_summary();
    Ok(())
}
